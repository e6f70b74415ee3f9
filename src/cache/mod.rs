mod memory;
mod redis_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Cache key scoped by symbol and payload kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Price(String),
    History(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Price(symbol) => write!(f, "price:{symbol}"),
            CacheKey::History(symbol) => write!(f, "history:{symbol}"),
        }
    }
}

/// TTL-capable key/value store in front of the provider. Entries are a
/// disposable view: losing one costs latency, never correctness.
#[async_trait]
pub trait PriceCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    async fn set_with_ttl(&self, key: &CacheKey, value: &str, ttl: Duration) -> Result<(), CacheError>;
}
