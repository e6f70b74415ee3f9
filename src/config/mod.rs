use std::env;
use std::time::Duration;

use crate::market::history::DEFAULT_BATCH_SIZE;

const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub redis_url: Option<String>,
    pub api_token: Option<String>,

    // Quote provider
    pub alpha_vantage_api_key: String,
    pub alpha_vantage_base_url: String,

    // Caching and ingestion
    pub quote_cache_ttl_secs: u64,
    pub history_cache_ttl_secs: u64,
    pub history_batch_size: usize,

    // Request handling
    pub request_timeout_ms: u64,
    pub ledger_record_increases: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            api_token: env::var("API_TOKEN").ok().filter(|s| !s.is_empty()),

            alpha_vantage_api_key: env::var("ALPHA_VANTAGE_API_KEY")
                .unwrap_or_else(|_| "demo".into()),
            alpha_vantage_base_url: env::var("ALPHA_VANTAGE_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ALPHA_VANTAGE_URL.into()),

            quote_cache_ttl_secs: parse_or("QUOTE_CACHE_TTL_SECS", 300),
            history_cache_ttl_secs: parse_or("HISTORY_CACHE_TTL_SECS", 86_400),
            history_batch_size: parse_or("HISTORY_BATCH_SIZE", DEFAULT_BATCH_SIZE),

            request_timeout_ms: parse_or("REQUEST_TIMEOUT_MS", 10_000),
            ledger_record_increases: parse_or("LEDGER_RECORD_INCREASES", true),
        })
    }

    /// Minimal configuration for tests and local tooling.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".into(),
            port: 0,
            redis_url: None,
            api_token: None,
            alpha_vantage_api_key: "demo".into(),
            alpha_vantage_base_url: DEFAULT_ALPHA_VANTAGE_URL.into(),
            quote_cache_ttl_secs: 300,
            history_cache_ttl_secs: 86_400,
            history_batch_size: DEFAULT_BATCH_SIZE,
            request_timeout_ms: 10_000,
            ledger_record_increases: true,
        }
    }

    pub fn quote_ttl(&self) -> Duration {
        Duration::from_secs(self.quote_cache_ttl_secs)
    }

    pub fn history_ttl(&self) -> Duration {
        Duration::from_secs(self.history_cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable config value");
            default
        }),
        Err(_) => default,
    }
}
