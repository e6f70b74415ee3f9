use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use serde::Serialize;

use super::DataSource;
use crate::cache::{CacheKey, PriceCache};
use crate::db::price_repo::PriceStore;
use crate::deadline::Deadline;
use crate::errors::TrackerError;
use crate::models::{NewPriceSample, Symbol};
use crate::provider::QuoteProvider;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
    pub source: DataSource,
}

/// Read-through cache for single quotes.
///
/// A hit is served as-is; the cache's TTL is the only freshness check. A miss
/// goes to the provider, and a parsed price is written to the cache and
/// appended as a price sample. Both writes are best-effort and independent.
pub struct QuoteCache {
    cache: Arc<dyn PriceCache>,
    provider: Arc<dyn QuoteProvider>,
    store: Arc<dyn PriceStore>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new(
        cache: Arc<dyn PriceCache>,
        provider: Arc<dyn QuoteProvider>,
        store: Arc<dyn PriceStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            cache,
            provider,
            store,
            ttl,
        }
    }

    pub async fn get_quote(&self, symbol: &Symbol, deadline: Deadline) -> Result<Quote, TrackerError> {
        let key = CacheKey::Price(symbol.to_string());

        if let Some(price) = self.cached_price(&key, deadline).await {
            counter!("quote_cache_hits_total").increment(1);
            tracing::debug!(symbol = %symbol, price = %price, "Quote served from cache");
            return Ok(Quote {
                symbol: symbol.to_string(),
                price,
                source: DataSource::Cache,
            });
        }
        counter!("quote_cache_misses_total").increment(1);

        let price = self.fetch_price(symbol, deadline).await?;

        let sample = NewPriceSample {
            symbol: symbol.to_string(),
            price,
            observed_at: Utc::now(),
        };
        let price_text = price.to_string();
        let (cache_result, store_result) = tokio::join!(
            deadline.run(self.cache.set_with_ttl(&key, &price_text, self.ttl)),
            deadline.run(self.store.append_sample(&sample)),
        );

        match cache_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => report_cache_failure(&key, e),
            Err(e) => report_cache_failure(&key, e),
        }
        match store_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(symbol = %symbol, error = %e, "Failed to persist price sample")
            }
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "Price sample write timed out")
            }
        }

        tracing::info!(symbol = %symbol, price = %price, "Quote refreshed from provider");
        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            source: DataSource::Provider,
        })
    }

    /// Cache lookup. Errors, timeouts and unparseable values all count as a miss.
    async fn cached_price(&self, key: &CacheKey, deadline: Deadline) -> Option<Decimal> {
        let value = match deadline.run(self.cache.get(key)).await {
            Ok(Ok(value)) => value?,
            Ok(Err(e)) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed; treating as miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read timed out; treating as miss");
                return None;
            }
        };

        match Decimal::from_str(&value) {
            Ok(price) => Some(price),
            Err(e) => {
                tracing::warn!(key = %key, value = %value, error = %e, "Discarding unparseable cached price");
                None
            }
        }
    }

    async fn fetch_price(&self, symbol: &Symbol, deadline: Deadline) -> Result<Decimal, TrackerError> {
        counter!("provider_calls_total").increment(1);
        let unavailable = |reason: String| TrackerError::QuoteUnavailable {
            symbol: symbol.to_string(),
            reason,
        };

        let raw = match deadline.run(self.provider.fetch_quote(symbol.as_str())).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(unavailable(e.to_string())),
            Err(e) => return Err(unavailable(e.to_string())),
        };

        let text = raw
            .price
            .ok_or_else(|| unavailable("provider returned no price".into()))?;

        parse_price(&text).ok_or_else(|| TrackerError::QuoteMalformed {
            symbol: symbol.to_string(),
            value: text,
        })
    }
}

/// Strictly positive decimal, or nothing.
pub(crate) fn parse_price(text: &str) -> Option<Decimal> {
    Decimal::from_str(text.trim())
        .ok()
        .filter(|p| p.is_sign_positive() && !p.is_zero())
}

fn report_cache_failure(key: &CacheKey, reason: impl ToString) {
    counter!("cache_write_failures_total").increment(1);
    let err = TrackerError::CacheWriteFailed {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    tracing::warn!(error = %err, "Best-effort cache write failed");
}
