use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use metrics::counter;
use serde::Serialize;

use super::quote_cache::parse_price;
use super::DataSource;
use crate::cache::{CacheKey, PriceCache};
use crate::db::bulk::{insert_in_batches, BatchFailure};
use crate::db::price_repo::PriceStore;
use crate::deadline::Deadline;
use crate::errors::TrackerError;
use crate::models::{NewPriceSample, Symbol};
use crate::provider::{DailySeries, ProviderError, QuoteProvider};

pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct History {
    pub symbol: String,
    pub source: DataSource,
    /// Oldest first.
    pub points: Vec<NewPriceSample>,
}

/// Fetches a daily series, persists it in batches and caches the result.
///
/// Re-ingesting a symbol appends a fresh set of rows; nothing deduplicates
/// by date. The long-lived cache entry is what keeps repeat calls cheap.
pub struct HistoryIngestor {
    cache: Arc<dyn PriceCache>,
    provider: Arc<dyn QuoteProvider>,
    store: Arc<dyn PriceStore>,
    ttl: Duration,
    batch_size: usize,
}

impl HistoryIngestor {
    pub fn new(
        cache: Arc<dyn PriceCache>,
        provider: Arc<dyn QuoteProvider>,
        store: Arc<dyn PriceStore>,
        ttl: Duration,
        batch_size: usize,
    ) -> Result<Self, TrackerError> {
        if batch_size == 0 {
            return Err(TrackerError::Validation(
                "history batch size must be greater than zero".into(),
            ));
        }
        Ok(Self {
            cache,
            provider,
            store,
            ttl,
            batch_size,
        })
    }

    pub async fn get_history(&self, symbol: &Symbol, deadline: Deadline) -> Result<History, TrackerError> {
        let key = CacheKey::History(symbol.to_string());

        if let Some(points) = self.cached_series(&key, deadline).await {
            tracing::debug!(symbol = %symbol, points = points.len(), "History served from cache");
            return Ok(History {
                symbol: symbol.to_string(),
                source: DataSource::Cache,
                points,
            });
        }

        counter!("provider_calls_total").increment(1);
        let series = match deadline.run(self.provider.fetch_daily_series(symbol.as_str())).await {
            Ok(Ok(series)) => series,
            Ok(Err(ProviderError::Decode(reason))) => {
                return Err(TrackerError::HistoryUndecodable {
                    symbol: symbol.to_string(),
                    reason,
                })
            }
            Ok(Err(e)) => return Err(unavailable(symbol, e)),
            Err(e) => return Err(unavailable(symbol, e)),
        };

        if series.is_empty() {
            return Err(TrackerError::HistoryEmpty(symbol.to_string()));
        }

        let points = normalize_series(symbol, &series)?;
        self.persist(symbol, &points, deadline).await?;

        counter!("history_ingests_total").increment(1);
        counter!("history_rows_ingested_total").increment(points.len() as u64);
        tracing::info!(symbol = %symbol, rows = points.len(), "History ingested");

        self.cache_series(&key, &points, deadline).await;

        Ok(History {
            symbol: symbol.to_string(),
            source: DataSource::Provider,
            points,
        })
    }

    /// A cached series that fails to deserialize is a miss, not an error.
    async fn cached_series(&self, key: &CacheKey, deadline: Deadline) -> Option<Vec<NewPriceSample>> {
        let raw = match deadline.run(self.cache.get(key)).await {
            Ok(Ok(raw)) => raw?,
            Ok(Err(e)) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed; treating as miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read timed out; treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<Vec<NewPriceSample>>(&raw) {
            Ok(points) => Some(points),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cached history unreadable; refetching");
                None
            }
        }
    }

    async fn persist(
        &self,
        symbol: &Symbol,
        points: &[NewPriceSample],
        deadline: Deadline,
    ) -> Result<(), TrackerError> {
        let report = insert_in_batches(&*self.store, points, self.batch_size, deadline)
            .await
            .map_err(|e| TrackerError::Validation(e.to_string()))?;

        let committed = report.committed_rows();
        let Some(failed) = report.failed else {
            return Ok(());
        };

        Err(match failed.cause {
            BatchFailure::DeadlineExceeded => TrackerError::HistoryUnavailable {
                symbol: symbol.to_string(),
                reason: format!("deadline exceeded during batch {} ({committed} rows committed)", failed.index),
            },
            BatchFailure::Store(source) => TrackerError::BatchInsertFailed {
                symbol: symbol.to_string(),
                batch: failed.index,
                committed,
                source,
            },
        })
    }

    async fn cache_series(&self, key: &CacheKey, points: &[NewPriceSample], deadline: Deadline) {
        let payload = match serde_json::to_string(points) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to serialize history for cache");
                return;
            }
        };

        let reason = match deadline.run(self.cache.set_with_ttl(key, &payload, self.ttl)).await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        };
        counter!("cache_write_failures_total").increment(1);
        let err = TrackerError::CacheWriteFailed {
            key: key.to_string(),
            reason,
        };
        tracing::warn!(error = %err, "Best-effort cache write failed");
    }
}

fn unavailable(symbol: &Symbol, reason: impl ToString) -> TrackerError {
    TrackerError::HistoryUnavailable {
        symbol: symbol.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse every bar into a sample, oldest first. One bad entry rejects the
/// whole series.
pub(crate) fn normalize_series(
    symbol: &Symbol,
    series: &DailySeries,
) -> Result<Vec<NewPriceSample>, TrackerError> {
    let malformed = |date: &str, reason: String| TrackerError::HistoryMalformed {
        symbol: symbol.to_string(),
        date: date.to_string(),
        reason,
    };

    let mut points = Vec::with_capacity(series.len());
    for (date, bar) in series {
        let close = bar
            .close
            .as_deref()
            .ok_or_else(|| malformed(date, "missing close".into()))?;
        let price = parse_price(close)
            .ok_or_else(|| malformed(date, format!("close {close:?} is not a positive price")))?;
        let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| malformed(date, format!("date: {e}")))?;
        let observed_at = day
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .ok_or_else(|| malformed(date, "date out of range".into()))?;

        points.push(NewPriceSample {
            symbol: symbol.to_string(),
            price,
            observed_at,
        });
    }

    points.sort_by_key(|p| p.observed_at);
    Ok(points)
}
