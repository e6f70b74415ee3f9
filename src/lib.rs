pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod deadline;
pub mod errors;
pub mod ledger;
pub mod market;
pub mod metrics;
pub mod models;
pub mod provider;

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

use crate::cache::PriceCache;
use crate::config::AppConfig;
use crate::db::price_repo::{PgPriceStore, PriceStore};
use crate::deadline::Deadline;
use crate::errors::TrackerError;
use crate::ledger::{PositionLedger, ValuationQuery};
use crate::market::{HistoryIngestor, QuoteCache};
use crate::provider::QuoteProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: AppConfig,
    pub quotes: Arc<QuoteCache>,
    pub history: Arc<HistoryIngestor>,
    pub ledger: PositionLedger,
    pub valuations: ValuationQuery,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Wire the four services over one pool, one cache and one provider.
    pub fn build(
        db: PgPool,
        config: AppConfig,
        cache: Arc<dyn PriceCache>,
        provider: Arc<dyn QuoteProvider>,
        metrics_handle: PrometheusHandle,
    ) -> Result<Self, TrackerError> {
        let store: Arc<dyn PriceStore> = Arc::new(PgPriceStore::new(db.clone()));

        let quotes = QuoteCache::new(
            cache.clone(),
            provider.clone(),
            store.clone(),
            config.quote_ttl(),
        );
        let history = HistoryIngestor::new(
            cache,
            provider,
            store,
            config.history_ttl(),
            config.history_batch_size,
        )?;
        let ledger = PositionLedger::new(db.clone()).record_increases(config.ledger_record_increases);
        let valuations = ValuationQuery::new(db.clone());

        Ok(Self {
            db,
            config,
            quotes: Arc::new(quotes),
            history: Arc::new(history),
            ledger,
            valuations,
            metrics_handle,
        })
    }

    /// Per-request budget shared by every downstream call.
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.config.request_timeout())
    }
}
