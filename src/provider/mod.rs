pub mod alpha_vantage;
pub mod types;

pub use alpha_vantage::AlphaVantageClient;
pub use types::{DailyBar, DailySeries, RawQuote};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected request: {0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

/// External market data source. Availability and rate limits are its own
/// concern; callers see only success or a `ProviderError`.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Latest quote for a single symbol.
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, ProviderError>;

    /// Full daily series for a symbol, keyed by `YYYY-MM-DD`.
    async fn fetch_daily_series(&self, symbol: &str) -> Result<DailySeries, ProviderError>;
}
