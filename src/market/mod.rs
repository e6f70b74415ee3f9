pub mod history;
pub mod quote_cache;

pub use history::{History, HistoryIngestor};
pub use quote_cache::{Quote, QuoteCache};

use serde::Serialize;

/// Where a market data answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Cache,
    Provider,
}
