use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Provider-neutral payloads
// ---------------------------------------------------------------------------

/// Single quote as returned by the provider. The price is kept as text until
/// the caller decides how to parse it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuote {
    pub price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DailyBar {
    #[serde(rename = "1. open", default)]
    pub open: Option<String>,
    #[serde(rename = "2. high", default)]
    pub high: Option<String>,
    #[serde(rename = "3. low", default)]
    pub low: Option<String>,
    /// Left optional so one bad bar is reported against its own date.
    #[serde(rename = "4. close", default)]
    pub close: Option<String>,
    #[serde(rename = "5. volume", default)]
    pub volume: Option<String>,
}

/// Date string → bar. Ordering is imposed by the ingestor.
pub type DailySeries = HashMap<String, DailyBar>;

// ---------------------------------------------------------------------------
// Alpha Vantage wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    pub global_quote: Option<GlobalQuote>,
    #[serde(rename = "Error Message", default)]
    pub error_message: Option<String>,
    #[serde(rename = "Note", default)]
    pub note: Option<String>,
    #[serde(rename = "Information", default)]
    pub information: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GlobalQuote {
    #[serde(rename = "05. price", default)]
    pub price: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)", default)]
    pub time_series: Option<DailySeries>,
    #[serde(rename = "Error Message", default)]
    pub error_message: Option<String>,
    #[serde(rename = "Note", default)]
    pub note: Option<String>,
    #[serde(rename = "Information", default)]
    pub information: Option<String>,
}

/// First non-empty rejection message the provider put in place of data.
pub(crate) fn rejection(
    error_message: &Option<String>,
    note: &Option<String>,
    information: &Option<String>,
) -> Option<String> {
    [error_message, note, information]
        .into_iter()
        .flatten()
        .find(|m| !m.trim().is_empty())
        .cloned()
}
