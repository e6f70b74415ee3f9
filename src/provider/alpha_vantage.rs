use async_trait::async_trait;
use reqwest::{Client, Url};

use super::types::{rejection, DailySeries, GlobalQuoteResponse, RawQuote, TimeSeriesResponse};
use super::{ProviderError, QuoteProvider};

#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn query_url(&self, function: &str, symbol: &str) -> Result<Url, ProviderError> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("function", function),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| ProviderError::InvalidUrl(format!("{}: {e}", self.base_url)))
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, ProviderError> {
        let url = self.query_url("GLOBAL_QUOTE", symbol)?;
        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_global_quote(&body)
    }

    async fn fetch_daily_series(&self, symbol: &str) -> Result<DailySeries, ProviderError> {
        let url = self.query_url("TIME_SERIES_DAILY", symbol)?;
        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_daily_series(&body)
    }
}

pub(crate) fn parse_global_quote(body: &str) -> Result<RawQuote, ProviderError> {
    let resp: GlobalQuoteResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    if let Some(msg) = rejection(&resp.error_message, &resp.note, &resp.information) {
        return Err(ProviderError::Rejected(msg));
    }

    let price = resp
        .global_quote
        .and_then(|q| q.price)
        .filter(|p| !p.trim().is_empty());
    Ok(RawQuote { price })
}

/// A payload without a series key is treated as an empty series.
pub(crate) fn parse_daily_series(body: &str) -> Result<DailySeries, ProviderError> {
    let resp: TimeSeriesResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    if let Some(msg) = rejection(&resp.error_message, &resp.note, &resp.information) {
        return Err(ProviderError::Rejected(msg));
    }

    Ok(resp.time_series.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_quote_price() {
        let body = r#"{"Global Quote": {"01. symbol": "MSFT", "05. price": "410.3400"}}"#;
        let quote = parse_global_quote(body).unwrap();
        assert_eq!(quote.price.as_deref(), Some("410.3400"));
    }

    #[test]
    fn test_parse_global_quote_missing_price() {
        let quote = parse_global_quote(r#"{"Global Quote": {}}"#).unwrap();
        assert_eq!(quote.price, None);

        let quote = parse_global_quote(r#"{"Global Quote": {"05. price": "  "}}"#).unwrap();
        assert_eq!(quote.price, None);
    }

    #[test]
    fn test_rate_limit_note_is_rejected() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        assert!(matches!(
            parse_global_quote(body),
            Err(ProviderError::Rejected(_))
        ));
        assert!(matches!(
            parse_daily_series(body),
            Err(ProviderError::Rejected(_))
        ));
    }

    #[test]
    fn test_parse_daily_series() {
        let body = r#"{
            "Meta Data": {"2. Symbol": "IBM"},
            "Time Series (Daily)": {
                "2024-01-03": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.5", "5. volume": "100"},
                "2024-01-02": {"4. close": "1.25"}
            }
        }"#;
        let series = parse_daily_series(body).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series["2024-01-02"].close.as_deref(), Some("1.25"));
        assert_eq!(series["2024-01-03"].volume.as_deref(), Some("100"));
    }

    #[test]
    fn test_bar_without_close_still_decodes() {
        let body = r#"{
            "Time Series (Daily)": {
                "2024-01-02": {"4. close": "10"},
                "2024-01-03": {"1. open": "11"}
            }
        }"#;
        let series = parse_daily_series(body).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series["2024-01-03"].close, None);
    }

    #[test]
    fn test_bad_base_url_is_not_a_decode_error() {
        let client = AlphaVantageClient::new(Client::new(), "not a url", "KEY");
        assert!(matches!(
            client.query_url("GLOBAL_QUOTE", "IBM"),
            Err(ProviderError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_missing_series_is_empty() {
        let series = parse_daily_series(r#"{"Meta Data": {}}"#).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_garbage_body_is_decode_error() {
        assert!(matches!(
            parse_global_quote("<html>"),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn test_query_url_carries_params() {
        let client = AlphaVantageClient::new(Client::new(), "https://example.test/query", "KEY");
        let url = client.query_url("GLOBAL_QUOTE", "BRK.B").unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("function".into(), "GLOBAL_QUOTE".into())));
        assert!(pairs.contains(&("symbol".into(), "BRK.B".into())));
        assert!(pairs.contains(&("apikey".into(), "KEY".into())));
    }
}
