//! Latest-price lookups.
//!
//! [`QuoteSource`] is the seam the monitor polls through.
//! [`YahooQuoteSource`] reads the Yahoo Finance chart API: the last
//! non-empty 1-minute close of the current day, falling back to the
//! `regularMarketPrice` in the chart metadata.

use std::time::Duration;

use alert_core::Ticker;
use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Browser-like agent; the chart API throttles default library agents.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; price-alert-monitor/0.1)";

/// Decimal places kept from the float prices the API returns.
const PRICE_DP: u32 = 4;

#[derive(Debug, Error)]
pub enum QuoteError {
    /// The source answered but had no price for the ticker.
    #[error("no price data for {0}")]
    NoData(Ticker),

    #[error("quote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("quote source answered with status {0}")]
    Status(u16),

    #[error("unreadable quote payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Trait for latest-price sources.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Latest traded price for `ticker`.
    async fn latest_price(&self, ticker: &Ticker) -> Result<Decimal, QuoteError>;
}

pub struct YahooQuoteSource {
    base_url: String,
    client: reqwest::Client,
}

impl YahooQuoteSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QuoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(YahooQuoteSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl QuoteSource for YahooQuoteSource {
    async fn latest_price(&self, ticker: &Ticker) -> Result<Decimal, QuoteError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let response = self
            .client
            .get(url)
            .query(&[("range", "1d"), ("interval", "1m")])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(QuoteError::NoData(ticker.clone()));
        }
        if !status.is_success() {
            return Err(QuoteError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let chart: ChartResponse = serde_json::from_slice(&body)?;
        chart
            .latest_price()
            .ok_or_else(|| QuoteError::NoData(ticker.clone()))
    }
}

// -----------------------------------------------------------------------------
// Chart API payload
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResponse {
    fn latest_price(&self) -> Option<Decimal> {
        let result = self.chart.result.as_ref()?.first()?;

        let last_close = result
            .indicators
            .as_ref()
            .and_then(|i| i.quote.first())
            .and_then(|q| q.close.iter().rev().flatten().copied().find(|p| p.is_finite()));

        let price = last_close.or_else(|| result.meta.as_ref()?.regular_market_price)?;
        to_decimal(price)
    }
}

fn to_decimal(price: f64) -> Option<Decimal> {
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    Decimal::from_f64(price).map(|d| d.round_dp(PRICE_DP))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ticker(s: &str) -> Ticker {
        Ticker::parse(s).unwrap()
    }

    fn source(server: &MockServer) -> YahooQuoteSource {
        YahooQuoteSource::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn chart(closes: serde_json::Value, market_price: serde_json::Value) -> serde_json::Value {
        json!({
            "chart": {
                "result": [{
                    "meta": {"symbol": "VALE3.SA", "regularMarketPrice": market_price},
                    "timestamp": [1, 2, 3],
                    "indicators": {"quote": [{"close": closes}]}
                }],
                "error": null
            }
        })
    }

    #[tokio::test]
    async fn uses_last_non_null_close() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/VALE3.SA"))
            .and(query_param("range", "1d"))
            .and(query_param("interval", "1m"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(chart(json!([64.5, 65.12, null]), json!(70.0))),
            )
            .mount(&server)
            .await;

        let price = source(&server).latest_price(&ticker("VALE3.SA")).await.unwrap();
        assert_eq!(price, dec!(65.12));
    }

    #[tokio::test]
    async fn falls_back_to_market_price() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart(json!([null]), json!(66.5))))
            .mount(&server)
            .await;

        let price = source(&server).latest_price(&ticker("VALE3.SA")).await.unwrap();
        assert_eq!(price, dec!(66.5));
    }

    #[tokio::test]
    async fn empty_chart_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart(json!([]), json!(null))))
            .mount(&server)
            .await;

        let err = source(&server).latest_price(&ticker("VALE3.SA")).await.unwrap_err();
        assert!(matches!(err, QuoteError::NoData(_)));
    }

    #[tokio::test]
    async fn unknown_symbol_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}
            })))
            .mount(&server)
            .await;

        let err = source(&server).latest_price(&ticker("NOPE3.SA")).await.unwrap_err();
        assert!(matches!(err, QuoteError::NoData(_)));
    }

    #[tokio::test]
    async fn garbled_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
            .mount(&server)
            .await;

        let err = source(&server).latest_price(&ticker("VALE3.SA")).await.unwrap_err();
        assert!(matches!(err, QuoteError::Decode(_)));
    }

    #[tokio::test]
    async fn server_error_is_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = source(&server).latest_price(&ticker("VALE3.SA")).await.unwrap_err();
        assert!(matches!(err, QuoteError::Status(503)));
    }
}
