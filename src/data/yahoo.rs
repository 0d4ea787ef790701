use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::debug;

use super::provider::MarketData;
use crate::{
    constants::api::YAHOO_URL,
    error::{Result, TraderError},
    types::{Bars, PriceBar},
};

/// Daily bars from the Yahoo Finance chart endpoint
#[derive(Debug, Clone)]
pub struct YahooFinance {
    client: reqwest::Client,
    base_url: String,
}

impl YahooFinance {
    pub fn new() -> Result<Self> {
        Self::with_base_url(YAHOO_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dqn_trader/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MarketData for YahooFinance {
    async fn bars(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Bars> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = end.and_time(NaiveTime::MIN).and_utc().timestamp();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body: ChartResponse = response.json().await.map_err(|err| {
            TraderError::MarketData(format!("undecodable chart for {ticker} ({status}): {err}"))
        })?;

        let bars = parse_chart(ticker, body)?;
        debug!(ticker, bars = bars.len(), "fetched bars");
        Ok(bars)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Rows missing any of open/high/low/close are dropped
fn parse_chart(ticker: &str, response: ChartResponse) -> Result<Bars> {
    if let Some(error) = response.chart.error {
        return Err(TraderError::MarketData(format!(
            "{ticker}: {} ({})",
            error.description, error.code
        )));
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let bars = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, timestamp)| {
            let date = DateTime::from_timestamp(*timestamp, 0)?.date_naive();
            Some(PriceBar::new(
                date,
                (*quote.open.get(i)?)?,
                (*quote.high.get(i)?)?,
                (*quote.low.get(i)?)?,
                (*quote.close.get(i)?)?,
            ))
        })
        .collect();

    Ok(bars)
}
