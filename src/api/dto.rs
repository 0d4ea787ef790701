use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    history::EpisodeReport,
    pipeline::{BarRange, Prediction, TrainSummary},
    types::PriceBar,
};

pub const TRAINING_COMPLETE: &str = "Model training complete";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainModelRequest {
    pub symbol: String,
    /// YYYY-MM-DD, inclusive
    pub start_date: String,
    /// YYYY-MM-DD, exclusive
    pub end_date: String,
}

impl TrainModelRequest {
    pub fn range(&self) -> Result<BarRange> {
        BarRange::parse(&self.symbol, &self.start_date, &self.end_date)
    }
}

/// Same fields as a training request
pub type FetchDataRequest = TrainModelRequest;

/// One OHLC row as `{Date, Open, High, Low, Close}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BarDto {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl From<&PriceBar> for BarDto {
    fn from(bar: &PriceBar) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchDataResponse {
    pub data: Vec<BarDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionsRequest {
    pub symbol: String,
    /// Defaults to a year before `end_date`
    #[serde(default)]
    pub start_date: Option<String>,
    /// Defaults to tomorrow, so today's bar is included
    #[serde(default)]
    pub end_date: Option<String>,
}

impl PredictionsRequest {
    pub fn range(&self, today: NaiveDate) -> Result<BarRange> {
        BarRange::parse_or_recent(
            &self.symbol,
            self.start_date.as_deref(),
            self.end_date.as_deref(),
            today,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionsResponse {
    /// `{Date, Action}` with actions as `BUY`, `SELL` or `HOLD`
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationDto {
    pub steps: usize,
    pub final_reward: f64,
    pub final_cash: f64,
    pub final_holdings: f64,
}

impl From<&EpisodeReport> for EvaluationDto {
    fn from(report: &EpisodeReport) -> Self {
        Self {
            steps: report.steps,
            final_reward: report.final_reward,
            final_cash: report.final_cash,
            final_holdings: report.final_holdings,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainModelResponse {
    pub message: String,
    pub symbol: String,
    pub train_bars: usize,
    pub eval_bars: usize,
    pub steps: usize,
    pub final_reward: f64,
    pub evaluation: Option<EvaluationDto>,
}

impl From<TrainSummary> for TrainModelResponse {
    fn from(summary: TrainSummary) -> Self {
        Self {
            message: TRAINING_COMPLETE.to_string(),
            symbol: summary.ticker,
            train_bars: summary.train_bars,
            eval_bars: summary.eval_bars,
            steps: summary.training.steps,
            final_reward: summary.training.final_reward,
            evaluation: summary.evaluation.as_ref().map(EvaluationDto::from),
        }
    }
}
