use std::path::PathBuf;

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    agent::{store::WeightsFile, train::train, DqnAgent},
    config::Config,
    constants::api::{DATE_FORMAT, PREDICTION_LOOKBACK_DAYS},
    data::{InstrumentHistory, MarketData},
    env::Observation,
    error::{Result, TraderError},
    gym::TradeAction,
    history::EpisodeReport,
    types::Bars,
};

/// One instrument over the validated date range `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarRange {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BarRange {
    pub fn parse(symbol: &str, start: &str, end: &str) -> Result<Self> {
        let ticker = symbol.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(TraderError::InvalidRequest("symbol is empty".to_string()));
        }

        let start = parse_date("start_date", start)?;
        let end = parse_date("end_date", end)?;
        if start >= end {
            return Err(TraderError::InvalidRequest(format!(
                "start_date {start} must be before end_date {end}"
            )));
        }

        Ok(Self { ticker, start, end })
    }

    /// Like [`BarRange::parse`], with missing dates filled in as the
    /// `PREDICTION_LOOKBACK_DAYS` up to and including `today`
    pub fn parse_or_recent(
        symbol: &str,
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self> {
        let end = match end {
            Some(end) => end.to_string(),
            None => (today + Days::new(1)).format(DATE_FORMAT).to_string(),
        };
        let start = match start {
            Some(start) => start.to_string(),
            None => {
                let end = parse_date("end_date", &end)?;
                (end - Days::new(PREDICTION_LOOKBACK_DAYS)).format(DATE_FORMAT).to_string()
            }
        };

        Self::parse(symbol, &start, &end)
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|err| {
        TraderError::InvalidRequest(format!("{field} {value:?} is not a YYYY-MM-DD date: {err}"))
    })
}

#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub ticker: String,
    pub train_bars: usize,
    pub eval_bars: usize,
    pub training: EpisodeReport,
    pub evaluation: Option<EpisodeReport>,
    pub weights_path: PathBuf,
}

/// Bars for the range, refusing an empty answer
pub async fn fetch(market_data: &dyn MarketData, range: &BarRange) -> Result<Bars> {
    let bars = market_data.bars(&range.ticker, range.start, range.end).await?;
    if bars.is_empty() {
        return Err(TraderError::DataUnavailable(format!(
            "no bars for {} between {} and {}",
            range.ticker, range.start, range.end
        )));
    }

    info!(ticker = %range.ticker, bars = bars.len(), "fetched bars");
    Ok(bars)
}

/// Fetches the bars, trains on a blocking worker and persists the weights.
/// Nothing is saved when any earlier stage fails.
pub async fn run(config: &Config, market_data: &dyn MarketData, job: BarRange) -> Result<TrainSummary> {
    let bars = fetch(market_data, &job).await?;

    let train_config = config.train_config();
    let store = WeightsFile::new(&config.weights_dir);
    let ticker = job.ticker.clone();

    let (outcome, weights_path) = tokio::task::spawn_blocking(move || {
        let outcome = train(&ticker, bars, &train_config)?;
        store.save(&outcome.agent.weights)?;
        Ok::<_, TraderError>((outcome, store.path()))
    })
    .await??;

    Ok(TrainSummary {
        ticker: job.ticker,
        train_bars: outcome.train_bars,
        eval_bars: outcome.eval_bars,
        training: outcome.training,
        evaluation: outcome.evaluation,
        weights_path,
    })
}

/// The greedy action the persisted agent takes on one bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Prediction {
    pub date: NaiveDate,
    pub action: TradeAction,
}

/// Loads the persisted weights and lets the agent decide on every bar of the
/// range. The weights are read before any bars are fetched.
pub async fn predict(config: &Config, market_data: &dyn MarketData, range: BarRange) -> Result<Vec<Prediction>> {
    let store = WeightsFile::new(&config.weights_dir);
    let weights = tokio::task::spawn_blocking(move || store.load()).await??;
    let agent = DqnAgent::from_weights(weights)?;

    let history = InstrumentHistory::new(range.ticker.as_str(), fetch(market_data, &range).await?)?;
    let predictions = history
        .bars()
        .iter()
        .map(|bar| {
            Ok(Prediction {
                date: bar.date,
                action: agent.decide(&Observation::from_bar(bar))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    info!(ticker = %range.ticker, predictions = predictions.len(), "predicted actions");
    Ok(predictions)
}

/// Today in local time, the default end of a prediction range
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
