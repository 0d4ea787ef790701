use std::{fs, path::Path};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{
    error::{Result, TraderError},
    types::{Bars, PriceBar},
    utils::{create_folder_if_not_exists, split_chronological},
};

/// Price history bound to a single instrument. Non-empty, every bar valid, dates
/// strictly ascending.
#[derive(Debug, Clone)]
pub struct InstrumentHistory {
    ticker: String,
    bars: Bars,
}

impl InstrumentHistory {
    pub fn new(ticker: impl Into<String>, bars: Bars) -> Result<Self> {
        let ticker = ticker.into();
        validate_bars(&ticker, &bars)?;
        Ok(Self { ticker, bars })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    pub fn close(&self, index: usize) -> Option<f64> {
        self.bar(index).map(|bar| bar.close)
    }
}

fn validate_bars(ticker: &str, bars: &[PriceBar]) -> Result<()> {
    if bars.is_empty() {
        return Err(TraderError::DataUnavailable(format!("no bars for {ticker}")));
    }

    if let Some(bar) = bars.iter().find(|bar| !bar.is_valid()) {
        return Err(TraderError::DataUnavailable(format!(
            "malformed bar for {ticker} on {}",
            bar.date
        )));
    }

    if let Some(pair) = bars.windows(2).find(|pair| pair[0].date >= pair[1].date) {
        return Err(TraderError::DataUnavailable(format!(
            "bars for {ticker} are not in ascending date order at {}",
            pair[1].date
        )));
    }

    Ok(())
}

/// The chronological split of one instrument's bars
#[derive(Debug, Clone)]
pub struct Partitions {
    pub train: InstrumentHistory,
    /// Absent when the split leaves no bars for evaluation
    pub eval: Option<InstrumentHistory>,
}

/// Validates the whole sequence, then splits it into training and evaluation
/// partitions. An empty training partition is refused.
pub fn partition(ticker: &str, bars: Bars, train_split: f64) -> Result<Partitions> {
    validate_bars(ticker, &bars)?;

    let (train, eval) = split_chronological(bars, train_split);
    if train.is_empty() {
        return Err(TraderError::DataUnavailable(format!(
            "training partition for {ticker} is empty"
        )));
    }

    let eval = if eval.is_empty() {
        None
    } else {
        Some(InstrumentHistory::new(ticker, eval)?)
    };

    Ok(Partitions {
        train: InstrumentHistory::new(ticker, train)?,
        eval,
    })
}

pub fn cache_file_name(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!("{}_{start}_{end}.bin", ticker.to_uppercase())
}

/// Reads bars previously written by [`write_historical_data_to_file`]. A missing
/// file is a plain miss, an undecodable one is logged and treated as a miss.
pub fn get_historical_data_from_file(path: &Path) -> Option<Bars> {
    let file = fs::read(path).ok()?;
    let bars: Bars = match postcard::from_bytes(&file) {
        Ok(bars) => bars,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring corrupt cached bars");
            return None;
        }
    };

    debug!(path = %path.display(), bars = bars.len(), "read cached bars");
    Some(bars)
}

pub fn write_historical_data_to_file(path: &Path, bars: &Bars) -> Result<()> {
    if let Some(dir) = path.parent() {
        create_folder_if_not_exists(dir)?;
    }

    let encoded = postcard::to_allocvec(bars)?;
    fs::write(path, encoded)?;

    debug!(path = %path.display(), bars = bars.len(), "cached bars");
    Ok(())
}
