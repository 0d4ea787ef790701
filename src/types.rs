use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One dated OHLC record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }

    pub fn prices(&self) -> [f64; 4] {
        [self.open, self.high, self.low, self.close]
    }

    /// All four prices are finite and strictly positive
    pub fn is_valid(&self) -> bool {
        self.prices()
            .iter()
            .all(|price| price.is_finite() && *price > 0.)
    }
}

/// A list of bars, where the last index is the most recent
pub type Bars = Vec<PriceBar>;

/// Simulated cash and position for a single instrument
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Account {
    pub cash: f64,
    /// Whole units of the instrument
    pub holdings: f64,
}

impl Account {
    pub fn new(cash: f64) -> Self {
        Self { cash, holdings: 0. }
    }

    pub fn position_value(&self, price: f64) -> f64 {
        self.holdings * price
    }

    pub fn total_assets(&self, price: f64) -> f64 {
        self.cash + self.position_value(price)
    }
}
