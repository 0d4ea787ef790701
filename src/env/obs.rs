use serde::{Deserialize, Serialize};

use crate::{constants::env::OBSERVATION_SIZE, types::PriceBar};

use super::env::TradingEnv;

pub type ObservationData = [f32; OBSERVATION_SIZE];

/// Open, High, Low, Close of the bar under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    data: ObservationData,
}

impl Observation {
    pub fn new(data: ObservationData) -> Self {
        Self { data }
    }

    pub fn from_bar(bar: &PriceBar) -> Self {
        Self {
            data: bar.prices().map(|price| price as f32),
        }
    }

    pub fn data(&self) -> &ObservationData {
        &self.data
    }

    pub fn size() -> usize {
        OBSERVATION_SIZE
    }
}

impl TradingEnv {
    /// `None` when the cursor is past the last bar
    pub(super) fn observation_at(&self, index: usize) -> Option<Observation> {
        self.history.bar(index).map(Observation::from_bar)
    }
}
