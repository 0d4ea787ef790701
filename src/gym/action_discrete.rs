use enum_map::Enum;
use serde::{Deserialize, Serialize};

use crate::{error::TraderError, gym::base::Action};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Hold,
    Buy,
    Sell,
}

impl Action for TradeAction {
    fn enumerate() -> Vec<Self> {
        vec![TradeAction::Hold, TradeAction::Buy, TradeAction::Sell]
    }
}

impl TryFrom<u32> for TradeAction {
    type Error = TraderError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TradeAction::Hold),
            1 => Ok(TradeAction::Buy),
            2 => Ok(TradeAction::Sell),
            _ => Err(TraderError::InvalidAction(value)),
        }
    }
}

impl From<TradeAction> for u32 {
    fn from(action: TradeAction) -> Self {
        match action {
            TradeAction::Hold => 0,
            TradeAction::Buy => 1,
            TradeAction::Sell => 2,
        }
    }
}
