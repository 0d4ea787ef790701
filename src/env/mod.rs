mod env;
mod obs;
mod reward;
mod trade;

pub use env::TradingEnv;
pub use obs::{Observation, ObservationData};
