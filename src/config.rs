use std::path::PathBuf;

use crate::{
    agent::{learn::QLearningConfig, train::TrainConfig},
    constants::{
        api::BIND_ADDR,
        env::STARTING_CASH,
        files::{DATA_PATH, WEIGHTS_PATH},
        training::TRAIN_SPLIT,
    },
};

/// Settings shared by the service and the command line
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub weights_dir: PathBuf,
    /// Cached market data lives here
    pub data_dir: PathBuf,
    pub starting_cash: f64,
    pub train_split: f64,
    /// Turns on Q-learning updates during training
    pub learning: Option<QLearningConfig>,
    /// Per-episode reports are kept here when set
    pub history_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: BIND_ADDR.to_string(),
            weights_dir: PathBuf::from(WEIGHTS_PATH),
            data_dir: PathBuf::from(DATA_PATH),
            starting_cash: STARTING_CASH,
            train_split: TRAIN_SPLIT,
            learning: None,
            history_dir: None,
        }
    }
}

impl Config {
    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            starting_cash: self.starting_cash,
            train_split: self.train_split,
            learning: self.learning.clone(),
            seed: None,
            history_dir: self.history_dir.clone(),
        }
    }
}
