use std::{fs, path::Path};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{error::Result, gym::TradeAction, utils::create_folder_if_not_exists};

/// Step-by-step record of a single episode
#[derive(Debug, Default, Clone)]
pub struct EpisodeHistory {
    /// step -> (price, quantity)
    pub buys: HashMap<usize, (f64, f64)>,
    /// step -> (price, quantity)
    pub sells: HashMap<usize, (f64, f64)>,
    pub actions: Vec<TradeAction>,
    pub cash: Vec<f64>,
    pub holdings: Vec<f64>,
    pub rewards: Vec<f64>,
}

impl EpisodeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> usize {
        self.actions.len()
    }

    pub fn report(&self, ticker: &str, episode: usize) -> EpisodeReport {
        let count = |wanted: TradeAction| self.actions.iter().filter(|a| **a == wanted).count();

        EpisodeReport {
            ticker: ticker.to_string(),
            episode,
            steps: self.steps(),
            final_reward: self.rewards.last().copied().unwrap_or(0.),
            final_cash: self.cash.last().copied().unwrap_or(0.),
            final_holdings: self.holdings.last().copied().unwrap_or(0.),
            buy_actions: count(TradeAction::Buy),
            sell_actions: count(TradeAction::Sell),
            hold_actions: count(TradeAction::Hold),
            buys_filled: self.buys.len(),
            sells_filled: self.sells.len(),
        }
    }

    /// Writes the episode summary as `<base_path>/<ticker>/episode_<n>.report.bin`
    pub fn record_to_path(&self, base_path: &Path, ticker: &str, episode: usize) -> Result<()> {
        let dir = base_path.join(ticker);
        create_folder_if_not_exists(&dir)?;

        let report = self.report(ticker, episode);
        let bytes = postcard::to_stdvec(&report)?;
        fs::write(dir.join(format!("episode_{episode}.report.bin")), bytes)?;
        Ok(())
    }
}

/// Summary of an episode, as logged and returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub ticker: String,
    pub episode: usize,
    pub steps: usize,
    /// Cumulative profit after the last step
    pub final_reward: f64,
    pub final_cash: f64,
    pub final_holdings: f64,
    pub buy_actions: usize,
    pub sell_actions: usize,
    pub hold_actions: usize,
    pub buys_filled: usize,
    pub sells_filled: usize,
}
