use crate::error::{Result, TraderError};

use super::env::TradingEnv;

impl TradingEnv {
    /// Cumulative cash profit since the start of the episode. Open positions are
    /// not marked to market.
    pub(super) fn reward(&self) -> f64 {
        self.account.cash - self.starting_cash
    }

    pub(super) fn check_invariants(&self) -> Result<()> {
        if self.account.cash < 0. || self.account.holdings < 0. {
            return Err(TraderError::StateInvariant(format!(
                "negative account at cursor {}: cash {}, holdings {}",
                self.cursor, self.account.cash, self.account.holdings
            )));
        }
        Ok(())
    }
}
