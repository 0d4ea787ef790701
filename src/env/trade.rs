use super::env::TradingEnv;

impl TradingEnv {
    /// Puts as much cash as buys whole units into the position. The previous
    /// position size is replaced, not added to. A buy that can't afford a
    /// single unit does nothing.
    ///
    /// Returns the quantity bought.
    pub(super) fn buy(&mut self, price: f64) -> Option<f64> {
        if self.account.cash < price {
            return None;
        }

        let mut quantity = (self.account.cash / price).floor();
        // Guard against the division rounding up across an integer boundary
        if quantity * price > self.account.cash {
            quantity -= 1.;
        }
        if quantity < 1. {
            return None;
        }

        self.account.holdings = quantity;
        self.account.cash -= quantity * price;
        Some(quantity)
    }

    /// Liquidates the whole position. Returns the quantity sold.
    pub(super) fn sell(&mut self, price: f64) -> Option<f64> {
        if self.account.holdings <= 0. {
            return None;
        }

        let quantity = self.account.holdings;
        self.account.cash += quantity * price;
        self.account.holdings = 0.;
        Some(quantity)
    }
}
