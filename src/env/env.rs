use tracing::trace;

use super::obs::Observation;
use crate::{
    constants::env::STARTING_CASH,
    data::InstrumentHistory,
    error::{Result, TraderError},
    gym::{
        base::{Environment, Snapshot},
        TradeAction,
    },
    history::{EpisodeHistory, EpisodeReport},
    types::Account,
};

/// Single-instrument account stepping through historical bars one at a time.
///
/// The last bar is never traded into as a new observation, so an episode over
/// `N` bars is done after `N - 1` steps.
#[derive(Debug)]
pub struct TradingEnv {
    pub(super) history: InstrumentHistory,
    pub(super) starting_cash: f64,
    pub(super) account: Account,
    pub(super) cursor: usize,
    episode: usize,
    episode_history: EpisodeHistory,
}

impl TradingEnv {
    pub fn new(history: InstrumentHistory) -> Self {
        Self::with_starting_cash(history, STARTING_CASH)
    }

    pub fn with_starting_cash(history: InstrumentHistory, starting_cash: f64) -> Self {
        Self {
            history,
            starting_cash,
            account: Account::new(starting_cash),
            cursor: 0,
            episode: 0,
            episode_history: EpisodeHistory::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        self.history.ticker()
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn starting_cash(&self) -> f64 {
        self.starting_cash
    }

    pub fn bars(&self) -> usize {
        self.history.len()
    }

    pub fn episode(&self) -> usize {
        self.episode
    }

    pub fn episode_history(&self) -> &EpisodeHistory {
        &self.episode_history
    }

    pub fn report(&self) -> EpisodeReport {
        self.episode_history.report(self.ticker(), self.episode)
    }

    fn is_done(&self) -> bool {
        self.cursor >= self.history.len() - 1
    }

    fn record(&mut self, step: usize, action: TradeAction, price: f64, filled: Option<f64>, reward: f64) {
        if let Some(quantity) = filled {
            match action {
                TradeAction::Buy => {
                    self.episode_history.buys.insert(step, (price, quantity));
                }
                TradeAction::Sell => {
                    self.episode_history.sells.insert(step, (price, quantity));
                }
                TradeAction::Hold => {}
            }
        }

        self.episode_history.actions.push(action);
        self.episode_history.cash.push(self.account.cash);
        self.episode_history.holdings.push(self.account.holdings);
        self.episode_history.rewards.push(reward);
    }
}

impl Environment for TradingEnv {
    type ActionType = TradeAction;
    type StateType = Observation;
    type RewardType = f64;

    fn reset(&mut self) -> Observation {
        if self.episode_history.steps() > 0 {
            self.episode += 1;
        }

        self.account = Account::new(self.starting_cash);
        self.cursor = 0;
        self.episode_history = EpisodeHistory::new();

        // Histories are never empty
        Observation::from_bar(&self.history.bars()[0])
    }

    fn step(&mut self, action: TradeAction) -> Result<Snapshot<Self>> {
        let step = self.cursor;
        let price = self.history.close(step).ok_or_else(|| {
            TraderError::StateInvariant(format!(
                "step at cursor {step} is past the last of {} bars",
                self.history.len()
            ))
        })?;

        let filled = match action {
            TradeAction::Buy => self.buy(price),
            TradeAction::Sell => self.sell(price),
            TradeAction::Hold => None,
        };
        self.check_invariants()?;

        let reward = self.reward();
        self.record(step, action, price, filled, reward);

        self.cursor += 1;
        let done = self.is_done();
        let state = if done {
            None
        } else {
            self.observation_at(self.cursor)
        };

        trace!(
            step,
            ?action,
            price,
            cash = self.account.cash,
            holdings = self.account.holdings,
            reward,
            done,
            "step"
        );

        Ok(Snapshot::new(state, reward, done))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::historical::tests::bars_with_closes;

    fn env_with_closes(closes: &[f64]) -> TradingEnv {
        TradingEnv::new(InstrumentHistory::new("TEST", bars_with_closes(closes)).unwrap())
    }

    #[test]
    fn test_scenario_buy_sell_hold() {
        let mut env = env_with_closes(&[100., 110., 90.]);
        env.reset();

        let snapshot = env.step(TradeAction::Buy).unwrap();
        assert_eq!(env.account().holdings, 100.);
        assert_eq!(env.account().cash, 0.);
        assert_eq!(*snapshot.reward(), -10_000.);
        assert!(!snapshot.done());
        assert_eq!(snapshot.state().unwrap().data()[3], 110.);

        let snapshot = env.step(TradeAction::Sell).unwrap();
        assert_eq!(env.account().holdings, 0.);
        assert_eq!(env.account().cash, 11_000.);
        assert_eq!(*snapshot.reward(), 1_000.);
        assert!(snapshot.done());
        assert!(snapshot.state().is_none());

        // The trailing bar can still be priced, it just never becomes an observation
        let snapshot = env.step(TradeAction::Hold).unwrap();
        assert_eq!(*snapshot.reward(), 1_000.);
        assert!(snapshot.done());
        assert!(snapshot.state().is_none());
        assert!(snapshot.info().is_empty());

        let err = env.step(TradeAction::Hold).unwrap_err();
        assert!(matches!(err, TraderError::StateInvariant(_)));
    }

    #[test]
    fn test_episode_runs_len_minus_one_steps() {
        for len in 2..12 {
            let closes: Vec<f64> = (0..len).map(|i| 50. + i as f64).collect();
            let mut env = env_with_closes(&closes);
            env.reset();

            let mut steps = 0;
            loop {
                steps += 1;
                if env.step(TradeAction::Hold).unwrap().done() {
                    break;
                }
            }
            assert_eq!(steps, len - 1);
        }
    }

    #[test]
    fn test_single_bar_is_done_after_first_step() {
        let mut env = env_with_closes(&[100.]);
        env.reset();

        let snapshot = env.step(TradeAction::Buy).unwrap();
        assert!(snapshot.done());
        assert_eq!(env.account().holdings, 100.);
    }

    #[test]
    fn test_unaffordable_buy_is_noop() {
        let history = InstrumentHistory::new("TEST", bars_with_closes(&[500., 510., 520.])).unwrap();
        let mut env = TradingEnv::with_starting_cash(history, 499.);
        env.reset();

        let snapshot = env.step(TradeAction::Buy).unwrap();
        assert_eq!(env.account().cash, 499.);
        assert_eq!(env.account().holdings, 0.);
        assert_eq!(*snapshot.reward(), 0.);
        assert!(env.episode_history().buys.is_empty());
    }

    #[test]
    fn test_second_buy_replaces_position() {
        let mut env = env_with_closes(&[300., 7., 9., 9.]);
        env.reset();

        env.step(TradeAction::Buy).unwrap();
        // floor(10000 / 300) = 33, leaving 100
        assert_eq!(env.account().holdings, 33.);
        assert_eq!(env.account().cash, 100.);

        env.step(TradeAction::Buy).unwrap();
        // floor(100 / 7) = 14, not 33 + 14
        assert_eq!(env.account().holdings, 14.);
        assert_eq!(env.account().cash, 2.);
    }

    #[test]
    fn test_sell_without_holdings_is_noop() {
        let mut env = env_with_closes(&[100., 110., 120.]);
        env.reset();

        let snapshot = env.step(TradeAction::Sell).unwrap();
        assert_eq!(env.account().cash, 10_000.);
        assert_eq!(env.account().holdings, 0.);
        assert_eq!(*snapshot.reward(), 0.);
        assert!(env.episode_history().sells.is_empty());
    }

    #[test]
    fn test_reward_is_cash_profit_every_step() {
        let closes = [120., 80., 95., 130., 60., 61.];
        let actions = [
            TradeAction::Buy,
            TradeAction::Hold,
            TradeAction::Sell,
            TradeAction::Buy,
            TradeAction::Sell,
        ];
        let mut env = env_with_closes(&closes);
        env.reset();

        for action in actions {
            let snapshot = env.step(action).unwrap();
            assert_eq!(*snapshot.reward(), env.account().cash - 10_000.);
            assert!(env.account().cash >= 0.);
            assert!(env.account().holdings >= 0.);
        }
    }

    #[test]
    fn test_reset_returns_first_observation() {
        let mut env = env_with_closes(&[100., 110., 90.]);
        let first = env.reset();
        assert_eq!(first.data(), &[99., 102., 98., 100.]);

        env.step(TradeAction::Buy).unwrap();
        env.step(TradeAction::Hold).unwrap();

        assert_eq!(env.reset(), first);
        assert_eq!(env.cursor(), 0);
        assert_eq!(env.account(), &Account::new(10_000.));
        assert_eq!(env.episode(), 1);
        assert_eq!(env.episode_history().steps(), 0);
    }

    #[test]
    fn test_report_tracks_fills() {
        let mut env = env_with_closes(&[100., 110., 90.]);
        env.reset();
        env.step(TradeAction::Buy).unwrap();
        env.step(TradeAction::Sell).unwrap();

        let report = env.report();
        assert_eq!(report.ticker, "TEST");
        assert_eq!(report.steps, 2);
        assert_eq!(report.final_reward, 1_000.);
        assert_eq!(env.episode_history().buys.get(&0), Some(&(100., 100.)));
        assert_eq!(env.episode_history().sells.get(&1), Some(&(110., 100.)));
    }
}
