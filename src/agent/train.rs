use std::path::PathBuf;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, info_span};

use super::{
    learn::{run_learning_episode, QLearner, QLearningConfig},
    DqnAgent,
};
use crate::{
    constants::{env::STARTING_CASH, training::TRAIN_SPLIT},
    data::{partition, InstrumentHistory},
    env::TradingEnv,
    error::Result,
    gym::base::{Agent, Environment},
    history::{EpisodeReport, MetaHistory},
    types::Bars,
};

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub starting_cash: f64,
    pub train_split: f64,
    /// Learning updates are off unless this is set
    pub learning: Option<QLearningConfig>,
    /// Seeds weight initialization and exploration
    pub seed: Option<u64>,
    /// Episode reports are written under here when set
    pub history_dir: Option<PathBuf>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            starting_cash: STARTING_CASH,
            train_split: TRAIN_SPLIT,
            learning: None,
            seed: None,
            history_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub agent: DqnAgent,
    pub train_bars: usize,
    pub eval_bars: usize,
    /// Report of the last training episode
    pub training: EpisodeReport,
    pub evaluation: Option<EpisodeReport>,
    pub meta: MetaHistory,
}

/// Drives the agent through one episode, from reset until the environment
/// reports done. Returns the number of steps taken.
///
/// A terminal step without an observation keeps the last valid one.
pub fn run_episode<E: Environment, A: Agent<E>>(env: &mut E, agent: &A) -> Result<usize> {
    let mut state = env.reset();
    let mut steps = 0;

    loop {
        let action = agent.react(&state)?;
        let snapshot = env.step(action)?;
        steps += 1;

        let done = snapshot.done();
        if let Some(next_state) = snapshot.into_state() {
            state = next_state;
        }

        if done {
            return Ok(steps);
        }
    }
}

/// Splits the bars chronologically, trains a fresh agent on the older share and
/// evaluates it on the rest. Weights are left for the caller to persist.
pub fn train(ticker: &str, bars: Bars, config: &TrainConfig) -> Result<TrainOutcome> {
    let partitions = partition(ticker, bars, config.train_split)?;
    let train_bars = partitions.train.len();
    let eval_bars = partitions.eval.as_ref().map_or(0, InstrumentHistory::len);

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut agent = DqnAgent::new(&mut rng);

    let span = info_span!("train", ticker, agent = %agent.id);
    let _guard = span.enter();
    info!(train_bars, eval_bars, learning = config.learning.is_some(), "starting training");

    let mut env = TradingEnv::with_starting_cash(partitions.train, config.starting_cash);
    let mut meta = MetaHistory::default();

    match &config.learning {
        None => {
            run_episode(&mut env, &agent)?;
            record_episode(&env, config, &mut meta)?;
        }
        Some(learning) => {
            let mut learner = QLearner::new(
                learning.clone(),
                &agent.weights,
                config.starting_cash,
                rng.gen(),
            );

            for episode in 0..learning.episodes.max(1) {
                let steps = run_learning_episode(&mut env, &mut agent, &mut learner)?;
                let report = env.report();
                debug!(
                    episode,
                    steps,
                    final_reward = report.final_reward,
                    epsilon = learner.epsilon(),
                    updates = learner.updates(),
                    "episode complete"
                );
                record_episode(&env, config, &mut meta)?;
            }
        }
    }

    let training = env.report();
    info!(
        steps = training.steps,
        final_reward = training.final_reward,
        buys = training.buys_filled,
        sells = training.sells_filled,
        "training complete"
    );

    let evaluation = partitions
        .eval
        .map(|history| evaluate(&agent, history, config.starting_cash))
        .transpose()?;
    if let Some(evaluation) = &evaluation {
        info!(
            steps = evaluation.steps,
            final_reward = evaluation.final_reward,
            "evaluation complete"
        );
    }

    Ok(TrainOutcome {
        agent,
        train_bars,
        eval_bars,
        training,
        evaluation,
        meta,
    })
}

fn record_episode(env: &TradingEnv, config: &TrainConfig, meta: &mut MetaHistory) -> Result<()> {
    meta.record(&env.report());
    if let Some(dir) = &config.history_dir {
        env.episode_history()
            .record_to_path(dir, env.ticker(), env.episode())?;
    }
    Ok(())
}

/// Greedy pass over held-out bars. The agent is left untouched.
pub fn evaluate(agent: &DqnAgent, history: InstrumentHistory, starting_cash: f64) -> Result<EpisodeReport> {
    let mut env = TradingEnv::with_starting_cash(history, starting_cash);
    run_episode(&mut env, agent)?;
    Ok(env.report())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent::tests::agent_with_values,
        data::historical::tests::bars_with_closes,
        error::TraderError,
        gym::{base::Snapshot, TradeAction},
    };

    fn closes(len: usize) -> Vec<f64> {
        (0..len).map(|i| 100. + ((i * 13) % 17) as f64).collect()
    }

    /// Counts steps and checks nothing is stepped after done
    struct CountingEnv {
        len: usize,
        cursor: usize,
        steps: usize,
        finished: bool,
    }

    impl Environment for CountingEnv {
        type ActionType = TradeAction;
        type StateType = usize;
        type RewardType = f64;

        fn reset(&mut self) -> usize {
            self.cursor = 0;
            0
        }

        fn step(&mut self, _action: TradeAction) -> Result<Snapshot<Self>> {
            assert!(!self.finished, "stepped after done");
            self.steps += 1;
            self.cursor += 1;
            let done = self.cursor >= self.len - 1;
            self.finished = done;
            Ok(Snapshot::new((!done).then_some(self.cursor), 0., done))
        }
    }

    /// Remembers every state it was asked about
    struct RecordingAgent {
        seen: std::cell::RefCell<Vec<usize>>,
    }

    impl Agent<CountingEnv> for RecordingAgent {
        fn react(&self, state: &usize) -> Result<TradeAction> {
            self.seen.borrow_mut().push(*state);
            Ok(TradeAction::Hold)
        }
    }

    #[test]
    fn test_run_episode_stops_at_done() {
        for len in 2..10 {
            let mut env = CountingEnv {
                len,
                cursor: 0,
                steps: 0,
                finished: false,
            };
            let agent = RecordingAgent {
                seen: Default::default(),
            };

            let steps = run_episode(&mut env, &agent).unwrap();

            assert_eq!(steps, len - 1);
            assert_eq!(env.steps, len - 1);
            assert_eq!(*agent.seen.borrow(), (0..len - 1).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_greedy_buyer_over_scenario() {
        let history = InstrumentHistory::new("TEST", bars_with_closes(&[100., 110., 90.])).unwrap();
        let mut env = TradingEnv::new(history);
        let agent = agent_with_values([0., 1., 0.]);

        let steps = run_episode(&mut env, &agent).unwrap();

        assert_eq!(steps, 2);
        // Bought 100 at 100, then the second buy at 110 can't afford a unit
        assert_eq!(env.account().holdings, 100.);
        assert_eq!(env.account().cash, 0.);
        assert_eq!(env.report().final_reward, -10_000.);
    }

    #[test]
    fn test_train_runs_one_pass_over_training_partition() {
        let config = TrainConfig {
            seed: Some(3),
            ..Default::default()
        };

        let outcome = train("AAPL", bars_with_closes(&closes(50)), &config).unwrap();

        assert_eq!(outcome.train_bars, 40);
        assert_eq!(outcome.eval_bars, 10);
        assert_eq!(outcome.training.steps, 39);
        assert_eq!(outcome.meta.episodes(), 1);
        let evaluation = outcome.evaluation.unwrap();
        assert_eq!(evaluation.steps, 9);
        assert_eq!(evaluation.ticker, "AAPL");
    }

    #[test]
    fn test_train_without_learning_keeps_initial_weights() {
        let config = TrainConfig {
            seed: Some(8),
            ..Default::default()
        };
        let initial = DqnAgent::new(&mut StdRng::seed_from_u64(8));

        let outcome = train("AAPL", bars_with_closes(&closes(20)), &config).unwrap();

        assert_eq!(outcome.agent.weights, initial.weights);
    }

    #[test]
    fn test_train_with_learning_updates_weights() {
        let config = TrainConfig {
            seed: Some(8),
            learning: Some(QLearningConfig {
                batch_size: 4,
                episodes: 2,
                ..Default::default()
            }),
            ..Default::default()
        };
        let initial = DqnAgent::new(&mut StdRng::seed_from_u64(8));

        let outcome = train("AAPL", bars_with_closes(&closes(30)), &config).unwrap();

        assert_ne!(outcome.agent.weights, initial.weights);
        assert_eq!(outcome.meta.episodes(), 2);
        assert_eq!(outcome.training.episode, 1);
        assert_eq!(outcome.training.steps, 23);
    }

    #[test]
    fn test_train_writes_episode_reports() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainConfig {
            history_dir: Some(dir.path().to_path_buf()),
            learning: Some(QLearningConfig {
                episodes: 2,
                ..Default::default()
            }),
            ..Default::default()
        };

        train("AAPL", bars_with_closes(&closes(10)), &config).unwrap();

        assert!(dir.path().join("AAPL/episode_0.report.bin").exists());
        assert!(dir.path().join("AAPL/episode_1.report.bin").exists());
    }

    #[test]
    fn test_train_refuses_empty_partition() {
        let err = train("AAPL", vec![], &TrainConfig::default()).unwrap_err();
        assert!(matches!(err, TraderError::DataUnavailable(_)));

        let err = train("AAPL", bars_with_closes(&[100.]), &TrainConfig::default()).unwrap_err();
        assert!(matches!(err, TraderError::DataUnavailable(_)));
    }

    #[test]
    fn test_two_bars_split_into_single_bar_episodes() {
        // floor(0.8 * 2) = 1 training bar, 1 evaluation bar
        let outcome = train("AAPL", bars_with_closes(&[100., 101.]), &TrainConfig::default()).unwrap();
        assert_eq!(outcome.train_bars, 1);
        assert_eq!(outcome.training.steps, 1);
        assert_eq!(outcome.evaluation.unwrap().steps, 1);
    }
}
