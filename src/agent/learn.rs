//! Opt-in Q-learning on top of the greedy loop: epsilon-greedy exploration,
//! replay memory, a target network and gradient steps on the online network.
//!
//! Nothing here runs unless a [`QLearningConfig`] is supplied to training.

use ndarray::Array1;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use super::{network::Gradients, DqnAgent, QNetwork};
use crate::{
    constants::qlearning::{
        BATCH_SIZE, EPSILON_DECAY, EPSILON_END, EPSILON_START, GAMMA, LEARNING_RATE,
        MAX_GRAD_NORM, MEMORY_SIZE, TARGET_SYNC_INTERVAL,
    },
    env::{Observation, TradingEnv},
    error::Result,
    gym::{
        base::{Action, Environment, Memory},
        TradeAction,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct QLearningConfig {
    pub learning_rate: f32,
    pub gamma: f32,
    pub epsilon_start: f64,
    pub epsilon_end: f64,
    /// Multiplied into epsilon after every step
    pub epsilon_decay: f64,
    pub batch_size: usize,
    pub target_sync_interval: usize,
    pub max_grad_norm: f32,
    /// Full passes over the training partition
    pub episodes: usize,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: LEARNING_RATE,
            gamma: GAMMA,
            epsilon_start: EPSILON_START,
            epsilon_end: EPSILON_END,
            epsilon_decay: EPSILON_DECAY,
            batch_size: BATCH_SIZE,
            target_sync_interval: TARGET_SYNC_INTERVAL,
            max_grad_norm: MAX_GRAD_NORM,
            episodes: 1,
        }
    }
}

pub struct QLearner {
    config: QLearningConfig,
    target: QNetwork,
    memory: Memory<TradingEnv, MEMORY_SIZE>,
    epsilon: f64,
    updates: usize,
    /// Environment rewards are multiplied by this before entering the TD target
    reward_scale: f64,
    rng: StdRng,
}

impl QLearner {
    pub fn new(config: QLearningConfig, online: &QNetwork, starting_cash: f64, seed: u64) -> Self {
        Self {
            epsilon: config.epsilon_start,
            config,
            target: online.clone(),
            memory: Memory::default(),
            updates: 0,
            reward_scale: if starting_cash > 0. { 1. / starting_cash } else { 1. },
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn updates(&self) -> usize {
        self.updates
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Random action with probability epsilon, otherwise the agent's greedy choice
    pub fn select(&mut self, agent: &DqnAgent, state: &Observation) -> Result<TradeAction> {
        if self.rng.gen_bool(self.epsilon.clamp(0., 1.)) {
            return Ok(TradeAction::random(&mut self.rng));
        }
        agent.decide(state)
    }

    pub fn remember(
        &mut self,
        state: Observation,
        action: TradeAction,
        reward: f64,
        next_state: Observation,
        done: bool,
    ) {
        self.memory.push(state, next_state, action, reward, done);
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_end);
    }

    /// One gradient step on a sampled batch. `None` until the memory holds a batch.
    pub fn learn(&mut self, online: &mut QNetwork) -> Option<f32> {
        let batch_size = self.config.batch_size;
        if batch_size == 0 || self.memory.len() < batch_size {
            return None;
        }

        let mut grads = Gradients::zeros_like(online);
        let mut loss = 0.;
        let samples = self.memory.sample(batch_size, &mut self.rng);

        for sample in &samples {
            let reward = (sample.reward * self.reward_scale) as f32;
            let bootstrap = if sample.done {
                0.
            } else {
                let next_values = self.target.forward(sample.next_state.data());
                next_values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
            };
            let target = reward + self.config.gamma * bootstrap;

            let (values, layer_inputs) = online.forward_with_inputs(sample.state.data());
            let action = sample.action.index();
            let error = values[action] - target;
            loss += error * error;

            let mut output_grad = Array1::zeros(values.len());
            output_grad[action] = 2. * error;
            online.backward(&layer_inputs, output_grad, &mut grads);
        }

        online.apply_gradients(
            &grads,
            self.config.learning_rate,
            samples.len(),
            self.config.max_grad_norm,
        );
        self.updates += 1;

        if self.config.target_sync_interval > 0 && self.updates % self.config.target_sync_interval == 0 {
            self.target = online.clone();
            debug!(updates = self.updates, "synced target network");
        }

        Some(loss / samples.len() as f32)
    }
}

/// Runs one episode where every transition is remembered and learned from.
/// Returns the number of steps taken.
pub fn run_learning_episode(
    env: &mut TradingEnv,
    agent: &mut DqnAgent,
    learner: &mut QLearner,
) -> Result<usize> {
    let mut state = env.reset();
    let mut steps = 0;

    loop {
        let action = learner.select(agent, &state)?;
        let snapshot = env.step(action)?;
        steps += 1;

        let done = snapshot.done();
        let reward = *snapshot.reward();
        // The terminal step has no next observation, keep the last one
        let next_state = snapshot.into_state().unwrap_or(state);

        learner.remember(state, action, reward, next_state, done);
        learner.learn(&mut agent.weights);

        state = next_state;
        if done {
            return Ok(steps);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::agent::LAYERS, data::historical::tests::bars_with_closes,
        data::InstrumentHistory,
    };

    fn learner_for(agent: &DqnAgent, config: QLearningConfig) -> QLearner {
        QLearner::new(config, &agent.weights, 10_000., 42)
    }

    fn env_with(len: usize) -> TradingEnv {
        let closes: Vec<f64> = (0..len).map(|i| 100. + (i % 7) as f64 * 3.).collect();
        TradingEnv::new(InstrumentHistory::new("TEST", bars_with_closes(&closes)).unwrap())
    }

    #[test]
    fn test_epsilon_decays_to_floor() {
        let mut rng = StdRng::seed_from_u64(0);
        let agent = DqnAgent::new(&mut rng);
        let mut learner = learner_for(
            &agent,
            QLearningConfig {
                epsilon_decay: 0.5,
                epsilon_end: 0.1,
                ..Default::default()
            },
        );
        let state = Observation::new([1., 1., 1., 1.]);

        for _ in 0..10 {
            learner.remember(state, TradeAction::Hold, 0., state, false);
        }
        assert_eq!(learner.epsilon(), 0.1);
        assert_eq!(learner.memory_len(), 10);
    }

    #[test]
    fn test_zero_epsilon_is_greedy() {
        let mut rng = StdRng::seed_from_u64(0);
        let agent = DqnAgent::new(&mut rng);
        let mut learner = learner_for(
            &agent,
            QLearningConfig {
                epsilon_start: 0.,
                ..Default::default()
            },
        );
        let state = Observation::new([10., 11., 9., 10.5]);

        for _ in 0..20 {
            assert_eq!(learner.select(&agent, &state).unwrap(), agent.decide(&state).unwrap());
        }
    }

    #[test]
    fn test_learn_waits_for_a_full_batch() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut agent = DqnAgent::new(&mut rng);
        let mut learner = learner_for(
            &agent,
            QLearningConfig {
                batch_size: 4,
                ..Default::default()
            },
        );
        let state = Observation::new([1., 2., 0.5, 1.5]);

        for _ in 0..3 {
            learner.remember(state, TradeAction::Buy, 100., state, false);
            assert_eq!(learner.learn(&mut agent.weights), None);
        }

        learner.remember(state, TradeAction::Buy, 100., state, true);
        assert!(learner.learn(&mut agent.weights).is_some());
        assert_eq!(learner.updates(), 1);
    }

    #[test]
    fn test_repeated_updates_fit_a_terminal_reward() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut agent = DqnAgent::new(&mut rng);
        let mut learner = learner_for(
            &agent,
            QLearningConfig {
                batch_size: 8,
                learning_rate: 0.01,
                ..Default::default()
            },
        );
        let state = Observation::new([0.5, 0.6, 0.4, 0.55]);

        // Terminal transitions only, so the target is the scaled reward itself
        for _ in 0..8 {
            learner.remember(state, TradeAction::Sell, 5_000., state, true);
        }

        let first = learner.learn(&mut agent.weights).unwrap();
        let mut last = first;
        for _ in 0..200 {
            last = learner.learn(&mut agent.weights).unwrap();
        }

        assert!(last < first);
    }

    #[test]
    fn test_learning_episode_covers_the_partition() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut agent = DqnAgent::new(&mut rng);
        let mut env = env_with(50);
        let mut learner = learner_for(
            &agent,
            QLearningConfig {
                batch_size: 8,
                target_sync_interval: 5,
                ..Default::default()
            },
        );
        let before = agent.weights.clone();

        let steps = run_learning_episode(&mut env, &mut agent, &mut learner).unwrap();

        assert_eq!(steps, 49);
        assert_eq!(learner.memory_len(), 49);
        assert_eq!(learner.updates(), 49 - 8 + 1);
        assert_ne!(agent.weights, before);
        assert_eq!(agent.weights.layers().len(), LAYERS.len() - 1);
    }
}
