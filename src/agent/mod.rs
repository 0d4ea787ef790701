use enum_map::EnumMap;
use rand::Rng;
use uuid::Uuid;

use crate::{
    constants::{
        agent::{ACTION_COUNT, LAYERS},
        env::OBSERVATION_SIZE,
    },
    env::{Observation, TradingEnv},
    error::{Result, TraderError},
    gym::{base::Agent, TradeAction},
    utils::argmax,
};

pub mod learn;
pub mod network;
pub mod store;
pub mod train;

pub use network::QNetwork;

/// Predicted value of taking each action from a state
pub type ActionValues = EnumMap<TradeAction, f32>;

/// Value-approximation agent choosing greedily between hold, buy and sell
#[derive(Debug, Clone)]
pub struct DqnAgent {
    pub weights: QNetwork,
    pub id: Uuid,
}

impl DqnAgent {
    pub fn new(rng: &mut impl Rng) -> Self {
        Self {
            weights: QNetwork::new(&LAYERS, rng),
            id: Uuid::new_v4(),
        }
    }

    /// Refuses weights that don't map an observation onto one value per action
    pub fn from_weights(weights: QNetwork) -> Result<Self> {
        if !weights.is_consistent()
            || weights.input_size() != OBSERVATION_SIZE
            || weights.output_size() != ACTION_COUNT
        {
            return Err(TraderError::StateInvariant(format!(
                "weights map {} inputs to {} outputs, expected {OBSERVATION_SIZE} to {ACTION_COUNT}",
                weights.input_size(),
                weights.output_size()
            )));
        }

        Ok(Self {
            weights,
            id: Uuid::new_v4(),
        })
    }

    pub fn action_values(&self, observation: &Observation) -> ActionValues {
        let values = self.weights.forward(observation.data());
        EnumMap::from_fn(|action: TradeAction| {
            values.get(u32::from(action) as usize).copied().unwrap_or(f32::NEG_INFINITY)
        })
    }

    /// The action with the highest predicted value, lowest index on ties
    pub fn decide(&self, observation: &Observation) -> Result<TradeAction> {
        let values = self.weights.forward(observation.data());
        let index = argmax(values.iter().copied())
            .ok_or_else(|| TraderError::StateInvariant("network has no outputs".to_string()))?;

        TradeAction::try_from(index as u32)
    }
}

impl Agent<TradingEnv> for DqnAgent {
    fn react(&self, state: &Observation) -> Result<TradeAction> {
        self.decide(state)
    }
}
