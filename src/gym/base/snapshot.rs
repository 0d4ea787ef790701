use std::collections::HashMap;

use super::environment::Environment;

/// What the environment reports back after a single step
pub struct Snapshot<E: Environment + ?Sized> {
    state: Option<E::StateType>,
    reward: E::RewardType,
    done: bool,
    info: HashMap<String, String>,
}

impl<E: Environment + ?Sized> Snapshot<E> {
    pub fn new(state: Option<E::StateType>, reward: E::RewardType, done: bool) -> Self {
        Self {
            state,
            reward,
            done,
            info: HashMap::new(),
        }
    }

    /// The next observation, absent once the episode is done
    pub fn state(&self) -> Option<&E::StateType> {
        self.state.as_ref()
    }

    pub fn into_state(self) -> Option<E::StateType> {
        self.state
    }

    pub fn reward(&self) -> &E::RewardType {
        &self.reward
    }

    pub fn done(&self) -> bool {
        self.done
    }

    pub fn info(&self) -> &HashMap<String, String> {
        &self.info
    }
}

impl<E: Environment + ?Sized> std::fmt::Debug for Snapshot<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("state", &self.state)
            .field("reward", &self.reward)
            .field("done", &self.done)
            .field("info", &self.info)
            .finish()
    }
}
