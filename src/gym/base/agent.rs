use crate::{error::Result, gym::base::environment::Environment};

pub trait Agent<E: Environment> {
    /// Picks the action for a state. Must not change the agent.
    fn react(&self, state: &E::StateType) -> Result<E::ActionType>;
}
