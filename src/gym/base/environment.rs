use std::fmt::Debug;

use super::{action::Action, snapshot::Snapshot};
use crate::error::Result;

pub trait Environment {
    type ActionType: Action;
    type StateType: Debug + Clone;
    type RewardType: Debug + Copy;

    /// Puts the simulation back at its first step and returns the first state
    fn reset(&mut self) -> Self::StateType;

    fn step(&mut self, action: Self::ActionType) -> Result<Snapshot<Self>>;
}
