use rand::Rng;
use ringbuffer::{ConstGenericRingBuffer, RingBuffer};

use crate::gym::base::environment::Environment;

pub type MemoryIndices = Vec<usize>;

/// Uniformly samples `size` indices, with replacement, from `0..len`
pub fn sample_indices(len: usize, size: usize, rng: &mut impl Rng) -> MemoryIndices {
    if len == 0 {
        return Vec::new();
    }

    (0..size).map(|_| rng.gen_range(0..len)).collect()
}

/// One remembered step: where the agent was, what it did and what followed
pub struct Transition<E: Environment> {
    pub state: E::StateType,
    pub next_state: E::StateType,
    pub action: E::ActionType,
    pub reward: E::RewardType,
    pub done: bool,
}

/// A transition borrowed from the memory
pub type Sample<'a, E> = &'a Transition<E>;

/// Replay memory holding the most recent `CAP` transitions. Older ones are
/// overwritten first.
pub struct Memory<E: Environment, const CAP: usize> {
    transitions: ConstGenericRingBuffer<Transition<E>, CAP>,
}

impl<E: Environment, const CAP: usize> Default for Memory<E, CAP> {
    fn default() -> Self {
        Self {
            transitions: ConstGenericRingBuffer::new(),
        }
    }
}

impl<E: Environment, const CAP: usize> Memory<E, CAP> {
    pub fn push(
        &mut self,
        state: E::StateType,
        next_state: E::StateType,
        action: E::ActionType,
        reward: E::RewardType,
        done: bool,
    ) {
        self.transitions.push(Transition {
            state,
            next_state,
            action,
            reward,
            done,
        });
    }

    /// Index 0 is the oldest transition still held
    pub fn get(&self, index: usize) -> Option<Sample<'_, E>> {
        if index >= self.len() {
            return None;
        }
        self.transitions.get(index)
    }

    pub fn sample(&self, size: usize, rng: &mut impl Rng) -> Vec<Sample<'_, E>> {
        sample_indices(self.len(), size, rng)
            .into_iter()
            .filter_map(|index| self.get(index))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}
