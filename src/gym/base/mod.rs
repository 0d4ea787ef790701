mod action;
pub mod agent;
pub mod environment;
mod memory;
mod snapshot;

pub use action::Action;
pub use agent::Agent;
pub use environment::Environment;
pub use memory::{sample_indices, Memory, MemoryIndices, Sample};
pub use snapshot::Snapshot;
