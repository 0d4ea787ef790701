pub mod action_discrete;
pub mod base;

pub use action_discrete::TradeAction;
