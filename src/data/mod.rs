pub mod historical;
pub mod provider;
pub mod yahoo;

pub use historical::{partition, InstrumentHistory, Partitions};
pub use provider::{CachedMarketData, InMemoryMarketData, MarketData};
pub use yahoo::YahooFinance;
