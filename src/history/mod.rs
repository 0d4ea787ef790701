pub mod episode;
pub mod meta;

pub use episode::{EpisodeHistory, EpisodeReport};
pub use meta::MetaHistory;
