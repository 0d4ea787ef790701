use std::sync::Arc;

use crate::{config::Config, data::MarketData};

/// Shared by every handler. Built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub market_data: Arc<dyn MarketData>,
}

impl AppState {
    pub fn new(config: Config, market_data: impl MarketData + 'static) -> Self {
        Self {
            config: Arc::new(config),
            market_data: Arc::new(market_data),
        }
    }
}
