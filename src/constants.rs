pub mod env {
    /// Cash every episode starts with
    pub const STARTING_CASH: f64 = 10_000.;
    /// Open, High, Low, Close
    pub const OBSERVATION_SIZE: usize = 4;
}

pub mod agent {
    pub const ACTION_COUNT: usize = 3;
    pub const HIDDEN_SIZE: usize = 64;
    pub const LAYERS: [usize; 4] = [
        super::env::OBSERVATION_SIZE,
        HIDDEN_SIZE,
        HIDDEN_SIZE,
        ACTION_COUNT,
    ];
}

pub mod training {
    /// Share of the bars, oldest first, that form the training partition
    pub const TRAIN_SPLIT: f64 = 0.8;
}

pub mod qlearning {
    pub const LEARNING_RATE: f32 = 0.001;
    pub const GAMMA: f32 = 0.99;
    pub const EPSILON_START: f64 = 1.0;
    pub const EPSILON_END: f64 = 0.05;
    pub const EPSILON_DECAY: f64 = 0.995;
    pub const BATCH_SIZE: usize = 32;
    pub const MEMORY_SIZE: usize = 4_096;
    /// Gradient steps between copies of the online network into the target network
    pub const TARGET_SYNC_INTERVAL: usize = 100;
    pub const MAX_GRAD_NORM: f32 = 1.0;
}

pub mod files {
    pub const DATA_PATH: &str = "data";
    pub const WEIGHTS_PATH: &str = "weights";
    /// Fixed artifact name, overwritten by every completed run
    pub const WEIGHTS_FILE: &str = "dqn_model";
}

pub mod api {
    pub const BIND_ADDR: &str = "127.0.0.1:8000";
    pub const YAHOO_URL: &str = "https://query1.finance.yahoo.com";
    pub const DATE_FORMAT: &str = "%Y-%m-%d";
    /// Span of bars predicted on when a request gives no dates
    pub const PREDICTION_LOOKBACK_DAYS: u64 = 365;
}
