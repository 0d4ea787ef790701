use thiserror::Error;

/// Every way a training run can fail
#[derive(Error, Debug)]
pub enum TraderError {
    #[error("Market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid action: {0}")]
    InvalidAction(u32),

    #[error("State invariant violated: {0}")]
    StateInvariant(String),

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("No trained model: {0}")]
    ModelUnavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] postcard::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Training task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, TraderError>;

impl TraderError {
    /// Contract violations that point at a bug rather than at bad input
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TraderError::InvalidAction(_) | TraderError::StateInvariant(_)
        )
    }
}
