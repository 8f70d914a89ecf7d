use thiserror::Error;

/// Result alias for game operations
pub type Result<T> = std::result::Result<T, GameError>;

/// Everything that can go wrong inside a game session.
/// None of these are fatal: callers report the message and carry on.
#[derive(Debug, Error)]
pub enum GameError {
    /// Malformed period, result or digit-string input
    #[error("{0}")]
    Validation(String),

    #[error("Not enough training examples: {available} < {required}")]
    InsufficientData { available: usize, required: usize },

    #[error("Need at least {required} results to build features, have {available}")]
    InsufficientHistory { available: usize, required: usize },

    #[error("No trained model available. Train a model first.")]
    NoModel,

    /// Stored JSON failed to parse
    #[error("Corrupt saved {entry}: {reason}")]
    CorruptState { entry: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GameError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn corrupt(entry: impl Into<String>, reason: impl ToString) -> Self {
        Self::CorruptState {
            entry: entry.into(),
            reason: reason.to_string(),
        }
    }
}
