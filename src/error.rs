//! Error types for admission operations.
//!
//! Local limiters synchronize through atomics and mutexes, which never fail;
//! the only runtime error channel is the distributed limiters' store call.
//! Store errors are reported but deliberately do not escalate to a denied
//! request (the distributed limiters fail open).

use thiserror::Error;

/// Result type for admission operations.
pub type Result<T> = std::result::Result<T, LimitError>;

/// Main error type for admission operations.
#[derive(Debug, Error)]
pub enum LimitError {
    /// Store backend error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the shared store used by the distributed limiters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Generic store operation failed.
    #[error("{message}")]
    OperationFailed {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The admission script failed at the store.
    #[error("Script execution failed: {0}")]
    Script(String),

    /// Failed to connect to the store.
    #[error("Failed to connect: {0}")]
    ConnectionFailed(String),

    /// Connection pool exhausted.
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl StoreError {
    /// Create a new operation failed error.
    pub fn operation_failed(message: impl Into<String>, retryable: bool) -> Self {
        Self::OperationFailed {
            message: message.into(),
            retryable,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::OperationFailed { retryable, .. } => *retryable,
            Self::PoolExhausted => true,
            _ => false,
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid interval configuration.
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// Invalid rate or capacity configuration.
    #[error("Invalid rate: {0}")]
    InvalidRate(String),
}
