//! # Error Types for Lexa
//!
//! Unified error handling across the Lexa crates.
//!
//! Only the linear-algebra seam and the persistence boundary ever hand one of
//! these to a caller. Insufficient data, unknown terms and numeric instability
//! inside the learning components are recovered locally into documented
//! fallback values.

use thiserror::Error;

/// Main error type for Lexa operations
#[derive(Error, Debug)]
pub enum LexaError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Not enough observations to compute something meaningful
    #[error("Insufficient data: needed {needed}, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// Near-singular matrix met during inversion
    #[error("Numeric instability: pivot magnitude {pivot:e} below tolerance")]
    NumericInstability { pivot: f64 },

    /// Load/save of persisted state failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Persistence did not complete in time
    #[error("Persistence timed out after {0} ms")]
    Timeout(u64),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type for Lexa operations
pub type LexaResult<T> = Result<T, LexaError>;

impl LexaError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

impl From<serde_json::Error> for LexaError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
