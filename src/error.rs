//! Error handling for the trade simulator
//!
//! One crate-wide error type covers the ingestion pipeline, configuration and
//! the CLI. The cost estimator itself never fails: degenerate inputs map to
//! documented fallback values instead of errors.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for the trade simulator
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// A market-data message could not be turned into a snapshot.
    #[error("Malformed tick: {0}")]
    MalformedTick(String),

    /// Transport-level failure (connect, read, remote reset).
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimulatorError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        SimulatorError::MalformedTick(reason.into())
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SimulatorError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the pipeline should keep going after this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SimulatorError::Connection(_) | SimulatorError::MalformedTick(_)
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            SimulatorError::MalformedTick(_) => "market_data",
            SimulatorError::Connection(_) => "network",
            SimulatorError::InvalidParameter { .. } => "validation",
            SimulatorError::Config(_) => "config",
            SimulatorError::Io(_) => "io",
            SimulatorError::Serialization(_) => "serialization",
        }
    }
}

impl From<io::Error> for SimulatorError {
    fn from(err: io::Error) -> Self {
        SimulatorError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SimulatorError {
    fn from(err: serde_json::Error) -> Self {
        SimulatorError::Serialization(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SimulatorError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SimulatorError::Connection(err.to_string())
    }
}

/// Result type alias using SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
