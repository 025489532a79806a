//! Error handling for the simulation pipeline
//!
//! Fatal conditions only. Out-of-range kinematics are reported as
//! `RangeWarning` values and never reach this type.

use std::path::PathBuf;

/// Result type for simulation operations
pub type SimResult<T> = Result<T, SimError>;

/// Errors that abort a run
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Supervised param count {found} does not match {expected}!")]
    ParamCountMismatch { expected: usize, found: usize },

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Latent slot {index} outside latent of size {len}")]
    LatentSlotOutOfRange { index: String, len: usize },

    #[error("Field shape mismatch for {field}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        field: String,
        expected: [usize; 4],
        found: [usize; 4],
    },

    #[error("Prediction failed: {message}")]
    Prediction { message: String },

    #[error("Checksum mismatch in {path}: expected {expected:08x}, found {found:08x}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for SimError {
    fn from(err: bincode::Error) -> Self {
        SimError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SimError {
    fn from(err: toml::de::Error) -> Self {
        SimError::InvalidConfig {
            field: "toml".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Helper trait for attaching a path or operation to IO failures
pub trait SimErrorContext<T> {
    fn sim_context(self, context: &str) -> SimResult<T>;
}

impl<T> SimErrorContext<T> for Result<T, std::io::Error> {
    fn sim_context(self, context: &str) -> SimResult<T> {
        self.map_err(|e| SimError::Io(std::io::Error::new(e.kind(), format!("{}: {}", context, e))))
    }
}

/// Create an invalid configuration error
pub fn invalid_config(field: &str, reason: impl std::fmt::Display) -> SimError {
    SimError::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a prediction error
pub fn prediction_error(message: impl std::fmt::Display) -> SimError {
    SimError::Prediction {
        message: message.to_string(),
    }
}
