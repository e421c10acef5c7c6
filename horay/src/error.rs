//! Error types for HORAY

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HorayError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Dimension mismatch: expected {expected} elements, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Scene error: {0}")]
    Scene(String),
}

pub type Result<T> = std::result::Result<T, HorayError>;
