//! Error types for namewrap core.

use thiserror::Error;

/// Errors raised while building or decoding names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("label is empty")]
    LabelTooShort,

    #[error("label is {0} bytes, maximum is 255")]
    LabelTooLong(usize),

    #[error("incompatible name: {0}")]
    IncompatibleName(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
