//! Error types for the permission engine.

use namewrap_core::{Node, Timestamp};
use thiserror::Error;

/// Errors that can occur while checking or applying fuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermsError {
    /// The caller may not perform this change.
    #[error("unauthorised: {0}")]
    Unauthorised(String),

    /// A fuse blocks the change, or the resulting fuse set is invalid.
    #[error("operation prohibited: {0}")]
    OperationProhibited(String),

    /// Requested expiry outside the permitted window.
    #[error("invalid expiry {requested}: must be within [{min}, {max}]")]
    InvalidExpiry {
        requested: Timestamp,
        min: Timestamp,
        max: Timestamp,
    },

    /// No record exists for the node.
    #[error("no record for node {0}")]
    NotFound(Node),

    /// Raw fuse bits outside the known flag set.
    #[error("unknown fuse bits: {0:#x}")]
    UnknownFuses(u32),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
