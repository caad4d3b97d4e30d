//! Error types for the name wrapper.

use namewrap_core::{CoreError, LabelHash, Node, Principal, Timestamp};
use namewrap_perms::PermsError;
use namewrap_registry::RegistryError;
use namewrap_store::StoreError;
use thiserror::Error;

/// Errors that can occur during wrapper operations.
///
/// Every rejection happens before any state is written.
#[derive(Debug, Error)]
pub enum WrapperError {
    /// Caller is neither the owner nor an approved operator.
    #[error("unauthorised: {0}")]
    Unauthorised(String),

    /// No wrapped record for the node.
    #[error("no wrapped record for node {0}")]
    NotFound(Node),

    /// Operation invoked with the wrong kind of parent.
    #[error("incompatible parent: {0}")]
    IncompatibleParent(Node),

    /// Name could not be parsed or decoded.
    #[error("incompatible name: {0}")]
    IncompatibleName(String),

    /// Label hash does not match the asset identifier.
    #[error("label mismatch: expected {expected:?}, found {found:?}")]
    LabelMismatch { expected: LabelHash, found: LabelHash },

    /// Inbound asset came from an untrusted sender.
    #[error("incorrect asset type from {0}")]
    IncorrectAssetType(Principal),

    #[error("label is empty")]
    LabelTooShort,

    #[error("label is {0} bytes, maximum is 255")]
    LabelTooLong(usize),

    /// Target owner is zero or the wrapper itself.
    #[error("invalid target owner: {0}")]
    InvalidTargetOwner(Principal),

    #[error("invalid expiry {requested}: must be within [{min}, {max}]")]
    InvalidExpiry {
        requested: Timestamp,
        min: Timestamp,
        max: Timestamp,
    },

    /// A fuse blocks the action, or the resulting fuse set is invalid.
    #[error("operation prohibited: {0}")]
    OperationProhibited(String),

    /// Raw registry or registrar rejected a call.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<PermsError> for WrapperError {
    fn from(err: PermsError) -> Self {
        match err {
            PermsError::Unauthorised(msg) => WrapperError::Unauthorised(msg),
            PermsError::OperationProhibited(msg) => WrapperError::OperationProhibited(msg),
            PermsError::InvalidExpiry {
                requested,
                min,
                max,
            } => WrapperError::InvalidExpiry {
                requested,
                min,
                max,
            },
            PermsError::NotFound(node) => WrapperError::NotFound(node),
            PermsError::UnknownFuses(bits) => {
                WrapperError::OperationProhibited(format!("unknown fuse bits: {bits:#x}"))
            }
        }
    }
}

impl From<CoreError> for WrapperError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::LabelTooShort => WrapperError::LabelTooShort,
            CoreError::LabelTooLong(len) => WrapperError::LabelTooLong(len),
            CoreError::IncompatibleName(msg) | CoreError::DecodingError(msg) => {
                WrapperError::IncompatibleName(msg)
            }
        }
    }
}

/// Result type for wrapper operations.
pub type Result<T> = std::result::Result<T, WrapperError>;
