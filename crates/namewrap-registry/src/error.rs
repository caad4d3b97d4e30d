//! Error types for the registry module.

use thiserror::Error;

use namewrap_core::LabelHash;

/// Errors raised by registry and registrar collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Sender is neither the owner nor an approved operator.
    #[error("unauthorised: {0}")]
    Unauthorised(String),

    /// No live registration for this asset.
    #[error("asset not registered: {0:?}")]
    NotRegistered(LabelHash),

    /// The asset is still registered to someone.
    #[error("asset not available: {0:?}")]
    NotAvailable(LabelHash),

    /// A lock was poisoned by a panicking writer.
    #[error("registry lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
