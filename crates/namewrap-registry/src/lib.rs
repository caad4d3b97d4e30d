//! # namewrap registry
//!
//! The collaborators the wrapper builds on, expressed as traits:
//!
//! - [`Registry`] - raw single-owner ownership, resolver and TTL per node
//! - [`Registrar`] - expiring leaf registrations under the suffix
//! - [`MetadataService`] - descriptive URIs
//!
//! plus in-memory implementations ([`MemoryRegistry`], [`MemoryRegistrar`],
//! [`StaticMetadata`]) that enforce the same authority rules, for tests and
//! local tooling.
//!
//! ## Approval domains
//!
//! Registry approvals, registrar approvals and wrapper approvals are three
//! separate relations. Being approved in one grants nothing in the others.

pub mod error;
pub mod memory;
pub mod metadata;
pub mod traits;

pub use error::{RegistryError, Result};
pub use memory::{MemoryRegistrar, MemoryRegistry, RegistryRecord};
pub use metadata::StaticMetadata;
pub use traits::{MetadataService, Registrar, Registry};
