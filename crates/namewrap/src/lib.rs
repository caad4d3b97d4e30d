//! # namewrap
//!
//! Wraps a raw hierarchical name registry into records that carry
//! irrevocable fuses and an expiry.
//!
//! ## Overview
//!
//! - **Wrap**: the wrapper takes over a name's raw registry entry and keeps
//!   an owner, fuses and expiry for it
//! - **Fuses**: once burned, never cleared; restricting fuses stop being
//!   enforced when the record expires
//! - **Hierarchy**: a parent bounds its children's expiry and can give up
//!   control of a child for good with `PARENT_CANNOT_CONTROL`
//! - **Unwrap**: hands the raw entry back, unless `CANNOT_UNWRAP` is burned
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use namewrap::core::{DnsName, ManualClock, Node, LabelHash, Principal};
//! use namewrap::perms::Fuses;
//! use namewrap::registry::{MemoryRegistrar, MemoryRegistry, Registry};
//! use namewrap::store::MemoryStore;
//! use namewrap::{NameWrapper, WrapperConfig};
//!
//! let config = WrapperConfig::default();
//! let root = Principal::named("root");
//! let alice = Principal::named("alice");
//!
//! let registry = Arc::new(MemoryRegistry::new(root));
//! let clock = Arc::new(ManualClock::new(1_000));
//! let eth = registry
//!     .set_subnode_owner(&root, &Node::ROOT, &LabelHash::of(b"eth"), config.registrar)
//!     .unwrap();
//! let registrar = Arc::new(MemoryRegistrar::new(
//!     config.registrar,
//!     eth,
//!     registry.clone(),
//!     clock.clone(),
//! ));
//!
//! // A name outside the registrar suffix, held raw by alice.
//! let name = DnsName::parse("alice.xyz").unwrap();
//! let xyz = registry
//!     .set_subnode_owner(&root, &Node::ROOT, &LabelHash::of(b"xyz"), root)
//!     .unwrap();
//! registry
//!     .set_subnode_owner(&root, &xyz, &LabelHash::of(b"alice"), alice)
//!     .unwrap();
//! registry.set_approval_for_all(&alice, config.wrapper, true).unwrap();
//!
//! let mut wrapper = NameWrapper::new(
//!     config,
//!     Arc::new(MemoryStore::new()),
//!     registry,
//!     registrar,
//!     clock,
//! )
//! .unwrap();
//!
//! let node = wrapper.wrap(&alice, &name, alice, Fuses::empty(), None).unwrap();
//! assert_eq!(wrapper.owner_of(&node).unwrap(), alice);
//! ```
//!
//! ## Re-exports
//!
//! - `namewrap::core` - Names, nodes, principals, clocks
//! - `namewrap::perms` - Fuses and the permission engine
//! - `namewrap::store` - Record storage and SQLite
//! - `namewrap::registry` - Registry and registrar interfaces

pub mod config;
pub mod error;
pub mod events;
pub mod transfer;
pub mod wrapper;

// Re-export component crates
pub use namewrap_core as core;
pub use namewrap_perms as perms;
pub use namewrap_registry as registry;
pub use namewrap_store as store;

// Re-export main types for convenience
pub use config::WrapperConfig;
pub use error::{Result, WrapperError};
pub use events::{EventLog, EventSink, NullSink, WrapperEvent};
pub use transfer::RegistrationInstructions;
pub use wrapper::NameWrapper;

pub use namewrap_core::{DnsName, Label, LabelHash, Node, Principal, Timestamp};
pub use namewrap_perms::{Fuses, NameRecord};
