//! # namewrap testkit
//!
//! Testing utilities for namewrap.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: an in-memory [`World`] with registry, registrar, store,
//!   manual clock and event log already wired to a wrapper
//! - **Generators**: Proptest strategies for fuses, labels, names and fuse
//!   operation sequences
//! - **Vectors**: Known name encodings for cross-version verification
//!
//! ## Test Fixtures
//!
//! ```rust
//! use namewrap_core::Principal;
//! use namewrap_perms::Fuses;
//! use namewrap_testkit::World;
//!
//! let mut world = World::new();
//! let alice = Principal::named("alice");
//! let node = world.wrap_leaf("alice", alice, Fuses::CANNOT_UNWRAP);
//! assert_eq!(world.wrapper.owner_of(&node).unwrap(), alice);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use namewrap_testkit::generators::valid_fuses;
//! use namewrap_perms::{Fuses, NameRecord};
//! use namewrap_core::Principal;
//!
//! proptest! {
//!     #[test]
//!     fn valid_fuses_always_build(fuses in valid_fuses()) {
//!         prop_assert!(NameRecord::new(Principal::named("a"), fuses, 0).is_ok());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{label, principals, MemoryWrapper, World, GENESIS, YEAR};
pub use generators::{FuseOp, FuseScenario};
pub use vectors::{all_vectors, verify_all_vectors, NameVector};
