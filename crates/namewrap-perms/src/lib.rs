//! # namewrap permissions
//!
//! The fuse/expiry permission engine.
//!
//! ## Overview
//!
//! A wrapped name carries a set of [`Fuses`]: flags that, once burned, can
//! never be cleared. Restricting fuses disable one owner capability each
//! (transfer, set resolver, set TTL, create subnames, burn more fuses) and
//! are only enforced until the record's expiry. Structural fuses
//! (`CANNOT_UNWRAP`, `PARENT_CANNOT_CONTROL`) are permanent.
//!
//! ## Rules
//!
//! - **Validity**: a restricting fuse requires `CANNOT_UNWRAP`. Checked by
//!   [`NameRecord::new`] on every write.
//! - **Monotonicity**: new fuses are always `requested | existing`.
//! - **Expiry cap**: a child's expiry never exceeds its parent's; fuse paths
//!   clamp ([`normalise_expiry`]), subnode creation rejects
//!   ([`check_subnode_expiry`]).
//! - **Parent lock**: once a child burns `PARENT_CANNOT_CONTROL` its parent
//!   can neither replace it nor add fuses to it.
//!
//! ## Usage
//!
//! ```rust
//! use namewrap_core::Principal;
//! use namewrap_perms::{Fuses, NameRecord};
//!
//! let record = NameRecord::new(
//!     Principal::named("alice"),
//!     Fuses::CANNOT_UNWRAP | Fuses::CANNOT_SET_RESOLVER,
//!     1_000,
//! )
//! .unwrap();
//!
//! assert!(!record.operation_allowed(Fuses::CANNOT_SET_RESOLVER, 500));
//! assert!(record.operation_allowed(Fuses::CANNOT_SET_RESOLVER, 1_000));
//! ```

pub mod engine;
pub mod error;
pub mod fuses;
pub mod record;

pub use engine::{
    can_create_or_replace_subnode, check_subnode_expiry, normalise_expiry, read_permissions,
    set_child_fuses, set_fuses, ChildFuseAuthority,
};
pub use error::{PermsError, Result};
pub use fuses::Fuses;
pub use record::NameRecord;
