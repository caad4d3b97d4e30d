//! # namewrap core
//!
//! Pure primitives for namewrap: node identifiers, label hashes, principals,
//! hierarchical names and time sources.
//!
//! This crate contains no storage and no permission logic. It is pure
//! computation over names.
//!
//! ## Key Types
//!
//! - [`Node`] - Content-derived identifier of a name (Blake3)
//! - [`LabelHash`] - Hash of one label; also a leaf registration's asset id
//! - [`Principal`] - An account identity, [`Principal::ZERO`] meaning nobody
//! - [`DnsName`] - An owned, ordered sequence of [`Label`]s
//!
//! ## Hierarchy
//!
//! `node("alice.eth") == node("eth").child(&LabelHash::of(b"alice"))`.
//! See [`crypto`] for the derivation.

pub mod clock;
pub mod crypto;
pub mod error;
pub mod name;
pub mod types;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use crypto::{label_hash, make_node, namehash};
pub use error::{CoreError, Result};
pub use name::{DnsName, Label};
pub use types::{LabelHash, Node, Principal, Timestamp};
pub use validation::{validate_label, MAX_LABEL_LEN};
