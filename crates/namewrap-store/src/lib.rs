//! # namewrap store
//!
//! Storage abstraction for the name wrapper. Provides a trait-based interface
//! for persisting wrapped records, full names and operator approvals, with
//! SQLite and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`RecordStore`] - The trait for all storage operations
//! - [`WriteBatch`] - Writes applied all-or-nothing
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust
//! use namewrap_core::{DnsName, Principal};
//! use namewrap_perms::{Fuses, NameRecord};
//! use namewrap_store::{RecordStore, SqliteStore, WriteBatch};
//!
//! let store = SqliteStore::open_memory().unwrap();
//! let name = DnsName::parse("alice.eth").unwrap();
//! let record = NameRecord::new(Principal::named("alice"), Fuses::empty(), 0).unwrap();
//!
//! let mut batch = WriteBatch::new();
//! batch.put_record(name.node(), record).put_name(name.node(), name.clone());
//! store.apply(&batch).unwrap();
//!
//! assert_eq!(store.get_record(&name.node()).unwrap(), Some(record));
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic batches**: a failed batch leaves no partial writes
//! - **Validated loads**: rows are decoded through [`NameRecord::new`](namewrap_perms::NameRecord::new),
//!   so a corrupt fuse set surfaces as [`StoreError::InvalidData`]
//! - **Names outlive records**: unwrapping removes the record, not the name

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{RecordStore, RecordStoreExt, StoreWrite, WriteBatch};
