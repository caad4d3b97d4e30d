//! Store trait: the abstract interface for wrapped record persistence.
//!
//! Reads are individual calls. Writes are grouped into a [`WriteBatch`] and
//! applied all-or-nothing, so an operation that touches a record, its name
//! and an approval never leaves a torn state behind.

use namewrap_core::{DnsName, Node, Principal};
use namewrap_perms::NameRecord;

use crate::error::Result;

/// A single write in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    /// Insert or overwrite the record for a node.
    PutRecord { node: Node, record: NameRecord },
    /// Delete the record for a node (no-op if absent).
    RemoveRecord { node: Node },
    /// Remember the full name of a node.
    PutName { node: Node, name: DnsName },
    /// Grant or revoke an operator over all of an owner's records.
    SetApproval {
        owner: Principal,
        operator: Principal,
        approved: bool,
    },
}

/// Ordered list of writes applied atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<StoreWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_record(&mut self, node: Node, record: NameRecord) -> &mut Self {
        self.writes.push(StoreWrite::PutRecord { node, record });
        self
    }

    pub fn remove_record(&mut self, node: Node) -> &mut Self {
        self.writes.push(StoreWrite::RemoveRecord { node });
        self
    }

    pub fn put_name(&mut self, node: Node, name: DnsName) -> &mut Self {
        self.writes.push(StoreWrite::PutName { node, name });
        self
    }

    pub fn set_approval(&mut self, owner: Principal, operator: Principal, approved: bool) -> &mut Self {
        self.writes.push(StoreWrite::SetApproval {
            owner,
            operator,
            approved,
        });
        self
    }

    pub fn writes(&self) -> &[StoreWrite] {
        &self.writes
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }
}

/// The RecordStore trait: persistence of wrapped records, their names and
/// operator approvals.
///
/// Implementations can be in-memory or SQLite. The wrapper doesn't care,
/// it just needs these operations.
pub trait RecordStore: Send + Sync {
    /// Get the record for a node.
    fn get_record(&self, node: &Node) -> Result<Option<NameRecord>>;

    /// Get the full name stored for a node.
    fn get_name(&self, node: &Node) -> Result<Option<DnsName>>;

    /// Whether `operator` may act for all of `owner`'s records.
    fn is_approved_for_all(&self, owner: &Principal, operator: &Principal) -> Result<bool>;

    /// Number of live records.
    fn record_count(&self) -> Result<usize>;

    /// Apply every write in `batch`, or none of them.
    fn apply(&self, batch: &WriteBatch) -> Result<()>;
}

/// Single-write conveniences on top of [`RecordStore::apply`].
pub trait RecordStoreExt: RecordStore {
    fn put_record(&self, node: Node, record: NameRecord) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.put_record(node, record);
        self.apply(&batch)
    }

    fn remove_record(&self, node: Node) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.remove_record(node);
        self.apply(&batch)
    }

    fn put_name(&self, node: Node, name: DnsName) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.put_name(node, name);
        self.apply(&batch)
    }

    fn set_approval_for_all(&self, owner: Principal, operator: Principal, approved: bool) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.set_approval(owner, operator, approved);
        self.apply(&batch)
    }
}

impl<S: RecordStore + ?Sized> RecordStoreExt for S {}
