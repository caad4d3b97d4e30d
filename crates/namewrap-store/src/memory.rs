//! In-memory implementation of the RecordStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use namewrap_core::{DnsName, Node, Principal};
use namewrap_perms::NameRecord;

use crate::error::{Result, StoreError};
use crate::traits::{RecordStore, StoreWrite, WriteBatch};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; a
/// batch is applied under a single write lock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records indexed by node.
    records: HashMap<Node, NameRecord>,

    /// Names indexed by node. Kept after unwrap for reverse lookup.
    names: HashMap<Node, DnsName>,

    /// (owner, operator) pairs with blanket approval.
    approvals: HashSet<(Principal, Principal)>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn get_record(&self, node: &Node) -> Result<Option<NameRecord>> {
        Ok(self.read()?.records.get(node).copied())
    }

    fn get_name(&self, node: &Node) -> Result<Option<DnsName>> {
        Ok(self.read()?.names.get(node).cloned())
    }

    fn is_approved_for_all(&self, owner: &Principal, operator: &Principal) -> Result<bool> {
        Ok(self.read()?.approvals.contains(&(*owner, *operator)))
    }

    fn record_count(&self) -> Result<usize> {
        Ok(self.read()?.records.len())
    }

    fn apply(&self, batch: &WriteBatch) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;

        for write in batch.writes() {
            match write {
                StoreWrite::PutRecord { node, record } => {
                    inner.records.insert(*node, *record);
                }
                StoreWrite::RemoveRecord { node } => {
                    inner.records.remove(node);
                }
                StoreWrite::PutName { node, name } => {
                    inner.names.insert(*node, name.clone());
                }
                StoreWrite::SetApproval {
                    owner,
                    operator,
                    approved,
                } => {
                    if *approved {
                        inner.approvals.insert((*owner, *operator));
                    } else {
                        inner.approvals.remove(&(*owner, *operator));
                    }
                }
            }
        }

        Ok(())
    }
}
