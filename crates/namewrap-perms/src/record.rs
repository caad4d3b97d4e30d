//! Wrapped name records.
//!
//! A [`NameRecord`] can only be built through [`NameRecord::new`], which
//! enforces fuse validity. Every write path goes through it, so an invalid
//! fuse set can never reach the store.

use serde::{Deserialize, Serialize};

use namewrap_core::{Principal, Timestamp};

use crate::error::{PermsError, Result};
use crate::fuses::Fuses;

/// Owner, fuses and expiry of one wrapped node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", into = "RawRecord")]
pub struct NameRecord {
    owner: Principal,
    fuses: Fuses,
    expiry: Timestamp,
}

impl NameRecord {
    /// Build a record, rejecting fuse sets that burn a restricting fuse
    /// without [`Fuses::CANNOT_UNWRAP`].
    pub fn new(owner: Principal, fuses: Fuses, expiry: Timestamp) -> Result<Self> {
        if !fuses.is_valid() {
            return Err(PermsError::OperationProhibited(format!(
                "fuses {:?} require CANNOT_UNWRAP",
                fuses.restricting()
            )));
        }
        Ok(Self {
            owner,
            fuses,
            expiry,
        })
    }

    pub fn owner(&self) -> Principal {
        self.owner
    }

    pub fn fuses(&self) -> Fuses {
        self.fuses
    }

    pub fn expiry(&self) -> Timestamp {
        self.expiry
    }

    /// Whether restricting fuses are currently enforced.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.expiry > now
    }

    /// Whether an action guarded by `mask` may proceed at `now`.
    ///
    /// Blocked only if a fuse in `mask` is burned and the record has not
    /// yet expired.
    pub fn operation_allowed(&self, mask: Fuses, now: Timestamp) -> bool {
        !(self.fuses.intersects(mask) && self.is_active(now))
    }

    /// Whether every fuse in `mask` is burned, regardless of expiry.
    pub fn all_fuses_burned(&self, mask: Fuses) -> bool {
        self.fuses.contains(mask)
    }

    /// The same record held by a different owner.
    pub fn with_owner(self, owner: Principal) -> Self {
        Self { owner, ..self }
    }

    /// Burn `requested` on top of the existing fuses and set `expiry`.
    pub fn burn(self, requested: Fuses, expiry: Timestamp) -> Result<Self> {
        Self::new(self.owner, self.fuses.merge(requested), expiry)
    }
}

/// Unchecked wire shape; converted through [`NameRecord::new`].
#[derive(Serialize, Deserialize)]
struct RawRecord {
    owner: Principal,
    fuses: Fuses,
    expiry: Timestamp,
}

impl TryFrom<RawRecord> for NameRecord {
    type Error = PermsError;

    fn try_from(raw: RawRecord) -> Result<Self> {
        NameRecord::new(raw.owner, raw.fuses, raw.expiry)
    }
}

impl From<NameRecord> for RawRecord {
    fn from(record: NameRecord) -> Self {
        Self {
            owner: record.owner,
            fuses: record.fuses,
            expiry: record.expiry,
        }
    }
}
