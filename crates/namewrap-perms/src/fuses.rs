//! The fuse flag set.
//!
//! Fuses come in two classes. Structural fuses describe the record's place
//! in the hierarchy and are enforced permanently. Restricting fuses each
//! disable one owner capability and are only enforced while the record has
//! not expired.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PermsError, Result};

bitflags::bitflags! {
    /// Irrevocable permission flags on a wrapped record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Fuses: u32 {
        /// The record can never return to raw registry ownership.
        const CANNOT_UNWRAP = 1;
        /// No further fuses can be burned.
        const CANNOT_BURN_FUSES = 1 << 1;
        /// The wrapped owner cannot transfer the record.
        const CANNOT_TRANSFER = 1 << 2;
        /// The resolver cannot be changed.
        const CANNOT_SET_RESOLVER = 1 << 3;
        /// The TTL cannot be changed.
        const CANNOT_SET_TTL = 1 << 4;
        /// No new subnames can be created.
        const CANNOT_CREATE_SUBDOMAIN = 1 << 5;
        /// The parent can no longer replace or restrict this record.
        const PARENT_CANNOT_CONTROL = 1 << 6;
    }
}

impl Fuses {
    /// No fuses burned.
    pub const CAN_DO_EVERYTHING: Fuses = Fuses::empty();

    /// Fuses that are never time-gated.
    pub const STRUCTURAL: Fuses = Fuses::CANNOT_UNWRAP.union(Fuses::PARENT_CANNOT_CONTROL);

    /// Decode raw bits, rejecting bits outside the known set.
    pub fn from_raw(bits: u32) -> Result<Self> {
        Self::from_bits(bits).ok_or(PermsError::UnknownFuses(bits))
    }

    /// The capability-restricting subset of these fuses.
    pub fn restricting(self) -> Fuses {
        self.difference(Self::STRUCTURAL)
    }

    /// Monotonic merge: fuses once burned stay burned.
    pub fn merge(self, requested: Fuses) -> Fuses {
        self.union(requested)
    }

    /// Whether this set satisfies the validity rule: any restricting fuse
    /// requires [`Fuses::CANNOT_UNWRAP`].
    pub fn is_valid(self) -> bool {
        self.restricting().is_empty() || self.contains(Fuses::CANNOT_UNWRAP)
    }
}

impl Default for Fuses {
    fn default() -> Self {
        Self::CAN_DO_EVERYTHING
    }
}

impl Serialize for Fuses {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Fuses {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Self::from_bits(bits)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid fuse bits: {bits:#x}")))
    }
}
