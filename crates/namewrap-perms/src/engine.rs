//! Fuse-setting rules across the parent/child hierarchy.
//!
//! Every function here is pure: it takes the current records and returns the
//! record to write, or the reason the change is refused. Nothing is written
//! on failure.

use namewrap_core::{Node, Timestamp};

use crate::error::{PermsError, Result};
use crate::fuses::Fuses;
use crate::record::NameRecord;

/// Who is asking to burn fuses on a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildFuseAuthority {
    /// The child sits under the registrar's suffix; the caller is the
    /// child's own owner and the ceiling comes from the registrar.
    Registrant,
    /// A generic parent acting on its child.
    Parent,
}

/// Read a record's fuses and expiry.
pub fn read_permissions(node: &Node, record: Option<&NameRecord>) -> Result<(Fuses, Timestamp)> {
    record
        .map(|r| (r.fuses(), r.expiry()))
        .ok_or(PermsError::NotFound(*node))
}

/// Clamp a requested expiry to `[existing, ceiling]`.
///
/// The ceiling wins when the existing expiry already exceeds it, so a
/// child never outlives its parent.
pub fn normalise_expiry(requested: Timestamp, existing: Timestamp, ceiling: Timestamp) -> Timestamp {
    let floor = existing.min(ceiling);
    requested.clamp(floor, ceiling)
}

/// Reject an expiry outside `[existing, ceiling]` instead of clamping it.
///
/// Used by subnode creation, which refuses rather than silently adjusts.
pub fn check_subnode_expiry(
    requested: Timestamp,
    existing: Timestamp,
    ceiling: Timestamp,
) -> Result<Timestamp> {
    if requested < existing || requested > ceiling {
        return Err(PermsError::InvalidExpiry {
            requested,
            min: existing,
            max: ceiling,
        });
    }
    Ok(requested)
}

/// Owner-driven fuse burn on the owner's own record.
///
/// `PARENT_CANNOT_CONTROL` can only be burned by the parent. The expiry is
/// never raised here, only lowered to the parent's ceiling.
pub fn set_fuses(
    node: &Node,
    current: &NameRecord,
    requested: Fuses,
    parent_max_expiry: Timestamp,
    now: Timestamp,
) -> Result<NameRecord> {
    if requested.contains(Fuses::PARENT_CANNOT_CONTROL) {
        return Err(PermsError::Unauthorised(format!(
            "PARENT_CANNOT_CONTROL on {} can only be burned by the parent",
            node
        )));
    }
    if !current.operation_allowed(Fuses::CANNOT_BURN_FUSES, now) {
        return Err(PermsError::OperationProhibited(format!(
            "fuses on {} are locked",
            node
        )));
    }

    let expiry = current.expiry().min(parent_max_expiry);
    current.burn(requested, expiry)
}

/// Burn fuses on a child and optionally extend its expiry up to `ceiling`.
pub fn set_child_fuses(
    node: &Node,
    current: &NameRecord,
    authority: ChildFuseAuthority,
    requested: Fuses,
    requested_expiry: Timestamp,
    ceiling: Timestamp,
) -> Result<NameRecord> {
    if authority == ChildFuseAuthority::Parent
        && current.fuses().contains(Fuses::PARENT_CANNOT_CONTROL)
        && !current.fuses().contains(requested)
    {
        return Err(PermsError::Unauthorised(format!(
            "parent no longer controls {}",
            node
        )));
    }

    let expiry = normalise_expiry(requested_expiry, current.expiry(), ceiling);
    current.burn(requested, expiry)
}

/// Whether a parent may create (no raw owner yet) or replace (raw owner
/// present) the subnode.
///
/// Creation is refused while the parent has an active
/// `CANNOT_CREATE_SUBDOMAIN`. Replacement is refused once the subnode has
/// burned `PARENT_CANNOT_CONTROL`.
pub fn can_create_or_replace_subnode(
    parent: &NameRecord,
    subnode: Option<&NameRecord>,
    subnode_has_raw_owner: bool,
    now: Timestamp,
) -> bool {
    if !subnode_has_raw_owner {
        return parent.operation_allowed(Fuses::CANNOT_CREATE_SUBDOMAIN, now);
    }
    !subnode.is_some_and(|s| s.all_fuses_burned(Fuses::PARENT_CANNOT_CONTROL))
}
