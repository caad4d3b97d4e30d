//! Collaborator traits consumed by the wrapper.
//!
//! Every mutating method takes the acting principal as `sender`, so an
//! implementation can enforce its own owner-or-approved rules. The wrapper
//! always acts as its own configured principal.

use namewrap_core::{LabelHash, Node, Principal, Timestamp};

use crate::error::Result;

/// The raw single-owner registry: owner, resolver and TTL per node.
pub trait Registry: Send + Sync {
    /// Raw owner of a node, [`Principal::ZERO`] if none.
    fn owner(&self, node: &Node) -> Result<Principal>;

    fn resolver(&self, node: &Node) -> Result<Principal>;

    fn ttl(&self, node: &Node) -> Result<u64>;

    fn set_owner(&self, sender: &Principal, node: &Node, owner: Principal) -> Result<()>;

    /// Set the owner of `parent`'s child `label`, returning the child node.
    fn set_subnode_owner(
        &self,
        sender: &Principal,
        parent: &Node,
        label: &LabelHash,
        owner: Principal,
    ) -> Result<Node>;

    fn set_subnode_record(
        &self,
        sender: &Principal,
        parent: &Node,
        label: &LabelHash,
        owner: Principal,
        resolver: Principal,
        ttl: u64,
    ) -> Result<Node>;

    fn set_resolver(&self, sender: &Principal, node: &Node, resolver: Principal) -> Result<()>;

    fn set_ttl(&self, sender: &Principal, node: &Node, ttl: u64) -> Result<()>;

    fn set_record(
        &self,
        sender: &Principal,
        node: &Node,
        owner: Principal,
        resolver: Principal,
        ttl: u64,
    ) -> Result<()>;

    fn set_approval_for_all(&self, sender: &Principal, operator: Principal, approved: bool) -> Result<()>;

    fn is_approved_for_all(&self, owner: &Principal, operator: &Principal) -> Result<bool>;
}

/// The leaf-registration authority for names directly under the suffix.
///
/// Assets are identified by the label hash of the leaf.
pub trait Registrar: Send + Sync {
    /// Current registrant. Fails with `NotRegistered` for unknown or
    /// expired assets.
    fn owner_of(&self, id: &LabelHash) -> Result<Principal>;

    /// Registration expiry, 0 if never registered.
    fn name_expires(&self, id: &LabelHash) -> Result<Timestamp>;

    fn transfer_from(&self, sender: &Principal, from: &Principal, to: Principal, id: &LabelHash) -> Result<()>;

    /// Point the raw registry entry of the leaf at `owner`.
    fn reclaim(&self, sender: &Principal, id: &LabelHash, owner: Principal) -> Result<()>;

    /// Register an available asset for `duration` seconds. Returns the expiry.
    fn register(&self, sender: &Principal, id: &LabelHash, owner: Principal, duration: u64) -> Result<Timestamp>;

    /// Extend a live registration by `duration` seconds. Returns the new expiry.
    fn renew(&self, sender: &Principal, id: &LabelHash, duration: u64) -> Result<Timestamp>;

    fn set_approval_for_all(&self, sender: &Principal, operator: Principal, approved: bool) -> Result<()>;

    fn is_approved_for_all(&self, owner: &Principal, operator: &Principal) -> Result<bool>;
}

/// Descriptive metadata for a node. No state implications.
pub trait MetadataService: Send + Sync {
    fn uri(&self, node: &Node) -> String;
}
