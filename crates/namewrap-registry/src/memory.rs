//! In-memory registry and registrar for testing.
//!
//! Both enforce the same owner-or-approved rules a real deployment would, so
//! the wrapper's authority checks are exercised end to end.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use namewrap_core::{Clock, LabelHash, Node, Principal, Timestamp};

use crate::error::{RegistryError, Result};
use crate::traits::{Registrar, Registry};

fn poisoned<E: std::fmt::Display>(e: E) -> RegistryError {
    RegistryError::Poisoned(e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// One raw registry entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryRecord {
    pub owner: Principal,
    pub resolver: Principal,
    pub ttl: u64,
}

#[derive(Default)]
struct RegistryInner {
    records: HashMap<Node, RegistryRecord>,
    approvals: HashSet<(Principal, Principal)>,
}

impl RegistryInner {
    fn owner(&self, node: &Node) -> Principal {
        self.records.get(node).map(|r| r.owner).unwrap_or(Principal::ZERO)
    }

    fn authorise(&self, sender: &Principal, node: &Node) -> Result<()> {
        let owner = self.owner(node);
        if owner == *sender || self.approvals.contains(&(owner, *sender)) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorised(format!(
                "{} does not control {}",
                sender, node
            )))
        }
    }
}

/// In-memory raw registry.
pub struct MemoryRegistry {
    inner: RwLock<RegistryInner>,
}

impl MemoryRegistry {
    /// Create a registry whose root node is owned by `root_owner`.
    pub fn new(root_owner: Principal) -> Self {
        let mut inner = RegistryInner::default();
        inner.records.insert(
            Node::ROOT,
            RegistryRecord {
                owner: root_owner,
                ..Default::default()
            },
        );
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Full entry for a node, if one was ever written.
    pub fn record(&self, node: &Node) -> Result<Option<RegistryRecord>> {
        Ok(self.read()?.records.get(node).copied())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RegistryInner>> {
        self.inner.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RegistryInner>> {
        self.inner.write().map_err(poisoned)
    }
}

impl Registry for MemoryRegistry {
    fn owner(&self, node: &Node) -> Result<Principal> {
        Ok(self.read()?.owner(node))
    }

    fn resolver(&self, node: &Node) -> Result<Principal> {
        Ok(self.read()?.records.get(node).map(|r| r.resolver).unwrap_or_default())
    }

    fn ttl(&self, node: &Node) -> Result<u64> {
        Ok(self.read()?.records.get(node).map(|r| r.ttl).unwrap_or(0))
    }

    fn set_owner(&self, sender: &Principal, node: &Node, owner: Principal) -> Result<()> {
        let mut inner = self.write()?;
        inner.authorise(sender, node)?;
        inner.records.entry(*node).or_default().owner = owner;
        Ok(())
    }

    fn set_subnode_owner(
        &self,
        sender: &Principal,
        parent: &Node,
        label: &LabelHash,
        owner: Principal,
    ) -> Result<Node> {
        let mut inner = self.write()?;
        inner.authorise(sender, parent)?;
        let node = parent.child(label);
        inner.records.entry(node).or_default().owner = owner;
        Ok(node)
    }

    fn set_subnode_record(
        &self,
        sender: &Principal,
        parent: &Node,
        label: &LabelHash,
        owner: Principal,
        resolver: Principal,
        ttl: u64,
    ) -> Result<Node> {
        let mut inner = self.write()?;
        inner.authorise(sender, parent)?;
        let node = parent.child(label);
        inner.records.insert(node, RegistryRecord { owner, resolver, ttl });
        Ok(node)
    }

    fn set_resolver(&self, sender: &Principal, node: &Node, resolver: Principal) -> Result<()> {
        let mut inner = self.write()?;
        inner.authorise(sender, node)?;
        inner.records.entry(*node).or_default().resolver = resolver;
        Ok(())
    }

    fn set_ttl(&self, sender: &Principal, node: &Node, ttl: u64) -> Result<()> {
        let mut inner = self.write()?;
        inner.authorise(sender, node)?;
        inner.records.entry(*node).or_default().ttl = ttl;
        Ok(())
    }

    fn set_record(
        &self,
        sender: &Principal,
        node: &Node,
        owner: Principal,
        resolver: Principal,
        ttl: u64,
    ) -> Result<()> {
        let mut inner = self.write()?;
        inner.authorise(sender, node)?;
        inner.records.insert(*node, RegistryRecord { owner, resolver, ttl });
        Ok(())
    }

    fn set_approval_for_all(&self, sender: &Principal, operator: Principal, approved: bool) -> Result<()> {
        let mut inner = self.write()?;
        if approved {
            inner.approvals.insert((*sender, operator));
        } else {
            inner.approvals.remove(&(*sender, operator));
        }
        Ok(())
    }

    fn is_approved_for_all(&self, owner: &Principal, operator: &Principal) -> Result<bool> {
        Ok(self.read()?.approvals.contains(&(*owner, *operator)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registrar
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Asset {
    owner: Principal,
    expires: Timestamp,
}

#[derive(Default)]
struct RegistrarInner {
    assets: HashMap<LabelHash, Asset>,
    approvals: HashSet<(Principal, Principal)>,
    controllers: HashSet<Principal>,
}

impl RegistrarInner {
    /// Live asset, or `NotRegistered` if unknown or expired.
    fn live(&self, id: &LabelHash, now: Timestamp) -> Result<Asset> {
        match self.assets.get(id) {
            Some(asset) if asset.expires > now => Ok(*asset),
            _ => Err(RegistryError::NotRegistered(*id)),
        }
    }

    fn is_owner_or_approved(&self, asset: &Asset, sender: &Principal) -> bool {
        asset.owner == *sender || self.approvals.contains(&(asset.owner, *sender))
    }

    fn require_controller(&self, sender: &Principal) -> Result<()> {
        if self.controllers.contains(sender) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorised(format!(
                "{} is not a registrar controller",
                sender
            )))
        }
    }
}

/// In-memory leaf registrar.
///
/// Owns `base_node` in the backing registry and keeps the registry entry of
/// each leaf in step with registrations.
pub struct MemoryRegistrar {
    principal: Principal,
    base_node: Node,
    registry: Arc<MemoryRegistry>,
    clock: Arc<dyn Clock>,
    inner: RwLock<RegistrarInner>,
}

impl MemoryRegistrar {
    /// Create a registrar acting as `principal` over `base_node`.
    ///
    /// The registrar must own `base_node` in `registry` before registering.
    pub fn new(
        principal: Principal,
        base_node: Node,
        registry: Arc<MemoryRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            principal,
            base_node,
            registry,
            clock,
            inner: RwLock::new(RegistrarInner::default()),
        }
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    pub fn base_node(&self) -> Node {
        self.base_node
    }

    /// Allow `controller` to register and renew.
    pub fn add_controller(&self, controller: Principal) -> Result<()> {
        self.write()?.controllers.insert(controller);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RegistrarInner>> {
        self.inner.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RegistrarInner>> {
        self.inner.write().map_err(poisoned)
    }
}

impl Registrar for MemoryRegistrar {
    fn owner_of(&self, id: &LabelHash) -> Result<Principal> {
        let now = self.clock.now();
        Ok(self.read()?.live(id, now)?.owner)
    }

    fn name_expires(&self, id: &LabelHash) -> Result<Timestamp> {
        Ok(self.read()?.assets.get(id).map(|a| a.expires).unwrap_or(0))
    }

    fn transfer_from(&self, sender: &Principal, from: &Principal, to: Principal, id: &LabelHash) -> Result<()> {
        let now = self.clock.now();
        let mut inner = self.write()?;
        let asset = inner.live(id, now)?;
        if asset.owner != *from || !inner.is_owner_or_approved(&asset, sender) {
            return Err(RegistryError::Unauthorised(format!(
                "{} cannot transfer {:?} from {}",
                sender, id, from
            )));
        }
        inner.assets.insert(*id, Asset { owner: to, ..asset });
        Ok(())
    }

    fn reclaim(&self, sender: &Principal, id: &LabelHash, owner: Principal) -> Result<()> {
        let now = self.clock.now();
        {
            let inner = self.read()?;
            let asset = inner.live(id, now)?;
            if !inner.is_owner_or_approved(&asset, sender) {
                return Err(RegistryError::Unauthorised(format!(
                    "{} cannot reclaim {:?}",
                    sender, id
                )));
            }
        }
        self.registry
            .set_subnode_owner(&self.principal, &self.base_node, id, owner)?;
        Ok(())
    }

    fn register(&self, sender: &Principal, id: &LabelHash, owner: Principal, duration: u64) -> Result<Timestamp> {
        let now = self.clock.now();
        let expires = {
            let mut inner = self.write()?;
            inner.require_controller(sender)?;
            if inner.live(id, now).is_ok() {
                return Err(RegistryError::NotAvailable(*id));
            }
            let expires = now.saturating_add(duration);
            inner.assets.insert(*id, Asset { owner, expires });
            expires
        };
        self.registry
            .set_subnode_owner(&self.principal, &self.base_node, id, owner)?;
        tracing::debug!(?id, %owner, expires, "registered leaf");
        Ok(expires)
    }

    fn renew(&self, sender: &Principal, id: &LabelHash, duration: u64) -> Result<Timestamp> {
        let now = self.clock.now();
        let mut inner = self.write()?;
        inner.require_controller(sender)?;
        let asset = inner.live(id, now)?;
        let expires = asset.expires.saturating_add(duration);
        inner.assets.insert(*id, Asset { expires, ..asset });
        Ok(expires)
    }

    fn set_approval_for_all(&self, sender: &Principal, operator: Principal, approved: bool) -> Result<()> {
        let mut inner = self.write()?;
        if approved {
            inner.approvals.insert((*sender, operator));
        } else {
            inner.approvals.remove(&(*sender, operator));
        }
        Ok(())
    }

    fn is_approved_for_all(&self, owner: &Principal, operator: &Principal) -> Result<bool> {
        Ok(self.read()?.approvals.contains(&(*owner, *operator)))
    }
}
