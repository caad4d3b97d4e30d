//! The NameWrapper: wrap/unwrap state machine over the raw registry.
//!
//! Every mutating operation follows the same shape:
//!
//! 1. run every check against the current records,
//! 2. stage the record-store writes and events,
//! 3. make the collaborator calls,
//! 4. apply the staged writes in one batch,
//! 5. deliver the events.
//!
//! Mutations take `&mut self`, so operations are totally ordered and an
//! event sink can never observe or re-enter a half-applied transition.

use std::collections::HashSet;
use std::sync::Arc;

use namewrap_core::{Clock, DnsName, Label, LabelHash, Node, Principal, Timestamp};
use namewrap_perms::{
    can_create_or_replace_subnode, check_subnode_expiry, normalise_expiry, ChildFuseAuthority,
    Fuses, NameRecord,
};
use namewrap_registry::{MetadataService, Registrar, Registry, StaticMetadata};
use namewrap_store::{RecordStore, WriteBatch};

use crate::config::WrapperConfig;
use crate::error::{Result, WrapperError};
use crate::events::{EventSink, NullSink, WrapperEvent};
use crate::transfer::RegistrationInstructions;

/// Owner actions gated together by [`NameWrapper::set_record`].
const SET_RECORD_FUSES: Fuses = Fuses::CANNOT_TRANSFER
    .union(Fuses::CANNOT_SET_RESOLVER)
    .union(Fuses::CANNOT_SET_TTL);

/// Writes and events collected by one operation before commit.
#[derive(Default)]
struct Staged {
    batch: WriteBatch,
    events: Vec<WrapperEvent>,
}

/// Raw registry entry applied when a subnode is claimed.
#[derive(Debug, Clone, Copy)]
struct SubnodeRecord {
    resolver: Principal,
    ttl: u64,
}

/// The name wrapper.
///
/// Holds wrapped records in `S`, and drives the raw registry `R` and leaf
/// registrar `B` as its own configured principal.
pub struct NameWrapper<S: RecordStore, R: Registry, B: Registrar> {
    config: WrapperConfig,
    store: Arc<S>,
    registry: Arc<R>,
    registrar: Arc<B>,
    clock: Arc<dyn Clock>,
    metadata: Box<dyn MetadataService>,
    sink: Arc<dyn EventSink>,
    controllers: HashSet<Principal>,
    suffix_name: DnsName,
    suffix_node: Node,
}

impl<S: RecordStore, R: Registry, B: Registrar> NameWrapper<S, R, B> {
    /// Create a wrapper. Fails if the configured suffix is not a valid name.
    pub fn new(
        config: WrapperConfig,
        store: Arc<S>,
        registry: Arc<R>,
        registrar: Arc<B>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let suffix_name = DnsName::parse(&config.suffix)?;
        let suffix_node = suffix_name.node();
        let controllers = config.controllers.iter().copied().collect();
        Ok(Self {
            config,
            store,
            registry,
            registrar,
            clock,
            metadata: Box::new(StaticMetadata::new("namewrap://metadata")),
            sink: Arc::new(NullSink),
            controllers,
            suffix_name,
            suffix_node,
        })
    }

    /// Deliver events to `sink` instead of discarding them.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Node of the registrar suffix.
    pub fn suffix_node(&self) -> Node {
        self.suffix_node
    }

    fn wrapper(&self) -> Principal {
        self.config.wrapper
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Wrap / Unwrap
    // ─────────────────────────────────────────────────────────────────────────

    /// Wrap a name that is not a registrar leaf.
    ///
    /// The caller must own the raw registry entry or be approved for it in
    /// the registry. The record starts with expiry 0, so restricting fuses
    /// stay inert until a parent extends it.
    pub fn wrap(
        &mut self,
        caller: &Principal,
        name: &DnsName,
        owner: Principal,
        fuses: Fuses,
        resolver: Option<Principal>,
    ) -> Result<Node> {
        if name.is_root() {
            return Err(WrapperError::IncompatibleName("cannot wrap the root".into()));
        }
        let parent = name.parent_node();
        if parent == self.suffix_node {
            return Err(WrapperError::IncompatibleParent(parent));
        }
        if fuses.contains(Fuses::PARENT_CANNOT_CONTROL) {
            return Err(WrapperError::Unauthorised(
                "PARENT_CANNOT_CONTROL can only be burned by the parent".into(),
            ));
        }

        let node = name.node();
        let raw_owner = self.registry.owner(&node)?;
        if raw_owner != *caller && !self.registry.is_approved_for_all(&raw_owner, caller)? {
            tracing::warn!(%node, %caller, "wrap refused: caller does not control registry entry");
            return Err(WrapperError::Unauthorised(format!(
                "{} does not control {} in the registry",
                caller, name
            )));
        }

        let mut staged = Staged::default();
        self.stage_wrap(&mut staged, node, name.clone(), owner, fuses, 0)?;

        let wrapper = self.wrapper();
        self.registry.set_owner(&wrapper, &node, wrapper)?;
        if let Some(resolver) = resolver {
            self.registry.set_resolver(&wrapper, &node, resolver)?;
        }

        self.commit(staged)?;
        tracing::debug!(%node, %name, %owner, ?fuses, "wrapped");
        Ok(node)
    }

    /// Wrap a registrar leaf held by `caller` (or an operator it approved in
    /// the registrar). Returns the record's expiry.
    ///
    /// `PARENT_CANNOT_CONTROL` is always burned and the expiry is clamped
    /// to the registration's.
    pub fn wrap_leaf(
        &mut self,
        caller: &Principal,
        label: &Label,
        owner: Principal,
        fuses: Fuses,
        expiry: Timestamp,
        resolver: Option<Principal>,
    ) -> Result<Timestamp> {
        let id = label.hash();
        let registrant = self.registrar.owner_of(&id)?;
        if registrant != *caller && !self.registrar.is_approved_for_all(&registrant, caller)? {
            tracing::warn!(%caller, %label, "leaf wrap refused: caller does not hold registration");
            return Err(WrapperError::Unauthorised(format!(
                "{} does not hold the registration for {}",
                caller, label
            )));
        }

        let mut staged = Staged::default();
        let (node, expiry) = self.stage_leaf_wrap(&mut staged, label, owner, fuses, expiry)?;

        let wrapper = self.wrapper();
        self.registrar.transfer_from(&wrapper, &registrant, wrapper, &id)?;
        self.registrar.reclaim(&wrapper, &id, wrapper)?;
        if let Some(resolver) = resolver {
            self.registry.set_resolver(&wrapper, &node, resolver)?;
        }

        self.commit(staged)?;
        tracing::debug!(%node, %label, %owner, expiry, "wrapped leaf");
        Ok(expiry)
    }

    /// Unwrap a non-leaf name, handing the raw registry entry to
    /// `new_raw_owner`.
    pub fn unwrap(
        &mut self,
        caller: &Principal,
        parent_node: &Node,
        label_hash: &LabelHash,
        new_raw_owner: Principal,
    ) -> Result<()> {
        if *parent_node == self.suffix_node {
            return Err(WrapperError::IncompatibleParent(*parent_node));
        }
        let node = parent_node.child(label_hash);

        let mut staged = Staged::default();
        self.stage_unwrap(&mut staged, caller, &node, new_raw_owner)?;

        self.registry.set_owner(&self.wrapper(), &node, new_raw_owner)?;

        self.commit(staged)?;
        tracing::debug!(%node, owner = %new_raw_owner, "unwrapped");
        Ok(())
    }

    /// Unwrap a registrar leaf. The registration asset goes to
    /// `new_registrant` and the raw registry entry to `new_raw_owner`.
    pub fn unwrap_leaf(
        &mut self,
        caller: &Principal,
        label_hash: &LabelHash,
        new_registrant: Principal,
        new_raw_owner: Principal,
    ) -> Result<()> {
        let node = self.suffix_node.child(label_hash);

        let mut staged = Staged::default();
        self.stage_unwrap(&mut staged, caller, &node, new_raw_owner)?;
        self.check_target(new_registrant)?;
        // Fails for a lapsed registration before anything is handed over.
        self.registrar.owner_of(label_hash)?;

        let wrapper = self.wrapper();
        self.registry.set_owner(&wrapper, &node, new_raw_owner)?;
        self.registrar
            .transfer_from(&wrapper, &wrapper, new_registrant, label_hash)?;

        self.commit(staged)?;
        tracing::debug!(%node, registrant = %new_registrant, owner = %new_raw_owner, "unwrapped leaf");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fuses
    // ─────────────────────────────────────────────────────────────────────────

    /// Burn fuses on a record the caller controls. Returns the merged fuses.
    pub fn set_fuses(
        &mut self,
        caller: &Principal,
        parent_node: &Node,
        label_hash: &LabelHash,
        requested: Fuses,
    ) -> Result<Fuses> {
        let node = parent_node.child(label_hash);
        let record = self.authorise(&node, caller)?;

        let parent_max = if *parent_node == self.suffix_node {
            self.registrar.name_expires(label_hash)?
        } else {
            // An unwrapped parent imposes no ceiling.
            self.store
                .get_record(parent_node)?
                .map(|parent| parent.expiry())
                .unwrap_or(record.expiry())
        };

        let updated =
            namewrap_perms::set_fuses(&node, &record, requested, parent_max, self.now())?;

        let mut staged = Staged::default();
        self.stage_fuses(&mut staged, node, updated);
        self.commit(staged)?;
        Ok(updated.fuses())
    }

    /// Burn fuses on a child and extend its expiry up to the parent's.
    ///
    /// Under the suffix the child's own owner acts and the registrar's
    /// expiry is the ceiling. Elsewhere the parent's owner acts and the
    /// parent's expiry is the ceiling.
    pub fn set_child_fuses(
        &mut self,
        caller: &Principal,
        parent_node: &Node,
        label_hash: &LabelHash,
        requested: Fuses,
        requested_expiry: Timestamp,
    ) -> Result<Fuses> {
        let node = parent_node.child(label_hash);

        let (authority, ceiling, child) = if *parent_node == self.suffix_node {
            let child = self.authorise(&node, caller)?;
            let ceiling = self.registrar.name_expires(label_hash)?;
            (ChildFuseAuthority::Registrant, ceiling, child)
        } else {
            let parent = self.authorise(parent_node, caller)?;
            let child = self
                .store
                .get_record(&node)?
                .ok_or(WrapperError::NotFound(node))?;
            (ChildFuseAuthority::Parent, parent.expiry(), child)
        };

        let updated = namewrap_perms::set_child_fuses(
            &node,
            &child,
            authority,
            requested,
            requested_expiry,
            ceiling,
        )?;

        let mut staged = Staged::default();
        self.stage_fuses(&mut staged, node, updated);
        self.commit(staged)?;
        Ok(updated.fuses())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Subnodes
    // ─────────────────────────────────────────────────────────────────────────

    /// Create or replace a wrapped subnode of a name the caller controls.
    pub fn set_subnode_owner(
        &mut self,
        caller: &Principal,
        parent_node: &Node,
        label: &Label,
        owner: Principal,
        fuses: Fuses,
        expiry: Timestamp,
    ) -> Result<Node> {
        self.create_subnode(caller, parent_node, label, owner, fuses, expiry, None)
    }

    /// As [`set_subnode_owner`](Self::set_subnode_owner), also setting the
    /// raw registry resolver and TTL.
    #[allow(clippy::too_many_arguments)]
    pub fn set_subnode_record(
        &mut self,
        caller: &Principal,
        parent_node: &Node,
        label: &Label,
        owner: Principal,
        resolver: Principal,
        ttl: u64,
        fuses: Fuses,
        expiry: Timestamp,
    ) -> Result<Node> {
        self.create_subnode(
            caller,
            parent_node,
            label,
            owner,
            fuses,
            expiry,
            Some(SubnodeRecord { resolver, ttl }),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn create_subnode(
        &mut self,
        caller: &Principal,
        parent_node: &Node,
        label: &Label,
        owner: Principal,
        fuses: Fuses,
        expiry: Timestamp,
        raw_record: Option<SubnodeRecord>,
    ) -> Result<Node> {
        // Leaves under the suffix come from the registrar, never from here.
        if *parent_node == self.suffix_node {
            return Err(WrapperError::IncompatibleParent(*parent_node));
        }
        let parent = self.authorise(parent_node, caller)?;
        let label_hash = label.hash();
        let node = parent_node.child(&label_hash);

        let raw_owner = self.registry.owner(&node)?;
        let subnode = self.store.get_record(&node)?;
        if !can_create_or_replace_subnode(&parent, subnode.as_ref(), !raw_owner.is_zero(), self.now())
        {
            tracing::warn!(%node, %caller, "subnode creation refused");
            return Err(WrapperError::OperationProhibited(format!(
                "cannot create or replace subnode {} of {}",
                label, parent_node
            )));
        }

        let existing_expiry = subnode.map(|s| s.expiry()).unwrap_or(0);
        let expiry = check_subnode_expiry(expiry, existing_expiry, parent.expiry())?;
        self.check_target(owner)?;

        let wrapper = self.wrapper();
        let mut staged = Staged::default();

        match subnode {
            Some(current) if raw_owner == wrapper => {
                let updated = current.with_owner(owner).burn(fuses, expiry)?;

                staged.batch.put_record(node, updated);
                if current.owner() != owner {
                    staged.events.push(WrapperEvent::Transferred {
                        node,
                        from: current.owner(),
                        to: owner,
                    });
                }
                staged.events.push(WrapperEvent::FusesSet {
                    node,
                    fuses: updated.fuses(),
                    expiry: updated.expiry(),
                });

                if let Some(raw) = raw_record {
                    self.registry
                        .set_subnode_record(&wrapper, parent_node, &label_hash, wrapper, raw.resolver, raw.ttl)?;
                }
            }
            _ => {
                let parent_name = self
                    .store
                    .get_name(parent_node)?
                    .ok_or(WrapperError::NotFound(*parent_node))?;
                let name = parent_name.child(label.clone());
                self.stage_wrap(&mut staged, node, name, owner, fuses, expiry)?;

                match raw_record {
                    Some(raw) => {
                        self.registry.set_subnode_record(
                            &wrapper,
                            parent_node,
                            &label_hash,
                            wrapper,
                            raw.resolver,
                            raw.ttl,
                        )?;
                    }
                    None => {
                        self.registry
                            .set_subnode_owner(&wrapper, parent_node, &label_hash, wrapper)?;
                    }
                }
            }
        }

        self.commit(staged)?;
        tracing::debug!(%node, parent = %parent_node, %owner, "subnode set");
        Ok(node)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Register `label` with the registrar and wrap it for `owner`.
    /// Controllers only. Returns the registration expiry.
    pub fn register_and_wrap(
        &mut self,
        caller: &Principal,
        label: &Label,
        owner: Principal,
        duration: u64,
        resolver: Option<Principal>,
        fuses: Fuses,
    ) -> Result<Timestamp> {
        self.require_controller(caller)?;
        self.check_target(owner)?;
        // Validate fuses before the registrar commits to anything.
        NameRecord::new(owner, fuses | Fuses::PARENT_CANNOT_CONTROL, 0)?;

        let wrapper = self.wrapper();
        let id = label.hash();
        let registered = self.registrar.register(&wrapper, &id, wrapper, duration)?;

        let mut staged = Staged::default();
        let (node, expiry) = self.stage_leaf_wrap(&mut staged, label, owner, fuses, registered)?;

        if let Some(resolver) = resolver {
            self.registry.set_resolver(&wrapper, &node, resolver)?;
        }

        self.commit(staged)?;
        tracing::debug!(%node, %label, %owner, expiry, "registered and wrapped");
        Ok(expiry)
    }

    /// Renew a registration. Controllers only. A wrapped leaf's expiry
    /// follows the registrar's while the wrapper holds the registration; a
    /// stale record left from a lapsed wrap is not extended.
    pub fn renew(&mut self, caller: &Principal, label_hash: &LabelHash, duration: u64) -> Result<Timestamp> {
        self.require_controller(caller)?;

        let wrapper = self.wrapper();
        let expiry = self.registrar.renew(&wrapper, label_hash, duration)?;

        let node = self.suffix_node.child(label_hash);
        let mut staged = Staged::default();
        let held = self.registrar.owner_of(label_hash)? == wrapper;
        if let Some(record) = self.store.get_record(&node)?.filter(|_| held) {
            let extended = NameRecord::new(record.owner(), record.fuses(), expiry)?;
            staged.batch.put_record(node, extended);
            staged.events.push(WrapperEvent::ExpiryExtended { node, expiry });
        }

        self.commit(staged)?;
        tracing::debug!(%node, expiry, "renewed");
        Ok(expiry)
    }

    /// Accept a registrar asset transferred to the wrapper together with
    /// CBOR-encoded [`RegistrationInstructions`], and wrap it.
    pub fn on_registration_received(
        &mut self,
        sender: &Principal,
        from: &Principal,
        asset_id: &LabelHash,
        payload: &[u8],
    ) -> Result<Node> {
        if *sender != self.config.registrar {
            tracing::warn!(%sender, "inbound asset from untrusted sender");
            return Err(WrapperError::IncorrectAssetType(*sender));
        }

        let wrapper = self.wrapper();
        if self.registrar.owner_of(asset_id)? != wrapper {
            return Err(WrapperError::Unauthorised(format!(
                "asset {:?} has not been transferred to the wrapper",
                asset_id
            )));
        }
        // An asset the wrapper already wraps has not newly arrived.
        let node = self.suffix_node.child(asset_id);
        if self.store.get_record(&node)?.is_some() && self.registry.owner(&node)? == wrapper {
            tracing::warn!(%node, %from, "inbound transfer for an already wrapped leaf");
            return Err(WrapperError::Unauthorised(format!(
                "{} is already wrapped",
                node
            )));
        }

        let instructions = RegistrationInstructions::decode(payload)?;
        let label = Label::parse(&instructions.label)?;
        if label.hash() != *asset_id {
            return Err(WrapperError::LabelMismatch {
                expected: *asset_id,
                found: label.hash(),
            });
        }

        let mut staged = Staged::default();
        let (node, expiry) = self.stage_leaf_wrap(
            &mut staged,
            &label,
            instructions.owner,
            instructions.fuses,
            instructions.expiry,
        )?;

        self.registrar.reclaim(&wrapper, asset_id, wrapper)?;
        if let Some(resolver) = instructions.resolver {
            self.registry.set_resolver(&wrapper, &node, resolver)?;
        }

        self.commit(staged)?;
        tracing::debug!(%node, %label, %from, expiry, "wrapped inbound registration");
        Ok(node)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Record Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Move the wrapped owner and set resolver and TTL in one call.
    pub fn set_record(
        &mut self,
        caller: &Principal,
        node: &Node,
        owner: Principal,
        resolver: Principal,
        ttl: u64,
    ) -> Result<()> {
        let record = self.authorise(node, caller)?;
        self.require_allowed(node, &record, SET_RECORD_FUSES)?;
        self.check_target(owner)?;

        let wrapper = self.wrapper();
        self.registry.set_record(&wrapper, node, wrapper, resolver, ttl)?;

        let mut staged = Staged::default();
        if record.owner() != owner {
            staged.batch.put_record(*node, record.with_owner(owner));
            staged.events.push(WrapperEvent::Transferred {
                node: *node,
                from: record.owner(),
                to: owner,
            });
        }
        self.commit(staged)
    }

    pub fn set_resolver(&mut self, caller: &Principal, node: &Node, resolver: Principal) -> Result<()> {
        let record = self.authorise(node, caller)?;
        self.require_allowed(node, &record, Fuses::CANNOT_SET_RESOLVER)?;
        self.registry.set_resolver(&self.wrapper(), node, resolver)?;
        Ok(())
    }

    pub fn set_ttl(&mut self, caller: &Principal, node: &Node, ttl: u64) -> Result<()> {
        let record = self.authorise(node, caller)?;
        self.require_allowed(node, &record, Fuses::CANNOT_SET_TTL)?;
        self.registry.set_ttl(&self.wrapper(), node, ttl)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ownership and Approvals
    // ─────────────────────────────────────────────────────────────────────────

    /// Transfer a wrapped record. Blocked by an active `CANNOT_TRANSFER`.
    pub fn safe_transfer_from(
        &mut self,
        caller: &Principal,
        from: &Principal,
        to: Principal,
        node: &Node,
    ) -> Result<()> {
        let record = self
            .store
            .get_record(node)?
            .ok_or(WrapperError::NotFound(*node))?;
        if record.owner() != *from {
            return Err(WrapperError::Unauthorised(format!(
                "{} does not own {}",
                from, node
            )));
        }
        if caller != from && !self.store.is_approved_for_all(from, caller)? {
            tracing::warn!(%node, %caller, "transfer refused");
            return Err(WrapperError::Unauthorised(format!(
                "{} may not transfer for {}",
                caller, from
            )));
        }
        self.check_target(to)?;
        self.require_allowed(node, &record, Fuses::CANNOT_TRANSFER)?;

        let mut staged = Staged::default();
        staged.batch.put_record(*node, record.with_owner(to));
        staged.events.push(WrapperEvent::Transferred {
            node: *node,
            from: *from,
            to,
        });
        self.commit(staged)
    }

    /// Let `operator` act on every record `caller` owns.
    pub fn set_approval_for_all(&mut self, caller: &Principal, operator: Principal, approved: bool) -> Result<()> {
        if operator == *caller {
            return Err(WrapperError::InvalidTargetOwner(operator));
        }

        let mut staged = Staged::default();
        staged.batch.set_approval(*caller, operator, approved);
        staged.events.push(WrapperEvent::ApprovalForAll {
            owner: *caller,
            operator,
            approved,
        });
        self.commit(staged)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Administration
    // ─────────────────────────────────────────────────────────────────────────

    /// Add or remove a controller. Admin only.
    ///
    /// The allowlist is held in memory and is not written to the record
    /// store; a wrapper rebuilt over the same store starts from
    /// [`WrapperConfig::controllers`].
    pub fn set_controller(&mut self, caller: &Principal, controller: Principal, active: bool) -> Result<()> {
        self.require_admin(caller)?;
        if active {
            self.controllers.insert(controller);
        } else {
            self.controllers.remove(&controller);
        }
        self.commit(Staged {
            batch: WriteBatch::new(),
            events: vec![WrapperEvent::ControllerChanged { controller, active }],
        })
    }

    pub fn is_controller(&self, principal: &Principal) -> bool {
        self.controllers.contains(principal)
    }

    /// Replace the metadata service. Admin only.
    pub fn set_metadata_service(&mut self, caller: &Principal, metadata: Box<dyn MetadataService>) -> Result<()> {
        self.require_admin(caller)?;
        self.metadata = metadata;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Owner, fuses and expiry; all zero when the node is not wrapped.
    pub fn get_data(&self, node: &Node) -> Result<(Principal, Fuses, Timestamp)> {
        Ok(self
            .store
            .get_record(node)?
            .map(|r| (r.owner(), r.fuses(), r.expiry()))
            .unwrap_or((Principal::ZERO, Fuses::empty(), 0)))
    }

    /// Fuses and expiry of a wrapped node; `NotFound` otherwise.
    pub fn read_permissions(&self, node: &Node) -> Result<(Fuses, Timestamp)> {
        let record = self.store.get_record(node)?;
        Ok(namewrap_perms::read_permissions(node, record.as_ref())?)
    }

    /// Whether every fuse in `mask` is burned, regardless of expiry.
    pub fn all_fuses_burned(&self, node: &Node, mask: Fuses) -> Result<bool> {
        Ok(self
            .store
            .get_record(node)?
            .is_some_and(|r| r.all_fuses_burned(mask)))
    }

    pub fn is_owner_or_approved(&self, node: &Node, principal: &Principal) -> Result<bool> {
        match self.store.get_record(node)? {
            Some(record) => self.owner_or_approved(&record, principal),
            None => Ok(false),
        }
    }

    pub fn owner_of(&self, node: &Node) -> Result<Principal> {
        Ok(self.get_data(node)?.0)
    }

    /// Full name stored when the node was wrapped.
    pub fn name_of(&self, node: &Node) -> Result<Option<DnsName>> {
        Ok(self.store.get_name(node)?)
    }

    /// Whether the node has a record and the wrapper holds its registry entry.
    pub fn is_wrapped(&self, node: &Node) -> Result<bool> {
        Ok(self.store.get_record(node)?.is_some() && self.registry.owner(node)? == self.wrapper())
    }

    pub fn uri(&self, node: &Node) -> String {
        self.metadata.uri(node)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn owner_or_approved(&self, record: &NameRecord, principal: &Principal) -> Result<bool> {
        Ok(record.owner() == *principal
            || self.store.is_approved_for_all(&record.owner(), principal)?)
    }

    /// The node's record, if `caller` may modify it.
    fn authorise(&self, node: &Node, caller: &Principal) -> Result<NameRecord> {
        if let Some(record) = self.store.get_record(node)? {
            if self.owner_or_approved(&record, caller)? {
                return Ok(record);
            }
        }
        tracing::warn!(%node, %caller, "caller is not owner or approved");
        Err(WrapperError::Unauthorised(format!(
            "{} cannot modify {}",
            caller, node
        )))
    }

    fn require_allowed(&self, node: &Node, record: &NameRecord, mask: Fuses) -> Result<()> {
        if record.operation_allowed(mask, self.now()) {
            return Ok(());
        }
        Err(WrapperError::OperationProhibited(format!(
            "{:?} burned on {}",
            record.fuses() & mask,
            node
        )))
    }

    fn require_controller(&self, caller: &Principal) -> Result<()> {
        if self.controllers.contains(caller) {
            return Ok(());
        }
        tracing::warn!(%caller, "controller call refused");
        Err(WrapperError::Unauthorised(format!("{} is not a controller", caller)))
    }

    fn require_admin(&self, caller: &Principal) -> Result<()> {
        if *caller == self.config.admin {
            return Ok(());
        }
        tracing::warn!(%caller, "admin call refused");
        Err(WrapperError::Unauthorised(format!("{} is not the admin", caller)))
    }

    /// Reject handing ownership to nobody or to the wrapper itself.
    fn check_target(&self, target: Principal) -> Result<()> {
        if target.is_zero() || target == self.wrapper() {
            return Err(WrapperError::InvalidTargetOwner(target));
        }
        Ok(())
    }

    /// Revoke any live record for `node`. Always step 0 of record creation.
    fn revoke_existing(&self, staged: &mut Staged, node: Node) -> Result<()> {
        if let Some(stale) = self.store.get_record(&node)? {
            tracing::debug!(%node, owner = %stale.owner(), "revoking existing record");
            staged.batch.remove_record(node);
            staged.events.push(WrapperEvent::Unwrapped {
                node,
                owner: Principal::ZERO,
            });
        }
        Ok(())
    }

    fn stage_wrap(
        &self,
        staged: &mut Staged,
        node: Node,
        name: DnsName,
        owner: Principal,
        fuses: Fuses,
        expiry: Timestamp,
    ) -> Result<NameRecord> {
        self.check_target(owner)?;
        let record = NameRecord::new(owner, fuses, expiry)?;

        self.revoke_existing(staged, node)?;
        staged
            .batch
            .put_record(node, record)
            .put_name(node, name.clone());
        staged.events.push(WrapperEvent::Wrapped {
            node,
            name,
            owner,
            fuses,
            expiry,
        });
        Ok(record)
    }

    fn stage_leaf_wrap(
        &self,
        staged: &mut Staged,
        label: &Label,
        owner: Principal,
        fuses: Fuses,
        requested_expiry: Timestamp,
    ) -> Result<(Node, Timestamp)> {
        let id = label.hash();
        let node = self.suffix_node.child(&id);
        let ceiling = self.registrar.name_expires(&id)?;
        let existing = self
            .store
            .get_record(&node)?
            .map(|r| r.expiry())
            .unwrap_or(0);
        let expiry = normalise_expiry(requested_expiry, existing, ceiling);

        let name = self.suffix_name.child(label.clone());
        self.stage_wrap(
            staged,
            node,
            name,
            owner,
            fuses | Fuses::PARENT_CANNOT_CONTROL,
            expiry,
        )?;
        Ok((node, expiry))
    }

    fn stage_unwrap(
        &self,
        staged: &mut Staged,
        caller: &Principal,
        node: &Node,
        new_raw_owner: Principal,
    ) -> Result<()> {
        let record = self
            .store
            .get_record(node)?
            .ok_or(WrapperError::NotFound(*node))?;
        if record.all_fuses_burned(Fuses::CANNOT_UNWRAP) {
            return Err(WrapperError::OperationProhibited(format!(
                "CANNOT_UNWRAP burned on {}",
                node
            )));
        }
        if !self.owner_or_approved(&record, caller)? {
            tracing::warn!(%node, %caller, "unwrap refused");
            return Err(WrapperError::Unauthorised(format!(
                "{} cannot unwrap {}",
                caller, node
            )));
        }
        self.check_target(new_raw_owner)?;

        staged.batch.remove_record(*node);
        staged.events.push(WrapperEvent::Unwrapped {
            node: *node,
            owner: new_raw_owner,
        });
        Ok(())
    }

    fn stage_fuses(&self, staged: &mut Staged, node: Node, updated: NameRecord) {
        staged.batch.put_record(node, updated);
        staged.events.push(WrapperEvent::FusesSet {
            node,
            fuses: updated.fuses(),
            expiry: updated.expiry(),
        });
    }

    /// Apply staged writes, then deliver staged events.
    fn commit(&self, staged: Staged) -> Result<()> {
        self.store.apply(&staged.batch)?;
        for event in &staged.events {
            self.sink.deliver(event);
        }
        Ok(())
    }
}
