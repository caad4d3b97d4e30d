//! Test fixtures and helpers.
//!
//! [`World`] wires a wrapper to an in-memory registry, registrar, store and
//! manual clock, with the usual approvals already in place.

use std::sync::Arc;

use namewrap::{EventLog, NameWrapper, WrapperConfig, WrapperEvent};
use namewrap_core::{Clock, DnsName, Label, LabelHash, ManualClock, Node, Principal, Timestamp};
use namewrap_perms::Fuses;
use namewrap_registry::{MemoryRegistrar, MemoryRegistry, Registrar, Registry};
use namewrap_store::MemoryStore;

/// Clock reading when a [`World`] is created.
pub const GENESIS: Timestamp = 1_700_000_000;

/// One year in seconds.
pub const YEAR: u64 = 365 * 24 * 60 * 60;

/// A wrapper backed entirely by in-memory collaborators.
pub type MemoryWrapper = NameWrapper<MemoryStore, MemoryRegistry, MemoryRegistrar>;

/// A complete in-memory deployment.
pub struct World {
    pub config: WrapperConfig,
    /// Owner of the registry root.
    pub root: Principal,
    /// Allowed to register and renew through the wrapper.
    pub controller: Principal,
    pub registry: Arc<MemoryRegistry>,
    pub registrar: Arc<MemoryRegistrar>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub events: EventLog,
    pub wrapper: MemoryWrapper,
}

impl World {
    /// Create a world with the default configuration.
    pub fn new() -> Self {
        Self::with_config(WrapperConfig::default())
    }

    pub fn with_config(config: WrapperConfig) -> Self {
        let root = Principal::named("root");
        let controller = Principal::named("controller");
        let clock = Arc::new(ManualClock::new(GENESIS));
        let registry = Arc::new(MemoryRegistry::new(root));

        let suffix = DnsName::parse(&config.suffix).expect("valid suffix");
        let suffix_label = suffix.first_label().expect("non-root suffix");
        let base = registry
            .set_subnode_owner(&root, &Node::ROOT, &suffix_label.hash(), config.registrar)
            .expect("root owns the root node");

        let registrar = Arc::new(MemoryRegistrar::new(
            config.registrar,
            base,
            registry.clone(),
            clock.clone(),
        ));
        registrar
            .add_controller(config.wrapper)
            .expect("registrar lock");

        let store = Arc::new(MemoryStore::new());
        let events = EventLog::new();
        let mut wrapper = NameWrapper::new(
            config.clone(),
            store.clone(),
            registry.clone(),
            registrar.clone(),
            clock.clone(),
        )
        .expect("valid config")
        .with_event_sink(Arc::new(events.clone()));

        wrapper
            .set_controller(&config.admin, controller, true)
            .expect("admin sets controller");
        events.drain();

        Self {
            config,
            root,
            controller,
            registry,
            registrar,
            store,
            clock,
            events,
            wrapper,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn advance(&self, secs: u64) {
        self.clock.advance(secs);
    }

    /// Node of a leaf directly under the suffix.
    pub fn leaf_node(&self, label: &str) -> Node {
        self.wrapper.suffix_node().child(&LabelHash::of(label.as_bytes()))
    }

    /// Register `label` with the registrar for `owner` and approve the
    /// wrapper to move it. Returns the registration expiry.
    pub fn register(&self, label: &str, owner: Principal, duration: u64) -> Timestamp {
        let id = LabelHash::of(label.as_bytes());
        let expiry = self
            .registrar
            .register(&self.config.wrapper, &id, owner, duration)
            .expect("label available");
        self.approve_wrapper(owner);
        expiry
    }

    /// Register `label` for a year and wrap it for `owner` with `fuses`.
    pub fn wrap_leaf(&mut self, label: &str, owner: Principal, fuses: Fuses) -> Node {
        self.register(label, owner, YEAR);
        self.wrapper
            .wrap_leaf(&owner, &self::label(label), owner, fuses, u64::MAX, None)
            .expect("wrap leaf");
        self.leaf_node(label)
    }

    /// Create a raw registry entry for `name` owned by `owner`, creating
    /// missing ancestors as the root owner. Only for names outside the suffix.
    pub fn raw_name(&self, name: &str, owner: Principal) -> Node {
        let name = DnsName::parse(name).expect("valid name");
        let mut parent = Node::ROOT;
        let depth = name.depth();
        for (i, label) in name.labels().iter().rev().enumerate() {
            let holder = if i + 1 == depth { owner } else { self.root };
            let child = parent.child(&label.hash());
            let current = self.registry.owner(&child).expect("registry lock");
            if current.is_zero() || i + 1 == depth {
                self.registry
                    .set_subnode_owner(&self.root, &parent, &label.hash(), holder)
                    .expect("root controls ancestors");
            }
            parent = child;
        }
        self.approve_wrapper(owner);
        parent
    }

    /// Approve the wrapper in both the registry and registrar for `owner`.
    pub fn approve_wrapper(&self, owner: Principal) {
        self.registry
            .set_approval_for_all(&owner, self.config.wrapper, true)
            .expect("registry lock");
        self.registrar
            .set_approval_for_all(&owner, self.config.wrapper, true)
            .expect("registrar lock");
    }

    /// Events delivered since the last call.
    pub fn take_events(&self) -> Vec<WrapperEvent> {
        self.events.drain()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a text label.
pub fn label(text: &str) -> Label {
    Label::parse(text).expect("valid label")
}

/// Distinct principals for multi-party scenarios.
pub fn principals(count: usize) -> Vec<Principal> {
    (0..count)
        .map(|i| Principal::named(&format!("party-{i}")))
        .collect()
}
