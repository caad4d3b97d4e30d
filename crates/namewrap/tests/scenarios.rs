//! End-to-end wrapper scenarios against in-memory collaborators.

use std::sync::Arc;

use namewrap::registry::{MemoryRegistrar, MemoryRegistry, Registrar, Registry};
use namewrap::store::{RecordStore, SqliteStore};
use namewrap::{
    DnsName, Fuses, LabelHash, NameWrapper, Node, Principal, RegistrationInstructions,
    WrapperConfig, WrapperError, WrapperEvent,
};
use namewrap::core::ManualClock;
use namewrap_testkit::{label, World, GENESIS, YEAR};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn name(text: &str) -> DnsName {
    DnsName::parse(text).unwrap()
}

fn lh(text: &str) -> LabelHash {
    LabelHash::of(text.as_bytes())
}

// ─────────────────────────────────────────────────────────────────────────────
// Basic lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_wrap_leaf_then_unwrap() -> anyhow::Result<()> {
    init_tracing();
    let mut world = World::new();
    let o1 = Principal::named("o1");
    let o2 = Principal::named("o2");

    let node = world.wrap_leaf("alice", o1, Fuses::empty());
    let leaf_expiry = GENESIS + YEAR;

    // Leaves always carry PARENT_CANNOT_CONTROL.
    assert_eq!(
        world.wrapper.read_permissions(&node)?,
        (Fuses::PARENT_CANNOT_CONTROL, leaf_expiry)
    );
    assert_eq!(world.wrapper.name_of(&node)?, Some(name("alice.eth")));

    world.take_events();
    world.wrapper.unwrap_leaf(&o1, &lh("alice"), o2, o2)?;

    assert_eq!(world.registry.owner(&node)?, o2);
    assert_eq!(world.registrar.owner_of(&lh("alice"))?, o2);
    assert!(matches!(
        world.wrapper.read_permissions(&node),
        Err(WrapperError::NotFound(n)) if n == node
    ));
    assert_eq!(
        world.take_events(),
        vec![WrapperEvent::Unwrapped { node, owner: o2 }]
    );
    Ok(())
}

#[test]
fn test_wrap_and_unwrap_generic_name() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let carol = Principal::named("carol");
    let node = world.raw_name("alice.xyz", alice);
    let resolver = Principal::named("resolver");

    world
        .wrapper
        .wrap(&alice, &name("alice.xyz"), alice, Fuses::empty(), Some(resolver))?;

    assert_eq!(world.wrapper.get_data(&node)?, (alice, Fuses::empty(), 0));
    assert_eq!(world.registry.owner(&node)?, world.config.wrapper);
    assert_eq!(world.registry.resolver(&node)?, resolver);

    let xyz = name("xyz").node();
    let wrapper_id = world.config.wrapper;
    assert!(matches!(
        world.wrapper.unwrap(&alice, &xyz, &lh("alice"), wrapper_id),
        Err(WrapperError::InvalidTargetOwner(_))
    ));
    assert!(matches!(
        world.wrapper.unwrap(&alice, &xyz, &lh("alice"), Principal::ZERO),
        Err(WrapperError::InvalidTargetOwner(_))
    ));

    world.wrapper.unwrap(&alice, &xyz, &lh("alice"), carol)?;
    assert_eq!(world.registry.owner(&node)?, carol);
    assert_eq!(world.wrapper.owner_of(&node)?, Principal::ZERO);
    // The name stays available for reverse lookup.
    assert_eq!(world.wrapper.name_of(&node)?, Some(name("alice.xyz")));
    Ok(())
}

#[test]
fn test_wrap_rejections() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    world.register("alice", alice, YEAR);

    assert!(matches!(
        world.wrapper.wrap(&alice, &name("alice.eth"), alice, Fuses::empty(), None),
        Err(WrapperError::IncompatibleParent(_))
    ));

    world.raw_name("alice.xyz", alice);
    assert!(matches!(
        world.wrapper.wrap(
            &alice,
            &name("alice.xyz"),
            alice,
            Fuses::PARENT_CANNOT_CONTROL,
            None
        ),
        Err(WrapperError::Unauthorised(_))
    ));
    assert!(matches!(
        world.wrapper.wrap(&alice, &name("alice.xyz"), alice, Fuses::CANNOT_TRANSFER, None),
        Err(WrapperError::OperationProhibited(_))
    ));

    let suffix = world.wrapper.suffix_node();
    assert!(matches!(
        world.wrapper.unwrap(&alice, &suffix, &lh("alice"), alice),
        Err(WrapperError::IncompatibleParent(_))
    ));
    Ok(())
}

#[test]
fn test_approval_domains_are_separate() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let mallory = Principal::named("mallory");
    world.raw_name("alice.xyz", alice);

    // Approval on wrapped records grants nothing in the raw registry.
    world.wrapper.set_approval_for_all(&alice, mallory, true)?;
    assert!(matches!(
        world.wrapper.wrap(&mallory, &name("alice.xyz"), mallory, Fuses::empty(), None),
        Err(WrapperError::Unauthorised(_))
    ));

    world.registry.set_approval_for_all(&alice, mallory, true)?;
    let node = world
        .wrapper
        .wrap(&mallory, &name("alice.xyz"), alice, Fuses::empty(), None)?;
    assert_eq!(world.wrapper.owner_of(&node)?, alice);
    assert!(world.wrapper.is_owner_or_approved(&node, &mallory)?);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Fuses
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_locked_fuse_blocks_until_expiry() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let node = world.wrap_leaf(
        "alice",
        alice,
        Fuses::CANNOT_SET_RESOLVER | Fuses::CANNOT_UNWRAP,
    );
    let resolver = Principal::named("resolver");

    assert!(matches!(
        world.wrapper.set_resolver(&alice, &node, resolver),
        Err(WrapperError::OperationProhibited(_))
    ));

    world.advance(YEAR + 1);
    world.wrapper.set_resolver(&alice, &node, resolver)?;
    assert_eq!(world.registry.resolver(&node)?, resolver);

    // The bits are still stored; only their effect lapsed.
    assert!(world
        .wrapper
        .all_fuses_burned(&node, Fuses::CANNOT_SET_RESOLVER)?);
    Ok(())
}

#[test]
fn test_set_fuses_on_leaf() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let bob = Principal::named("bob");
    let node = world.wrap_leaf("alice", alice, Fuses::CANNOT_UNWRAP);
    let suffix = world.wrapper.suffix_node();

    let fuses = world
        .wrapper
        .set_fuses(&alice, &suffix, &lh("alice"), Fuses::CANNOT_TRANSFER)?;
    assert_eq!(
        fuses,
        Fuses::CANNOT_UNWRAP | Fuses::PARENT_CANNOT_CONTROL | Fuses::CANNOT_TRANSFER
    );

    assert!(matches!(
        world
            .wrapper
            .set_fuses(&alice, &suffix, &lh("alice"), Fuses::PARENT_CANNOT_CONTROL),
        Err(WrapperError::Unauthorised(_))
    ));
    assert!(matches!(
        world.wrapper.set_fuses(&bob, &suffix, &lh("alice"), Fuses::CANNOT_SET_TTL),
        Err(WrapperError::Unauthorised(_))
    ));

    assert!(matches!(
        world.wrapper.safe_transfer_from(&alice, &alice, bob, &node),
        Err(WrapperError::OperationProhibited(_))
    ));

    world
        .wrapper
        .set_fuses(&alice, &suffix, &lh("alice"), Fuses::CANNOT_BURN_FUSES)?;
    assert!(matches!(
        world.wrapper.set_fuses(&alice, &suffix, &lh("alice"), Fuses::CANNOT_SET_TTL),
        Err(WrapperError::OperationProhibited(_))
    ));
    Ok(())
}

#[test]
fn test_unwrap_gate_applies_to_every_caller() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let bob = Principal::named("bob");
    let stranger = Principal::named("stranger");
    let parent = world.wrap_leaf("alice", alice, Fuses::CANNOT_UNWRAP);

    let child = world.wrapper.set_subnode_owner(
        &alice,
        &parent,
        &label("sub"),
        bob,
        Fuses::CANNOT_UNWRAP,
        GENESIS + 100,
    )?;

    for caller in [bob, alice, stranger] {
        assert!(matches!(
            world.wrapper.unwrap(&caller, &parent, &lh("sub"), bob),
            Err(WrapperError::OperationProhibited(_))
        ));
    }
    assert!(world.wrapper.is_wrapped(&child)?);

    // Expiry does not lift CANNOT_UNWRAP.
    world.advance(2 * YEAR);
    assert!(matches!(
        world.wrapper.unwrap(&bob, &parent, &lh("sub"), bob),
        Err(WrapperError::OperationProhibited(_))
    ));
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Subnodes
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_subdomain_creation_blocked() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let bob = Principal::named("bob");
    let parent = world.wrap_leaf(
        "alice",
        alice,
        Fuses::CANNOT_CREATE_SUBDOMAIN | Fuses::CANNOT_UNWRAP,
    );

    assert!(matches!(
        world
            .wrapper
            .set_subnode_owner(&alice, &parent, &label("fresh"), bob, Fuses::empty(), 0),
        Err(WrapperError::OperationProhibited(_))
    ));

    world.advance(YEAR + 1);
    let child = world
        .wrapper
        .set_subnode_owner(&alice, &parent, &label("fresh"), bob, Fuses::empty(), 0)?;
    assert_eq!(world.wrapper.owner_of(&child)?, bob);
    Ok(())
}

#[test]
fn test_parent_lock_propagation() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let bob = Principal::named("bob");
    let carol = Principal::named("carol");
    let parent = world.wrap_leaf("alice", alice, Fuses::CANNOT_UNWRAP);
    let expiry = GENESIS + 1_000;

    let child = world.wrapper.set_subnode_owner(
        &alice,
        &parent,
        &label("sub"),
        bob,
        Fuses::PARENT_CANNOT_CONTROL,
        expiry,
    )?;

    assert!(matches!(
        world
            .wrapper
            .set_subnode_owner(&alice, &parent, &label("sub"), carol, Fuses::empty(), expiry),
        Err(WrapperError::OperationProhibited(_))
    ));

    // The parent may not add new fuses, only restate existing ones.
    assert!(matches!(
        world
            .wrapper
            .set_child_fuses(&alice, &parent, &lh("sub"), Fuses::CANNOT_UNWRAP, expiry),
        Err(WrapperError::Unauthorised(_))
    ));
    world.wrapper.set_child_fuses(
        &alice,
        &parent,
        &lh("sub"),
        Fuses::PARENT_CANNOT_CONTROL,
        expiry,
    )?;

    // The child's owner still acts freely.
    let resolver = Principal::named("resolver");
    world.wrapper.set_resolver(&bob, &child, resolver)?;
    assert_eq!(world.registry.resolver(&child)?, resolver);
    world.wrapper.safe_transfer_from(&bob, &bob, carol, &child)?;
    assert_eq!(world.wrapper.owner_of(&child)?, carol);
    Ok(())
}

#[test]
fn test_replace_subnode_merges_fuses() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let bob = Principal::named("bob");
    let carol = Principal::named("carol");
    let parent = world.wrap_leaf("alice", alice, Fuses::CANNOT_UNWRAP);

    let child = world.wrapper.set_subnode_owner(
        &alice,
        &parent,
        &label("sub"),
        bob,
        Fuses::CANNOT_UNWRAP,
        GENESIS + 100,
    )?;
    world.take_events();

    world.wrapper.set_subnode_owner(
        &alice,
        &parent,
        &label("sub"),
        carol,
        Fuses::CANNOT_SET_TTL,
        GENESIS + 200,
    )?;

    assert_eq!(
        world.wrapper.get_data(&child)?,
        (
            carol,
            Fuses::CANNOT_UNWRAP | Fuses::CANNOT_SET_TTL,
            GENESIS + 200
        )
    );
    assert_eq!(world.wrapper.name_of(&child)?, Some(name("sub.alice.eth")));
    assert_eq!(
        world.take_events(),
        vec![
            WrapperEvent::Transferred {
                node: child,
                from: bob,
                to: carol
            },
            WrapperEvent::FusesSet {
                node: child,
                fuses: Fuses::CANNOT_UNWRAP | Fuses::CANNOT_SET_TTL,
                expiry: GENESIS + 200
            },
        ]
    );

    // Expiry may not move backwards on subnode creation.
    assert!(matches!(
        world.wrapper.set_subnode_owner(
            &alice,
            &parent,
            &label("sub"),
            carol,
            Fuses::empty(),
            GENESIS + 150
        ),
        Err(WrapperError::InvalidExpiry { .. })
    ));
    // Nor exceed the parent's.
    assert!(matches!(
        world.wrapper.set_subnode_owner(
            &alice,
            &parent,
            &label("other"),
            carol,
            Fuses::empty(),
            GENESIS + YEAR + 1
        ),
        Err(WrapperError::InvalidExpiry { .. })
    ));
    Ok(())
}

#[test]
fn test_set_child_fuses_clamps_to_parent() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let bob = Principal::named("bob");
    let parent = world.wrap_leaf("alice", alice, Fuses::CANNOT_UNWRAP);
    let child = world.wrapper.set_subnode_owner(
        &alice,
        &parent,
        &label("sub"),
        bob,
        Fuses::empty(),
        GENESIS + 10,
    )?;

    world.wrapper.set_child_fuses(
        &alice,
        &parent,
        &lh("sub"),
        Fuses::CANNOT_UNWRAP,
        u64::MAX,
    )?;
    assert_eq!(
        world.wrapper.read_permissions(&child)?,
        (Fuses::CANNOT_UNWRAP, GENESIS + YEAR)
    );

    // Leaf children: the registrant acts, the registrar's expiry caps.
    let suffix = world.wrapper.suffix_node();
    world.wrapper.set_child_fuses(
        &alice,
        &suffix,
        &lh("alice"),
        Fuses::CANNOT_SET_TTL,
        u64::MAX,
    )?;
    assert_eq!(world.wrapper.read_permissions(&parent)?.1, GENESIS + YEAR);
    Ok(())
}

#[test]
fn test_set_subnode_record_sets_raw_entry() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let bob = Principal::named("bob");
    let resolver = Principal::named("resolver");
    let parent = world.wrap_leaf("alice", alice, Fuses::empty());

    let child = world.wrapper.set_subnode_record(
        &alice,
        &parent,
        &label("www"),
        bob,
        resolver,
        300,
        Fuses::empty(),
        0,
    )?;

    assert_eq!(world.registry.owner(&child)?, world.config.wrapper);
    assert_eq!(world.registry.resolver(&child)?, resolver);
    assert_eq!(world.registry.ttl(&child)?, 300);
    assert_eq!(world.wrapper.owner_of(&child)?, bob);
    Ok(())
}

#[test]
fn test_set_record_moves_owner() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let bob = Principal::named("bob");
    let resolver = Principal::named("resolver");
    let node = world.wrap_leaf("alice", alice, Fuses::empty());

    world.wrapper.set_record(&alice, &node, bob, resolver, 60)?;
    assert_eq!(world.wrapper.owner_of(&node)?, bob);
    assert_eq!(world.registry.owner(&node)?, world.config.wrapper);
    assert_eq!(world.registry.ttl(&node)?, 60);

    world.wrapper.set_ttl(&bob, &node, 120)?;
    assert_eq!(world.registry.ttl(&node)?, 120);
    assert!(matches!(
        world.wrapper.set_ttl(&alice, &node, 1),
        Err(WrapperError::Unauthorised(_))
    ));
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Re-wrap
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_rewrap_revokes_stale_record_once() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let a = Principal::named("a");
    let b = Principal::named("b");

    let parent = world.raw_name("alice.xyz", alice);
    world
        .registry
        .set_subnode_owner(&alice, &parent, &lh("sub"), alice)?;
    let sub = name("sub.alice.xyz");
    let node = world.wrapper.wrap(&alice, &sub, a, Fuses::empty(), None)?;

    // The raw parent owner takes the entry back behind the wrapper's back.
    world
        .registry
        .set_subnode_owner(&alice, &parent, &lh("sub"), alice)?;
    world.take_events();

    world.wrapper.wrap(&alice, &sub, b, Fuses::empty(), None)?;

    assert_eq!(
        world.take_events(),
        vec![
            WrapperEvent::Unwrapped {
                node,
                owner: Principal::ZERO
            },
            WrapperEvent::Wrapped {
                node,
                name: sub,
                owner: b,
                fuses: Fuses::empty(),
                expiry: 0
            },
        ]
    );
    assert_eq!(world.wrapper.owner_of(&node)?, b);
    assert!(!world.wrapper.is_owner_or_approved(&node, &a)?);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Registration
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_register_and_renew() -> anyhow::Result<()> {
    let mut world = World::new();
    let bob = Principal::named("bob");
    let controller = world.controller;

    assert!(matches!(
        world
            .wrapper
            .register_and_wrap(&bob, &label("bob"), bob, YEAR, None, Fuses::empty()),
        Err(WrapperError::Unauthorised(_))
    ));

    let expiry = world.wrapper.register_and_wrap(
        &controller,
        &label("bob"),
        bob,
        YEAR,
        None,
        Fuses::CANNOT_UNWRAP,
    )?;
    assert_eq!(expiry, GENESIS + YEAR);

    let node = world.leaf_node("bob");
    assert_eq!(
        world.wrapper.get_data(&node)?,
        (
            bob,
            Fuses::CANNOT_UNWRAP | Fuses::PARENT_CANNOT_CONTROL,
            expiry
        )
    );
    assert_eq!(world.registrar.owner_of(&lh("bob"))?, world.config.wrapper);
    world.take_events();

    let renewed = world.wrapper.renew(&controller, &lh("bob"), YEAR)?;
    assert_eq!(renewed, GENESIS + 2 * YEAR);
    assert_eq!(world.wrapper.read_permissions(&node)?.1, renewed);
    assert_eq!(
        world.take_events(),
        vec![WrapperEvent::ExpiryExtended {
            node,
            expiry: renewed
        }]
    );
    Ok(())
}

#[test]
fn test_register_rejects_invalid_fuses_before_registering() {
    let mut world = World::new();
    let bob = Principal::named("bob");
    let controller = world.controller;

    assert!(matches!(
        world.wrapper.register_and_wrap(
            &controller,
            &label("bob"),
            bob,
            YEAR,
            None,
            Fuses::CANNOT_TRANSFER
        ),
        Err(WrapperError::OperationProhibited(_))
    ));
    assert_eq!(world.registrar.name_expires(&lh("bob")).unwrap(), 0);
}

#[test]
fn test_controllers_are_admin_managed() -> anyhow::Result<()> {
    let mut world = World::new();
    let admin = world.config.admin;
    let eve = Principal::named("eve");

    assert!(matches!(
        world.wrapper.set_controller(&eve, eve, true),
        Err(WrapperError::Unauthorised(_))
    ));
    world.wrapper.set_controller(&admin, eve, true)?;
    assert!(world.wrapper.is_controller(&eve));
    assert_eq!(
        world.take_events(),
        vec![WrapperEvent::ControllerChanged {
            controller: eve,
            active: true
        }]
    );
    Ok(())
}

#[test]
fn test_inbound_registration_transfer() -> anyhow::Result<()> {
    let mut world = World::new();
    let carol = Principal::named("carol");
    let resolver = Principal::named("resolver");
    let wrapper_id = world.config.wrapper;
    let registrar_id = world.config.registrar;
    let expiry = world.register("carol", carol, YEAR);

    world
        .registrar
        .transfer_from(&carol, &carol, wrapper_id, &lh("carol"))?;

    let payload = RegistrationInstructions {
        label: "carol".into(),
        owner: carol,
        fuses: Fuses::CANNOT_UNWRAP,
        expiry: u64::MAX,
        resolver: Some(resolver),
    }
    .encode()?;

    assert!(matches!(
        world
            .wrapper
            .on_registration_received(&carol, &carol, &lh("carol"), &payload),
        Err(WrapperError::IncorrectAssetType(_))
    ));

    let mismatched = RegistrationInstructions {
        label: "dave".into(),
        owner: carol,
        fuses: Fuses::empty(),
        expiry: 0,
        resolver: None,
    }
    .encode()?;
    assert!(matches!(
        world
            .wrapper
            .on_registration_received(&registrar_id, &carol, &lh("carol"), &mismatched),
        Err(WrapperError::LabelMismatch { .. })
    ));

    let node = world
        .wrapper
        .on_registration_received(&registrar_id, &carol, &lh("carol"), &payload)?;

    assert_eq!(node, world.leaf_node("carol"));
    assert_eq!(
        world.wrapper.get_data(&node)?,
        (
            carol,
            Fuses::CANNOT_UNWRAP | Fuses::PARENT_CANNOT_CONTROL,
            expiry
        )
    );
    assert_eq!(world.registry.owner(&node)?, wrapper_id);
    assert_eq!(world.registry.resolver(&node)?, resolver);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Persistence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_sqlite_backed_wrapper_persists() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("wrapper.db");

    let config = WrapperConfig::default();
    let root = Principal::named("root");
    let alice = Principal::named("alice");
    let clock = Arc::new(ManualClock::new(GENESIS));
    let registry = Arc::new(MemoryRegistry::new(root));
    let eth = registry.set_subnode_owner(&root, &Node::ROOT, &lh("eth"), config.registrar)?;
    let registrar = Arc::new(MemoryRegistrar::new(
        config.registrar,
        eth,
        registry.clone(),
        clock.clone(),
    ));
    registrar.add_controller(config.wrapper)?;
    registrar.register(&config.wrapper, &lh("alice"), alice, YEAR)?;
    registrar.set_approval_for_all(&alice, config.wrapper, true)?;

    let node = {
        let store = Arc::new(SqliteStore::open(&path)?);
        let mut wrapper = NameWrapper::new(
            config.clone(),
            store,
            registry.clone(),
            registrar.clone(),
            clock.clone(),
        )?;
        wrapper.wrap_leaf(
            &alice,
            &label("alice"),
            alice,
            Fuses::CANNOT_UNWRAP,
            u64::MAX,
            None,
        )?;
        eth.child(&lh("alice"))
    };

    let store = SqliteStore::open(&path)?;
    let record = store.get_record(&node)?.expect("record persisted");
    assert_eq!(record.owner(), alice);
    assert_eq!(
        record.fuses(),
        Fuses::CANNOT_UNWRAP | Fuses::PARENT_CANNOT_CONTROL
    );
    assert_eq!(store.get_name(&node)?, Some(name("alice.eth")));
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Replay and lapse
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_replayed_inbound_registration_is_rejected() -> anyhow::Result<()> {
    let mut world = World::new();
    let carol = Principal::named("carol");
    let mallory = Principal::named("mallory");
    let wrapper_id = world.config.wrapper;
    let registrar_id = world.config.registrar;
    world.register("carol", carol, YEAR);
    world
        .registrar
        .transfer_from(&carol, &carol, wrapper_id, &lh("carol"))?;

    let payload = RegistrationInstructions {
        label: "carol".into(),
        owner: carol,
        fuses: Fuses::CANNOT_UNWRAP,
        expiry: u64::MAX,
        resolver: None,
    }
    .encode()?;
    let node = world
        .wrapper
        .on_registration_received(&registrar_id, &carol, &lh("carol"), &payload)?;
    let suffix = world.wrapper.suffix_node();
    world
        .wrapper
        .set_fuses(&carol, &suffix, &lh("carol"), Fuses::CANNOT_TRANSFER)?;
    let before = world.wrapper.get_data(&node)?;
    world.take_events();

    let hijack = RegistrationInstructions {
        label: "carol".into(),
        owner: mallory,
        fuses: Fuses::empty(),
        expiry: 0,
        resolver: None,
    }
    .encode()?;
    for replay in [&payload, &hijack] {
        assert!(matches!(
            world
                .wrapper
                .on_registration_received(&registrar_id, &carol, &lh("carol"), replay),
            Err(WrapperError::Unauthorised(_))
        ));
    }

    assert_eq!(world.wrapper.get_data(&node)?, before);
    assert_eq!(before.0, carol);
    assert!(before.1.contains(Fuses::CANNOT_UNWRAP | Fuses::CANNOT_TRANSFER));
    assert!(world.take_events().is_empty());
    Ok(())
}

#[test]
fn test_renew_leaves_stale_record_alone() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let bob = Principal::named("bob");
    let controller = world.controller;
    let fuses = Fuses::CANNOT_UNWRAP | Fuses::CANNOT_SET_RESOLVER;
    let node = world.wrap_leaf("alice", alice, fuses);
    let stale = world.wrapper.get_data(&node)?;

    world.advance(YEAR + 1);
    world.register("alice", bob, YEAR);
    world.take_events();

    let renewed = world.wrapper.renew(&controller, &lh("alice"), YEAR)?;
    assert_eq!(renewed, GENESIS + YEAR + 1 + 2 * YEAR);
    assert_eq!(world.registrar.owner_of(&lh("alice"))?, bob);

    assert_eq!(world.wrapper.get_data(&node)?, stale);
    assert_eq!(stale.2, GENESIS + YEAR);
    assert!(!world.wrapper.is_wrapped(&node)?);
    assert!(world.take_events().is_empty());
    Ok(())
}

#[test]
fn test_rewrap_of_lapsed_leaf_replaces_burned_record() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let bob = Principal::named("bob");
    let node = world.wrap_leaf("alice", alice, Fuses::CANNOT_UNWRAP | Fuses::CANNOT_TRANSFER);

    // While the registration is live the wrapper holds it; nobody else can
    // wrap over the burned record.
    assert!(matches!(
        world
            .wrapper
            .wrap_leaf(&alice, &label("alice"), alice, Fuses::empty(), u64::MAX, None),
        Err(WrapperError::Unauthorised(_))
    ));
    assert_eq!(
        world.wrapper.read_permissions(&node)?.0,
        Fuses::CANNOT_UNWRAP | Fuses::CANNOT_TRANSFER | Fuses::PARENT_CANNOT_CONTROL
    );

    world.advance(YEAR + 1);
    let expiry = world.register("alice", bob, YEAR);
    world.take_events();

    world
        .wrapper
        .wrap_leaf(&bob, &label("alice"), bob, Fuses::empty(), u64::MAX, None)?;

    assert_eq!(
        world.take_events(),
        vec![
            WrapperEvent::Unwrapped {
                node,
                owner: Principal::ZERO
            },
            WrapperEvent::Wrapped {
                node,
                name: name("alice.eth"),
                owner: bob,
                fuses: Fuses::PARENT_CANNOT_CONTROL,
                expiry
            },
        ]
    );
    assert_eq!(
        world.wrapper.get_data(&node)?,
        (bob, Fuses::PARENT_CANNOT_CONTROL, expiry)
    );
    Ok(())
}

#[test]
fn test_subnode_under_suffix_is_incompatible() -> anyhow::Result<()> {
    let mut world = World::new();
    let alice = Principal::named("alice");
    let suffix = world.wrapper.suffix_node();

    assert!(matches!(
        world
            .wrapper
            .set_subnode_owner(&alice, &suffix, &label("alice"), alice, Fuses::empty(), 0),
        Err(WrapperError::IncompatibleParent(n)) if n == suffix
    ));
    assert!(matches!(
        world.wrapper.set_subnode_record(
            &alice,
            &suffix,
            &label("alice"),
            alice,
            Principal::named("resolver"),
            0,
            Fuses::empty(),
            0
        ),
        Err(WrapperError::IncompatibleParent(_))
    ));
    Ok(())
}
