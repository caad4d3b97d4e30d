//! Observable state changes.
//!
//! Each mutating operation collects its events and hands them to the
//! [`EventSink`] only after every record-store write has committed, so a
//! listener never sees a half-applied operation.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use namewrap_core::{DnsName, Node, Principal, Timestamp};
use namewrap_perms::Fuses;

/// A state change, carrying enough to rebuild the record from events alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapperEvent {
    Wrapped {
        node: Node,
        name: DnsName,
        owner: Principal,
        fuses: Fuses,
        expiry: Timestamp,
    },
    /// `owner` is the new raw owner; zero when a stale record is revoked.
    Unwrapped { node: Node, owner: Principal },
    FusesSet {
        node: Node,
        fuses: Fuses,
        expiry: Timestamp,
    },
    ExpiryExtended { node: Node, expiry: Timestamp },
    Transferred {
        node: Node,
        from: Principal,
        to: Principal,
    },
    ApprovalForAll {
        owner: Principal,
        operator: Principal,
        approved: bool,
    },
    ControllerChanged { controller: Principal, active: bool },
}

impl WrapperEvent {
    /// The node this event concerns, if any.
    pub fn node(&self) -> Option<Node> {
        match self {
            WrapperEvent::Wrapped { node, .. }
            | WrapperEvent::Unwrapped { node, .. }
            | WrapperEvent::FusesSet { node, .. }
            | WrapperEvent::ExpiryExtended { node, .. }
            | WrapperEvent::Transferred { node, .. } => Some(*node),
            WrapperEvent::ApprovalForAll { .. } | WrapperEvent::ControllerChanged { .. } => None,
        }
    }
}

/// Receives events after an operation commits.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: &WrapperEvent);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn deliver(&self, _event: &WrapperEvent) {}
}

/// Records events in memory. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Arc<Mutex<Vec<WrapperEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far.
    pub fn events(&self) -> Vec<WrapperEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Remove and return everything delivered so far.
    pub fn drain(&self) -> Vec<WrapperEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventSink for EventLog {
    fn deliver(&self, event: &WrapperEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
