//! Wrapper configuration.

use serde::{Deserialize, Serialize};

use namewrap_core::Principal;

/// Configuration for a [`NameWrapper`](crate::NameWrapper).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperConfig {
    /// The wrapper's own identity towards the registry and registrar.
    pub wrapper: Principal,
    /// May change controllers and the metadata service.
    pub admin: Principal,
    /// The only sender trusted for inbound registration transfers.
    pub registrar: Principal,
    /// Top-level suffix whose children are registrar leaves.
    pub suffix: String,
    /// Controllers active from construction. Changes made through
    /// `set_controller` live in memory only, so a durable allowlist belongs
    /// here.
    #[serde(default)]
    pub controllers: Vec<Principal>,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            wrapper: Principal::named("namewrap"),
            admin: Principal::named("admin"),
            registrar: Principal::named("registrar"),
            suffix: "eth".to_string(),
            controllers: Vec::new(),
        }
    }
}

impl WrapperConfig {
    pub fn with_wrapper(mut self, wrapper: Principal) -> Self {
        self.wrapper = wrapper;
        self
    }

    pub fn with_admin(mut self, admin: Principal) -> Self {
        self.admin = admin;
        self
    }

    pub fn with_registrar(mut self, registrar: Principal) -> Self {
        self.registrar = registrar;
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_controller(mut self, controller: Principal) -> Self {
        self.controllers.push(controller);
        self
    }
}
