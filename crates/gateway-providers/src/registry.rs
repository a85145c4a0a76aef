//! Backend registry.
//!
//! Filled once at startup, then published read-only through a
//! [`RegistryHandle`]. Backends are kept in name order so iteration (and
//! the model catalog built from it) is deterministic.

use gateway_config::{BackendConfig, SnapshotHandle};
use gateway_core::{GatewayError, GatewayResult};
use std::collections::BTreeMap;
use tracing::info;

/// Shared read-only handle to the current registry snapshot
pub type RegistryHandle = SnapshotHandle<BackendRegistry>;

/// Name → backend mapping
#[derive(Debug, Default, Clone)]
pub struct BackendRegistry {
    backends: BTreeMap<String, BackendConfig>,
}

impl BackendRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from validated backends
    ///
    /// # Errors
    /// Returns error if two backends share a name
    pub fn from_configs(configs: impl IntoIterator<Item = BackendConfig>) -> GatewayResult<Self> {
        let mut registry = Self::new();
        for config in configs {
            registry.register(config)?;
        }
        Ok(registry)
    }

    /// Register a backend. Only used while building the registry.
    ///
    /// # Errors
    /// Returns error if a backend with the same name already exists
    pub fn register(&mut self, config: BackendConfig) -> GatewayResult<()> {
        let name = config.name().to_string();
        if self.backends.contains_key(&name) {
            return Err(GatewayError::configuration(format!(
                "Backend '{name}' is already registered"
            )));
        }

        info!(
            backend = %name,
            url = %config.api_url(),
            authenticated = config.has_api_key(),
            "Registered backend"
        );
        self.backends.insert(name, config);
        Ok(())
    }

    /// Look up a backend by exact (case-sensitive) name
    ///
    /// # Errors
    /// Returns [`GatewayError::UnknownBackend`] if no backend has that name
    pub fn lookup(&self, name: &str) -> GatewayResult<&BackendConfig> {
        self.backends
            .get(name)
            .ok_or_else(|| GatewayError::unknown_backend(name))
    }

    /// Whether a backend with this name exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// Backends in name order
    pub fn iter(&self) -> impl Iterator<Item = &BackendConfig> {
        self.backends.values()
    }

    /// Backend names in order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    /// Number of backends
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Publish this registry as a shared snapshot
    #[must_use]
    pub fn into_handle(self) -> RegistryHandle {
        SnapshotHandle::new(self)
    }
}
