//! Model identifier resolution.

use crate::registry::RegistryHandle;
use gateway_core::{GatewayError, GatewayResult, ModelReference, MODEL_SEPARATOR};
use tracing::debug;

/// Turns client model strings into references to registered backends
#[derive(Debug, Clone)]
pub struct ModelResolver {
    registry: RegistryHandle,
    legacy_namespace: Option<String>,
}

impl ModelResolver {
    /// Create a resolver over a registry
    #[must_use]
    pub fn new(registry: RegistryHandle) -> Self {
        Self {
            registry,
            legacy_namespace: None,
        }
    }

    /// Also accept `<namespace>:<backend>:<model>` by stripping a leading
    /// `<namespace>:`
    #[must_use]
    pub fn with_legacy_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.legacy_namespace = Some(namespace.into());
        self
    }

    /// Resolve `<backend>:<model>`.
    ///
    /// # Errors
    /// - [`GatewayError::InvalidModelIdentifier`] when there is no separator
    /// - [`GatewayError::UnknownBackend`] when the backend is not registered
    pub fn resolve(&self, model: &str) -> GatewayResult<ModelReference> {
        let canonical = self.strip_namespace(model);
        let reference = ModelReference::parse(canonical).map_err(|_| GatewayError::invalid_model(model))?;

        let registry = self.registry.load();
        if !registry.contains(&reference.backend) {
            return Err(GatewayError::unknown_backend(reference.backend));
        }

        debug!(
            model = %model,
            backend = %reference.backend,
            real_model = %reference.real_model,
            "Resolved model identifier"
        );
        Ok(reference)
    }

    fn strip_namespace<'a>(&self, model: &'a str) -> &'a str {
        let Some(namespace) = &self.legacy_namespace else {
            return model;
        };

        // Strip only when the remainder still carries a backend separator.
        model
            .strip_prefix(namespace.as_str())
            .and_then(|rest| rest.strip_prefix(MODEL_SEPARATOR))
            .filter(|rest| rest.contains(MODEL_SEPARATOR))
            .unwrap_or(model)
    }
}
