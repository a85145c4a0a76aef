//! Namespaced model identifiers.
//!
//! Clients address models as `<backend>:<model>`. Only the first `:` splits
//! the string, so provider model names that contain colons themselves
//! (`ollama:llama3:8b`) survive intact.

use crate::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the backend name and the provider model name
pub const MODEL_SEPARATOR: char = ':';

/// A parsed `<backend>:<model>` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelReference {
    /// Registered backend name
    pub backend: String,
    /// Model name as the backend knows it
    pub real_model: String,
}

impl ModelReference {
    /// Create a reference from its parts
    pub fn new(backend: impl Into<String>, real_model: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            real_model: real_model.into(),
        }
    }

    /// Split a client model string on its first separator.
    ///
    /// This is purely syntactic; whether the backend exists is decided by
    /// the resolver against the registry.
    ///
    /// # Errors
    /// Returns [`GatewayError::InvalidModelIdentifier`] when the string has no
    /// separator or the model part is empty.
    pub fn parse(model: &str) -> GatewayResult<Self> {
        let (backend, real_model) = model
            .split_once(MODEL_SEPARATOR)
            .ok_or_else(|| GatewayError::invalid_model(model))?;

        if real_model.is_empty() {
            return Err(GatewayError::invalid_model(model));
        }

        Ok(Self::new(backend, real_model))
    }

    /// Build the gateway-facing id for a backend-local model id
    #[must_use]
    pub fn namespaced(backend: &str, upstream_id: &str) -> String {
        format!("{backend}{MODEL_SEPARATOR}{upstream_id}")
    }
}

impl fmt::Display for ModelReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{MODEL_SEPARATOR}{}", self.backend, self.real_model)
    }
}
