//! Validated backend definition.

use crate::error::{ConfigError, ConfigResult};
use crate::settings::BackendSettings;
use gateway_core::MODEL_SEPARATOR;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use url::Url;
use validator::Validate;

/// One upstream backend, validated and immutable once built
#[derive(Clone)]
pub struct BackendConfig {
    name: String,
    api_url: Url,
    api_key: Option<SecretString>,
}

impl BackendConfig {
    /// Build a backend from its parts.
    ///
    /// # Errors
    /// Returns error if the name is empty or contains `:`, or the URL is not
    /// an absolute http(s) URL
    pub fn new(
        name: impl Into<String>,
        api_url: &str,
        api_key: Option<String>,
    ) -> ConfigResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::invalid("backend name cannot be empty"));
        }
        if name.contains(MODEL_SEPARATOR) {
            return Err(ConfigError::invalid(format!(
                "backend name '{name}' cannot contain '{MODEL_SEPARATOR}'"
            )));
        }

        let api_url = Url::parse(api_url).map_err(|e| {
            ConfigError::invalid(format!("backend '{name}': invalid api_url '{api_url}': {e}"))
        })?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(format!(
                "backend '{name}': api_url must use http or https, got '{}'",
                api_url.scheme()
            )));
        }

        Ok(Self {
            name,
            api_url,
            api_key: api_key.filter(|k| !k.is_empty()).map(SecretString::new),
        })
    }

    /// Validate raw settings, resolving `api_key_env` through `lookup`.
    ///
    /// An inline `api_key` wins over `api_key_env`.
    ///
    /// # Errors
    /// Returns error if any field is invalid
    pub fn from_settings<F>(settings: &BackendSettings, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        settings.validate()?;

        let api_key = settings
            .api_key
            .clone()
            .or_else(|| settings.api_key_env.as_deref().and_then(&lookup));

        if api_key.is_none() {
            if let Some(var) = &settings.api_key_env {
                tracing::warn!(
                    backend = %settings.name,
                    env = %var,
                    "Credential environment variable not set, calling backend without Authorization"
                );
            }
        }

        Self::new(&settings.name, &settings.api_url, api_key)
    }

    /// Backend name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chat completions endpoint
    #[must_use]
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Bearer credential, if configured
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret().as_str())
    }

    /// Whether a credential is configured
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("api_url", &self.api_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
