//! Loading configuration from disk and the environment.

use crate::backend::BackendConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::settings::{GatewayConfig, LogFormat};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use validator::Validate;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";

/// Config file used when `GATEWAY_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Supported config file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML
    Toml,
    /// YAML
    Yaml,
}

impl ConfigFormat {
    /// Pick a format from a file extension
    ///
    /// # Errors
    /// Returns error for unknown extensions
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ConfigError::UnsupportedFormat { extension }),
        }
    }
}

/// Load configuration from `GATEWAY_CONFIG` (or `config.toml`) plus
/// environment overrides.
///
/// When no path is given and the default file does not exist, defaults are
/// used; an explicitly named file must exist.
///
/// # Errors
/// Returns error if the file cannot be read, parsed or validated
pub async fn load_config() -> ConfigResult<GatewayConfig> {
    let explicit = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
    let path = explicit
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = if explicit.is_none() && !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        warn!(path = %path.display(), "Config file not found, using defaults");
        GatewayConfig::default()
    } else {
        read_config_file(&path).await?
    };

    apply_env_overrides(&mut config, |key| env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

/// Load configuration from an explicit path, without environment overrides.
///
/// # Errors
/// Returns error if the file cannot be read, parsed or validated
pub async fn load_config_from(path: impl AsRef<Path>) -> ConfigResult<GatewayConfig> {
    let config = read_config_file(path.as_ref()).await?;
    validate(&config)?;
    Ok(config)
}

async fn read_config_file(path: &Path) -> ConfigResult<GatewayConfig> {
    let format = ConfigFormat::from_path(path)?;
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    info!(path = %path.display(), "Loading configuration");
    parse_config(&contents, format)
}

/// Parse configuration text.
///
/// # Errors
/// Returns error if the text is not valid for the format
pub fn parse_config(contents: &str, format: ConfigFormat) -> ConfigResult<GatewayConfig> {
    match format {
        ConfigFormat::Toml => toml::from_str(contents).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        }),
        ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        }),
    }
}

/// Apply `GATEWAY_*` overrides using `lookup` to read variables.
///
/// Unparseable values are ignored with a warning.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("GATEWAY_HOST") {
        debug!(host = %host, "Overriding host from environment");
        config.server.host = host;
    }

    if let Some(port) = lookup("GATEWAY_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(value = %port, error = %e, "Ignoring invalid GATEWAY_PORT"),
        }
    }

    if let Some(level) = lookup("GATEWAY_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Some(format) = lookup("GATEWAY_LOG_FORMAT") {
        match format.to_ascii_lowercase().as_str() {
            "json" => config.logging.format = LogFormat::Json,
            "pretty" => config.logging.format = LogFormat::Pretty,
            other => warn!(value = %other, "Ignoring invalid GATEWAY_LOG_FORMAT"),
        }
    }

    if let Some(temperature) = lookup("GATEWAY_TEMPERATURE") {
        match temperature.parse() {
            Ok(t) => config.settings.temperature = t,
            Err(e) => warn!(value = %temperature, error = %e, "Ignoring invalid GATEWAY_TEMPERATURE"),
        }
    }
}

/// Validate every section and the backend table.
///
/// # Errors
/// Returns the first validation failure found
pub fn validate(config: &GatewayConfig) -> ConfigResult<()> {
    config.server.validate()?;
    config.settings.validate()?;

    let mut seen = HashSet::new();
    for backend in &config.backends {
        backend.validate()?;
        if !seen.insert(backend.name.as_str()) {
            return Err(ConfigError::invalid(format!(
                "duplicate backend name '{}'",
                backend.name
            )));
        }
    }

    if let Some(namespace) = &config.model_namespace {
        if namespace.is_empty() {
            return Err(ConfigError::invalid("model_namespace cannot be empty"));
        }
    }

    Ok(())
}

impl GatewayConfig {
    /// Validate the backend table into backend definitions, reading
    /// credential variables from the process environment.
    ///
    /// # Errors
    /// Returns error if any backend is invalid
    pub fn backend_configs(&self) -> ConfigResult<Vec<BackendConfig>> {
        self.backends
            .iter()
            .map(|b| BackendConfig::from_settings(b, |var| env::var(var).ok()))
            .collect()
    }
}
