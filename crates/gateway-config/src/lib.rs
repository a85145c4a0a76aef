//! # Gateway Config
//!
//! Configuration management for the model gateway.
//!
//! - File loading (TOML or YAML, chosen by extension)
//! - Environment overrides (`GATEWAY_*`)
//! - Validation at construction time
//! - Atomically swappable snapshots for shared read-only state

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod loader;
pub mod settings;
pub mod snapshot;

pub use backend::BackendConfig;
pub use error::{ConfigError, ConfigResult};
pub use loader::{
    apply_env_overrides, load_config, load_config_from, parse_config, validate as validate_config,
    ConfigFormat,
};
pub use settings::{
    BackendSettings, GatewayConfig, LogFormat, LoggingSettings, PromptSettings, RagSettings,
    ServerSettings, TimeoutSettings,
};
pub use snapshot::SnapshotHandle;
