//! Structured logging setup.
//!
//! Installs a global `tracing` subscriber writing either human-readable or
//! JSON lines to stdout. `RUST_LOG`, when set, overrides the configured
//! level.

use gateway_config::{LogFormat, LoggingSettings};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `gateway_server=debug,info`
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include the event target (module path)
    pub with_target: bool,
    /// Include source file and line
    pub with_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_target: true,
            with_location: false,
        }
    }
}

impl LoggingConfig {
    /// Create a default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[logging]` config section
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self::new()
            .with_level(settings.level.clone())
            .with_format(settings.format)
    }

    /// Set the filter directive
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Include source file and line in every event
    #[must_use]
    pub fn with_location(mut self, enabled: bool) -> Self {
        self.with_location = enabled;
        self
    }
}

/// Parse a filter directive
///
/// # Errors
/// Returns error if the directive is malformed
pub fn filter_for_level(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidLevel {
        level: level.to_string(),
        message: e.to_string(),
    })
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => filter_for_level(&config.level),
    }
}

/// Install the global subscriber
///
/// # Errors
/// Returns error if the level is malformed or a subscriber is already set
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;

    let output = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_target(config.with_target)
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(config.with_target)
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(output.with_filter(filter))
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    info!(level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The filter directive could not be parsed
    #[error("Invalid log level '{level}': {message}")]
    InvalidLevel {
        /// Directive as configured
        level: String,
        /// Parser message
        message: String,
    },
    /// A global subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let settings = LoggingSettings {
            level: "debug".into(),
            format: LogFormat::Json,
        };
        let config = LoggingConfig::from_settings(&settings);

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.with_target);
    }

    #[test]
    fn test_filter_directives() {
        assert!(filter_for_level("info").is_ok());
        assert!(filter_for_level("gateway_server=debug,warn").is_ok());
        assert!(matches!(
            filter_for_level("gateway_server=loud"),
            Err(LoggingError::InvalidLevel { .. })
        ));
    }

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig::new().with_level("warn");
        let _ = init_logging(&config);
        assert!(matches!(init_logging(&config), Err(LoggingError::Init(_))));
    }
}
