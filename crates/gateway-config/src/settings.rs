//! Raw configuration sections as they appear in the config file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listener settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Upstream backends
    #[serde(default)]
    pub backends: Vec<BackendSettings>,

    /// Prompt and generation defaults
    #[serde(default)]
    pub settings: PromptSettings,

    /// Outbound call deadlines
    #[serde(default)]
    pub timeouts: TimeoutSettings,

    /// Retrieval collaborator
    #[serde(default)]
    pub rag: RagSettings,

    /// Logging
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Legacy namespace prefix accepted in front of `<backend>:<model>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_namespace: Option<String>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerSettings {
    /// Bind host
    #[serde(default = "default_host")]
    #[validate(length(min = 1, message = "host cannot be empty"))]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    #[validate(range(min = 1, message = "port must be non-zero"))]
    pub port: u16,

    /// Maximum request body size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit: default_body_limit(),
        }
    }
}

/// One `[[backends]]` entry before validation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BackendSettings {
    /// Unique backend name used as the model prefix
    #[validate(length(min = 1, message = "backend name cannot be empty"))]
    pub name: String,

    /// Chat completions endpoint
    #[validate(length(min = 1, message = "api_url cannot be empty"))]
    pub api_url: String,

    /// Inline bearer credential
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Environment variable holding the bearer credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl BackendSettings {
    /// Create backend settings without a credential
    pub fn new(name: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_url: api_url.into(),
            api_key: None,
            api_key_env: None,
        }
    }

    /// Set an inline credential
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Read the credential from an environment variable
    #[must_use]
    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }
}

/// Prompt and generation defaults
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PromptSettings {
    /// File holding the system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_path: Option<PathBuf>,

    /// Temperature used when the client omits one
    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0, message = "temperature must be between 0.0 and 2.0"))]
    pub temperature: f32,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            system_prompt_path: None,
            temperature: default_temperature(),
        }
    }
}

impl PromptSettings {
    /// Read the system prompt file.
    ///
    /// A missing or unreadable file is logged and yields an empty prompt so
    /// the gateway can still serve requests.
    pub async fn load_system_prompt(&self) -> String {
        let Some(path) = &self.system_prompt_path else {
            return String::new();
        };

        match tokio::fs::read_to_string(path).await {
            Ok(prompt) => {
                tracing::info!(path = %path.display(), bytes = prompt.len(), "System prompt loaded");
                prompt
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "System prompt file not readable, using empty prompt"
                );
                String::new()
            }
        }
    }
}

/// Outbound call deadlines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSettings {
    /// TCP/TLS connect deadline shared by every outbound call
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect: Duration,

    /// Per-backend model listing deadline
    #[serde(default = "default_models_timeout", with = "humantime_serde")]
    pub models: Duration,

    /// Non-streaming completion deadline
    #[serde(default = "default_completion_timeout", with = "humantime_serde")]
    pub completion: Duration,

    /// Deadline for a streaming backend to send its response headers
    #[serde(default = "default_stream_connect_timeout", with = "humantime_serde")]
    pub stream_connect: Duration,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            connect: default_connect_timeout(),
            models: default_models_timeout(),
            completion: default_completion_timeout(),
            stream_connect: default_stream_connect_timeout(),
        }
    }
}

/// Retrieval collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagSettings {
    /// Remote retrieval service; when unset the local instruction template is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Deadline for one prompt build
    #[serde(default = "default_rag_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Static context passages prepended by the local template
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: default_rag_timeout(),
            context: Vec::new(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_body_limit() -> usize {
    2 * 1024 * 1024
}

const fn default_temperature() -> f32 {
    gateway_core::DEFAULT_TEMPERATURE
}

const fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

const fn default_models_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_completion_timeout() -> Duration {
    Duration::from_secs(20)
}

const fn default_stream_connect_timeout() -> Duration {
    Duration::from_secs(60)
}

const fn default_rag_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.timeouts.connect, Duration::from_secs(5));
        assert_eq!(config.timeouts.models, Duration::from_secs(10));
        assert_eq!(config.timeouts.completion, Duration::from_secs(20));
        assert!(config.backends.is_empty());
        assert!(config.model_namespace.is_none());
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_temperature_validation() {
        let settings = PromptSettings {
            system_prompt_path: None,
            temperature: 2.5,
        };
        assert!(settings.validate().is_err());
        assert!(PromptSettings::default().validate().is_ok());
    }

    #[test]
    fn test_api_key_never_serialized() {
        let backend = BackendSettings::new("openai", "https://api.openai.com/v1/chat/completions")
            .with_api_key("sk-secret");
        let json = serde_json::to_string(&backend).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_missing_system_prompt_is_empty() {
        let settings = PromptSettings {
            system_prompt_path: Some(PathBuf::from("/nonexistent/system_prompt.txt")),
            temperature: 0.7,
        };
        assert_eq!(settings.load_system_prompt().await, "");
    }

    #[tokio::test]
    async fn test_system_prompt_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "You are a thesis assistant.").unwrap();

        let settings = PromptSettings {
            system_prompt_path: Some(path),
            temperature: 0.7,
        };
        assert_eq!(settings.load_system_prompt().await, "You are a thesis assistant.");
    }
}
