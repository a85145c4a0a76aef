//! Shared application state.

use gateway_core::{PromptBuilder, StaticPromptBuilder, DEFAULT_TEMPERATURE};
use gateway_providers::{
    BackendRegistry, CompletionDispatcher, ModelCatalog, ModelResolver, RegistryHandle,
    DEFAULT_COMPLETION_TIMEOUT, DEFAULT_MODELS_TIMEOUT, DEFAULT_STREAM_CONNECT_TIMEOUT,
};
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default request body limit
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// State shared by all handlers. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Backend registry snapshot
    pub registry: RegistryHandle,
    /// Model identifier resolution
    pub resolver: ModelResolver,
    /// Model catalog aggregation
    pub catalog: ModelCatalog,
    /// Completion dispatch
    pub dispatcher: CompletionDispatcher,
    /// Prompt augmentation
    pub prompt_builder: Arc<dyn PromptBuilder>,
    /// System message sent with every completion
    pub system_prompt: Arc<str>,
    /// Temperature used when the client sends none
    pub default_temperature: f32,
    /// Maximum request body size in bytes
    pub body_limit: usize,
}

impl AppState {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("backends", &self.registry.load().names())
            .field("prompt_builder", &self.prompt_builder.name())
            .field("default_temperature", &self.default_temperature)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AppState`]
pub struct AppStateBuilder {
    registry: Option<RegistryHandle>,
    client: Option<Client>,
    prompt_builder: Option<Arc<dyn PromptBuilder>>,
    system_prompt: String,
    default_temperature: f32,
    model_namespace: Option<String>,
    models_timeout: Duration,
    completion_timeout: Duration,
    stream_connect_timeout: Duration,
    body_limit: usize,
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self {
            registry: None,
            client: None,
            prompt_builder: None,
            system_prompt: String::new(),
            default_temperature: DEFAULT_TEMPERATURE,
            model_namespace: None,
            models_timeout: DEFAULT_MODELS_TIMEOUT,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            stream_connect_timeout: DEFAULT_STREAM_CONNECT_TIMEOUT,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl AppStateBuilder {
    /// Set the backend registry
    #[must_use]
    pub fn registry(mut self, registry: RegistryHandle) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the outbound HTTP client
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the prompt builder
    #[must_use]
    pub fn prompt_builder(mut self, builder: Arc<dyn PromptBuilder>) -> Self {
        self.prompt_builder = Some(builder);
        self
    }

    /// Set the system prompt
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the fallback temperature
    #[must_use]
    pub fn default_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = temperature;
        self
    }

    /// Accept `<namespace>:<backend>:<model>` identifiers
    #[must_use]
    pub fn model_namespace(mut self, namespace: Option<String>) -> Self {
        self.model_namespace = namespace;
        self
    }

    /// Set the per-backend model listing deadline
    #[must_use]
    pub fn models_timeout(mut self, timeout: Duration) -> Self {
        self.models_timeout = timeout;
        self
    }

    /// Set the non-streaming completion deadline
    #[must_use]
    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// Set the deadline for a streaming response to start
    #[must_use]
    pub fn stream_connect_timeout(mut self, timeout: Duration) -> Self {
        self.stream_connect_timeout = timeout;
        self
    }

    /// Set the request body limit
    #[must_use]
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Build the state
    #[must_use]
    pub fn build(self) -> AppState {
        let registry = self
            .registry
            .unwrap_or_else(|| BackendRegistry::new().into_handle());
        let client = self.client.unwrap_or_default();

        let mut resolver = ModelResolver::new(registry.clone());
        if let Some(namespace) = self.model_namespace {
            resolver = resolver.with_legacy_namespace(namespace);
        }

        AppState {
            catalog: ModelCatalog::new(registry.clone(), client.clone())
                .with_timeout(self.models_timeout),
            dispatcher: CompletionDispatcher::new(registry.clone(), client)
                .with_completion_timeout(self.completion_timeout)
                .with_stream_connect_timeout(self.stream_connect_timeout),
            resolver,
            registry,
            prompt_builder: self
                .prompt_builder
                .unwrap_or_else(|| Arc::new(StaticPromptBuilder)),
            system_prompt: Arc::from(self.system_prompt),
            default_temperature: self.default_temperature,
            body_limit: self.body_limit,
        }
    }
}
