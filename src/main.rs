//! # Model Gateway
//!
//! OpenAI-compatible gateway that routes `<backend>:<model>` requests to
//! configured OpenAI-style backends, augmenting the user's question with
//! retrieved context first.
//!
//! ## Usage
//!
//! ```bash
//! # Start with ./config.toml
//! model-gateway
//!
//! # Start with a custom config file
//! GATEWAY_CONFIG=/etc/gateway/config.yaml model-gateway
//!
//! # Start with environment overrides
//! GATEWAY_PORT=9000 GATEWAY_LOG_LEVEL=debug model-gateway
//! ```

use anyhow::Context;
use gateway_config::{load_config, GatewayConfig};
use gateway_core::PromptBuilder;
use gateway_integrations::{InstructionPromptBuilder, RemotePromptBuilder, StaticContext};
use gateway_providers::{build_http_client, BackendRegistry};
use gateway_server::{AppState, Server, ServerConfig};
use gateway_telemetry::{init_logging, LoggingConfig};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Application entry point
#[tokio::main]
async fn main() {
    let config = match load_config().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&LoggingConfig::from_settings(&config.logging)) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting model gateway"
    );

    if let Err(e) = run(config).await {
        error!(error = format!("{e:#}"), "Application failed");
        std::process::exit(1);
    }
}

/// Main application logic
async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    info!(
        host = %config.server.host,
        port = config.server.port,
        backends = config.backends.len(),
        "Configuration loaded"
    );

    let registry = BackendRegistry::from_configs(config.backend_configs()?)
        .context("building backend registry")?;
    if registry.is_empty() {
        warn!("No backends configured, every completion will fail");
    }

    let client = build_http_client(config.timeouts.connect)?;
    let system_prompt = config.settings.load_system_prompt().await;
    let prompt_builder = create_prompt_builder(&config, client.clone())?;
    info!(prompt_builder = prompt_builder.name(), "Prompt builder ready");

    let state = AppState::builder()
        .registry(registry.into_handle())
        .client(client)
        .prompt_builder(prompt_builder)
        .system_prompt(system_prompt)
        .default_temperature(config.settings.temperature)
        .model_namespace(config.model_namespace.clone())
        .models_timeout(config.timeouts.models)
        .completion_timeout(config.timeouts.completion)
        .stream_connect_timeout(config.timeouts.stream_connect)
        .body_limit(config.server.body_limit)
        .build();

    let server_config = ServerConfig::new()
        .with_host(&config.server.host)
        .with_port(config.server.port);

    Server::new(server_config, state).run().await?;

    Ok(())
}

/// Remote retrieval service when an endpoint is configured, local template otherwise
fn create_prompt_builder(
    config: &GatewayConfig,
    client: reqwest::Client,
) -> anyhow::Result<Arc<dyn PromptBuilder>> {
    match &config.rag.endpoint {
        Some(endpoint) => {
            let builder = RemotePromptBuilder::new(endpoint, client)
                .context("configuring retrieval service")?
                .with_timeout(config.rag.timeout);
            Ok(Arc::new(builder))
        }
        None => {
            let context = StaticContext::from_texts(config.rag.context.iter().cloned());
            Ok(Arc::new(InstructionPromptBuilder::new(Arc::new(context))))
        }
    }
}
