//! HTTP request handlers for the gateway API.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures::stream::StreamExt;
use gateway_core::{validate_temperature, ChatMessage, CompletionRequest, ModelsResponse};
use gateway_providers::ensure_sentinel;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::convert::Infallible;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::{
    error::ApiError,
    extractors::{JsonBody, RequestId},
    state::AppState,
};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Version
    pub version: &'static str,
}

/// Liveness probe
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// `ready` or `not_ready`
    pub status: &'static str,
    /// Registered backend count
    pub backends: usize,
}

/// Readiness probe: ready once at least one backend is registered
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let backends = state.registry.load().len();

    if backends > 0 {
        (StatusCode::OK, Json(ReadinessResponse { status: "ready", backends }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse { status: "not_ready", backends }),
        )
    }
}

/// List models endpoint (OpenAI compatible)
#[instrument(skip(state))]
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse::new(state.catalog.list_models().await))
}

/// Incoming chat message. Only the content of the last one is used.
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    /// Plain text or an array of content parts
    #[serde(default)]
    pub content: Value,
}

impl IncomingMessage {
    /// Text of the message; content parts are concatenated
    #[must_use]
    pub fn text(&self) -> String {
        match &self.content {
            Value::String(text) => text.clone(),
            Value::Array(parts) => parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(""),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Chat completion request body (OpenAI compatible)
#[derive(Debug, Deserialize)]
pub struct ChatCompletionBody {
    /// `<backend>:<model>`
    #[serde(default)]
    pub model: Option<String>,
    /// Conversation
    #[serde(default)]
    pub messages: Option<Vec<IncomingMessage>>,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Stream the answer as SSE; `null` means no
    #[serde(default)]
    pub stream: Option<bool>,
}

impl ChatCompletionBody {
    /// Whether the client asked for a streamed answer
    #[must_use]
    pub fn wants_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}

/// Chat completion endpoint.
///
/// The last message is augmented by the prompt builder and sent together
/// with the configured system prompt; earlier turns are not forwarded.
#[instrument(skip(state, body), fields(request_id = %request_id, model = tracing::field::Empty, stream = body.wants_stream()))]
pub async fn chat_completion(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    JsonBody(body): JsonBody<ChatCompletionBody>,
) -> Result<Response, ApiError> {
    let model = body
        .model
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required field: model"))?;
    tracing::Span::current().record("model", model);

    let query = body
        .messages
        .as_ref()
        .and_then(|messages| messages.last())
        .map(IncomingMessage::text)
        .ok_or_else(|| ApiError::bad_request("Missing required field: messages"))?;

    let model_ref = state.resolver.resolve(model)?;
    let temperature = validate_temperature(body.temperature.unwrap_or(state.default_temperature))?;

    let start = Instant::now();
    let augmented = state.prompt_builder.build_prompt(&query).await?;
    debug!(
        prompt_builder = state.prompt_builder.name(),
        query_len = query.len(),
        prompt_len = augmented.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Prompt built"
    );

    let request = CompletionRequest::builder()
        .model_ref(model_ref)
        .message(ChatMessage::system(state.system_prompt.as_ref()))
        .message(ChatMessage::user(augmented))
        .temperature(temperature)
        .stream(body.wants_stream())
        .build()?;

    if request.stream {
        let chunks = state.dispatcher.stream_complete(&request).await?;
        info!(backend = %request.model_ref.backend, "Relaying completion stream");

        let frames = ensure_sentinel(chunks)
            .map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk.to_frame())));

        return Ok((
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            Body::from_stream(frames),
        )
            .into_response());
    }

    let body = state.dispatcher.complete(&request).await?;
    info!(
        backend = %request.model_ref.backend,
        duration_ms = start.elapsed().as_millis(),
        "Chat completion successful"
    );
    Ok(Json(body).into_response())
}
