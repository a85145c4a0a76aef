//! Request types for the gateway.
//!
//! A [`CompletionRequest`] is what the dispatcher sends to one backend: the
//! resolved model reference, the ordered conversation and the generation
//! parameters.

use crate::error::{GatewayError, GatewayResult};
use crate::model::ModelReference;
use serde::{Deserialize, Serialize};

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Check that a sampling temperature lies in `0.0..=2.0`
///
/// # Errors
/// Returns a validation error naming the `temperature` field
pub fn validate_temperature(temperature: f32) -> GatewayResult<f32> {
    if (0.0..=2.0).contains(&temperature) {
        Ok(temperature)
    } else {
        Err(GatewayError::validation(
            format!("temperature must be between 0.0 and 2.0, got {temperature}"),
            Some("temperature".into()),
        ))
    }
}

/// Role of a chat participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions
    System,
    /// End user turn
    User,
    /// Model turn
    Assistant,
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who produced the message
    pub role: MessageRole,
    /// Text content
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an explicit role
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// A completion request bound to one backend
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Conversation in turn order
    pub messages: Vec<ChatMessage>,
    /// Resolved model reference
    pub model_ref: ModelReference,
    /// Sampling temperature
    pub temperature: f32,
    /// Whether the backend should stream its answer
    pub stream: bool,
}

impl CompletionRequest {
    /// Create a new builder for `CompletionRequest`
    #[must_use]
    pub fn builder() -> CompletionRequestBuilder {
        CompletionRequestBuilder::default()
    }
}

/// Builder for [`CompletionRequest`]
#[derive(Debug, Default)]
pub struct CompletionRequestBuilder {
    messages: Vec<ChatMessage>,
    model_ref: Option<ModelReference>,
    temperature: Option<f32>,
    stream: bool,
}

impl CompletionRequestBuilder {
    /// Set the resolved model reference
    #[must_use]
    pub fn model_ref(mut self, model_ref: ModelReference) -> Self {
        self.model_ref = Some(model_ref);
        self
    }

    /// Append a message
    #[must_use]
    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Replace all messages
    #[must_use]
    pub fn messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Enable or disable streaming
    #[must_use]
    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Build the request
    ///
    /// # Errors
    /// Returns error if the model reference or messages are missing, or the
    /// temperature is outside `0.0..=2.0`
    pub fn build(self) -> GatewayResult<CompletionRequest> {
        let model_ref = self
            .model_ref
            .ok_or_else(|| GatewayError::validation("model is required", Some("model".into())))?;

        if self.messages.is_empty() {
            return Err(GatewayError::validation(
                "messages cannot be empty",
                Some("messages".into()),
            ));
        }

        let temperature = validate_temperature(self.temperature.unwrap_or(DEFAULT_TEMPERATURE))?;

        Ok(CompletionRequest {
            messages: self.messages,
            model_ref,
            temperature,
            stream: self.stream,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::builder()
            .model_ref(ModelReference::new("openai", "gpt-4"))
            .message(ChatMessage::system("You are helpful"))
            .message(ChatMessage::user("Hello"))
            .temperature(0.2)
            .build()
            .expect("should build");

        assert_eq!(request.model_ref.real_model, "gpt-4");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
        assert!(!request.stream);
    }

    #[test]
    fn test_request_builder_default_temperature() {
        let request = CompletionRequest::builder()
            .model_ref(ModelReference::new("openai", "gpt-4"))
            .message(ChatMessage::user("Hello"))
            .build()
            .expect("should build");

        assert!((request.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_request_builder_missing_model() {
        let request = CompletionRequest::builder()
            .message(ChatMessage::user("Hello"))
            .build();

        assert!(request.is_err());
    }

    #[test]
    fn test_request_builder_missing_messages() {
        let request = CompletionRequest::builder()
            .model_ref(ModelReference::new("openai", "gpt-4"))
            .build();

        assert!(request.is_err());
    }

    #[test]
    fn test_request_builder_invalid_temperature() {
        let request = CompletionRequest::builder()
            .model_ref(ModelReference::new("openai", "gpt-4"))
            .message(ChatMessage::user("Hello"))
            .temperature(3.0)
            .build();

        assert!(request.is_err());
    }

    #[test]
    fn test_validate_temperature_bounds() {
        assert!(validate_temperature(0.0).is_ok());
        assert!(validate_temperature(2.0).is_ok());
        assert!(validate_temperature(-0.1).is_err());
        assert!(validate_temperature(f32::NAN).is_err());
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(ChatMessage::assistant("Hi there!")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "Hi there!");

        let parsed: ChatMessage =
            serde_json::from_str(r#"{"role":"system","content":"be brief"}"#).unwrap();
        assert_eq!(parsed, ChatMessage::system("be brief"));
    }
}
