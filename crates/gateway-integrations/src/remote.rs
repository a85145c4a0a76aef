//! Remote retrieval service adapter.
//!
//! Delegates prompt assembly to an external service:
//! `POST {endpoint}` with `{"query": "..."}`, answered by `{"prompt": "..."}`.

use crate::error::{IntegrationError, IntegrationResult};
use async_trait::async_trait;
use gateway_core::{GatewayResult, PromptBuilder};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

/// Default deadline for one retrieval call
pub const DEFAULT_RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct RetrievalRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct RetrievalResponse {
    prompt: String,
}

/// Prompt builder backed by a retrieval service
#[derive(Debug, Clone)]
pub struct RemotePromptBuilder {
    endpoint: Url,
    client: Client,
    timeout: Duration,
}

impl RemotePromptBuilder {
    /// Create a builder for the service at `endpoint`
    ///
    /// # Errors
    /// Returns error if the endpoint is not an http(s) URL
    pub fn new(endpoint: &str, client: Client) -> IntegrationResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| IntegrationError::Configuration(format!("Invalid retrieval endpoint '{endpoint}': {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(IntegrationError::Configuration(format!(
                "Retrieval endpoint must use http or https, got '{}'",
                endpoint.scheme()
            )));
        }

        Ok(Self {
            endpoint,
            client,
            timeout: DEFAULT_RETRIEVAL_TIMEOUT,
        })
    }

    /// Set the per-call deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Service endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn fetch(&self, query: &str) -> IntegrationResult<String> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(&RetrievalRequest { query })
            .send()
            .await
            .map_err(|e| IntegrationError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: RetrievalResponse = response
            .json()
            .await
            .map_err(|e| IntegrationError::InvalidResponse(e.to_string()))?;
        Ok(body.prompt)
    }
}

#[async_trait]
impl PromptBuilder for RemotePromptBuilder {
    #[instrument(skip(self, query), fields(endpoint = %self.endpoint))]
    async fn build_prompt(&self, query: &str) -> GatewayResult<String> {
        match self.fetch(query).await {
            Ok(prompt) => {
                debug!(prompt_len = prompt.len(), "Retrieval service built prompt");
                Ok(prompt)
            }
            Err(e) => {
                error!(error = %e, "Retrieval service call failed");
                Err(e.into())
            }
        }
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::GatewayError;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn builder(server: &MockServer) -> RemotePromptBuilder {
        RemotePromptBuilder::new(&format!("{}/build_prompt", server.uri()), Client::new()).unwrap()
    }

    #[tokio::test]
    async fn test_returns_service_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/build_prompt"))
            .and(body_json(json!({"query": "What is RAG?"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"prompt": "[1] ctx\n\n[Question]\nWhat is RAG?"})))
            .expect(1)
            .mount(&server)
            .await;

        let prompt = builder(&server).build_prompt("What is RAG?").await.unwrap();
        assert_eq!(prompt, "[1] ctx\n\n[Question]\nWhat is RAG?");
    }

    #[tokio::test]
    async fn test_error_status_is_prompt_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("rebuilding"))
            .mount(&server)
            .await;

        let err = builder(&server).build_prompt("q").await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::prompt("Retrieval service returned HTTP 503: rebuilding")
        );
    }

    #[tokio::test]
    async fn test_missing_prompt_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"context": []})))
            .mount(&server)
            .await;

        let err = builder(&server).build_prompt("q").await.unwrap_err();
        assert!(matches!(err, GatewayError::Prompt { .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"prompt": "late"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let err = builder(&server)
            .with_timeout(Duration::from_millis(200))
            .build_prompt("q")
            .await
            .unwrap_err();
        match err {
            GatewayError::Prompt { message } => assert!(message.starts_with("Timeout")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(RemotePromptBuilder::new("not a url", Client::new()).is_err());
        assert!(RemotePromptBuilder::new("ftp://rag.local/build", Client::new()).is_err());
    }
}
