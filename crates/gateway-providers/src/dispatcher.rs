//! Completion dispatch to a single backend.
//!
//! The upstream payload is the OpenAI chat shape with the real model name.
//! Non-streaming answers are returned as the backend's JSON untouched;
//! streaming answers are relayed line by line through [`relay_sse`].

use crate::registry::RegistryHandle;
use crate::relay::relay_sse;
use futures_util::StreamExt;
use gateway_config::BackendConfig;
use gateway_core::{ChatMessage, ChunkStream, CompletionRequest, GatewayError, GatewayResult};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Default deadline for a full non-streaming completion
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(20);

/// Default deadline for a streaming backend to send its response head
pub const DEFAULT_STREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct UpstreamPayload<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

impl<'a> UpstreamPayload<'a> {
    fn new(request: &'a CompletionRequest, stream: bool) -> Self {
        Self {
            model: &request.model_ref.real_model,
            messages: &request.messages,
            temperature: request.temperature,
            stream,
        }
    }
}

/// Sends completion requests to the backend named in the model reference
#[derive(Debug, Clone)]
pub struct CompletionDispatcher {
    registry: RegistryHandle,
    client: Client,
    completion_timeout: Duration,
    stream_connect_timeout: Duration,
}

impl CompletionDispatcher {
    /// Create a dispatcher over a registry
    #[must_use]
    pub fn new(registry: RegistryHandle, client: Client) -> Self {
        Self {
            registry,
            client,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            stream_connect_timeout: DEFAULT_STREAM_CONNECT_TIMEOUT,
        }
    }

    /// Set the non-streaming completion deadline
    #[must_use]
    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// Set the deadline for a streaming response to start
    #[must_use]
    pub fn with_stream_connect_timeout(mut self, timeout: Duration) -> Self {
        self.stream_connect_timeout = timeout;
        self
    }

    fn backend(&self, request: &CompletionRequest) -> GatewayResult<BackendConfig> {
        self.registry
            .load()
            .lookup(&request.model_ref.backend)
            .cloned()
    }

    fn post(&self, backend: &BackendConfig, payload: &UpstreamPayload<'_>) -> RequestBuilder {
        let mut builder = self
            .client
            .post(backend.api_url().clone())
            .header("Content-Type", "application/json")
            .json(payload);
        if let Some(key) = backend.api_key() {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    /// Run a non-streaming completion and return the backend's JSON body.
    ///
    /// # Errors
    /// - [`GatewayError::UnknownBackend`] if the backend is not registered
    /// - [`GatewayError::Timeout`] if the backend misses the deadline
    /// - [`GatewayError::Upstream`] on transport failure, non-2xx status or
    ///   a body that is not JSON
    #[instrument(skip(self, request), fields(backend = %request.model_ref.backend, model = %request.model_ref.real_model))]
    pub async fn complete(&self, request: &CompletionRequest) -> GatewayResult<Value> {
        let backend = self.backend(request)?;
        let name = backend.name();
        let payload = UpstreamPayload::new(request, false);

        debug!(messages = request.messages.len(), temperature = request.temperature, "Sending completion");

        let response = self
            .post(&backend, &payload)
            .timeout(self.completion_timeout)
            .send()
            .await
            .map_err(|e| self.send_error(name, self.completion_timeout, &e))?;

        let response = check_status(name, response).await?;

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::timeout(name, self.completion_timeout)
            } else {
                GatewayError::upstream(name, None, format!("Failed to parse response: {e}"))
            }
        })?;

        info!("Completion finished");
        Ok(body)
    }

    /// Start a streaming completion.
    ///
    /// Errors are only reported before the first byte is relayed; once the
    /// stream is returned, failures end it early instead.
    ///
    /// # Errors
    /// - [`GatewayError::UnknownBackend`] if the backend is not registered
    /// - [`GatewayError::Timeout`] if the response head does not arrive in time
    /// - [`GatewayError::Upstream`] on transport failure or non-2xx status
    #[instrument(skip(self, request), fields(backend = %request.model_ref.backend, model = %request.model_ref.real_model))]
    pub async fn stream_complete(&self, request: &CompletionRequest) -> GatewayResult<ChunkStream> {
        let backend = self.backend(request)?;
        let name = backend.name();
        let payload = UpstreamPayload::new(request, true);

        debug!(messages = request.messages.len(), "Opening completion stream");

        let send = self
            .post(&backend, &payload)
            .header("Accept", "text/event-stream")
            .send();

        let response = tokio::time::timeout(self.stream_connect_timeout, send)
            .await
            .map_err(|_| {
                error!(timeout = ?self.stream_connect_timeout, "Stream did not start in time");
                GatewayError::timeout(name, self.stream_connect_timeout)
            })?
            .map_err(|e| self.send_error(name, self.stream_connect_timeout, &e))?;

        let response = check_status(name, response).await?;

        info!("Completion stream opened");
        Ok(relay_sse(name.to_string(), response.bytes_stream()).boxed())
    }

    fn send_error(&self, backend: &str, timeout: Duration, e: &reqwest::Error) -> GatewayError {
        error!(error = %e, "Backend request failed");
        if e.is_timeout() {
            GatewayError::timeout(backend, timeout)
        } else {
            GatewayError::upstream(backend, None, format!("Request failed: {e}"))
        }
    }
}

async fn check_status(backend: &str, response: Response) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(backend = %backend, status = %status, body = %body, "Backend returned error status");
    Err(GatewayError::upstream(backend, Some(status.as_u16()), body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::BackendRegistry;
    use gateway_core::ModelReference;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher(server: &MockServer, key: Option<&str>) -> CompletionDispatcher {
        let backend = BackendConfig::new(
            "openai",
            &format!("{}/v1/chat/completions", server.uri()),
            key.map(String::from),
        )
        .unwrap();
        let registry = BackendRegistry::from_configs([backend]).unwrap();
        CompletionDispatcher::new(registry.into_handle(), Client::new())
    }

    fn request(backend: &str) -> CompletionRequest {
        CompletionRequest::builder()
            .model_ref(ModelReference::new(backend, "gpt-4"))
            .message(ChatMessage::system("Be brief."))
            .message(ChatMessage::user("Hi"))
            .temperature(0.2)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_complete_echoes_backend_body() {
        let server = MockServer::start().await;
        let upstream = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello"}}],
            "vendor_extension": {"kept": true}
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4",
                "temperature": 0.2,
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let body = dispatcher(&server, Some("sk-test")).complete(&request("openai")).await.unwrap();
        assert_eq!(body, upstream);
    }

    #[tokio::test]
    async fn test_complete_omits_stream_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        dispatcher(&server, None).complete(&request("openai")).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
        assert!(sent.get("stream").is_none());
        assert!(received[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_complete_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
            .mount(&server)
            .await;

        let err = dispatcher(&server, None).complete(&request("openai")).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::upstream("openai", Some(500), "internal failure")
        );
    }

    #[tokio::test]
    async fn test_complete_rejects_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = dispatcher(&server, None).complete(&request("openai")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Upstream { status: None, .. }));
    }

    #[tokio::test]
    async fn test_complete_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let err = dispatcher(&server, None)
            .with_completion_timeout(Duration::from_millis(200))
            .complete(&request("openai"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        let server = MockServer::start().await;
        let err = dispatcher(&server, None).complete(&request("missing")).await.unwrap_err();
        assert_eq!(err, GatewayError::unknown_backend("missing"));
    }

    #[tokio::test]
    async fn test_stream_relays_data_lines() {
        let server = MockServer::start().await;
        let body = "data: {\"a\":1}\n\n: keep-alive\n\ndata: {\"b\":2}\n\ndata: [DONE]\n\n";
        Mock::given(method("POST"))
            .and(header("accept", "text/event-stream"))
            .and(body_partial_json(json!({"stream": true, "model": "gpt-4"})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let stream = dispatcher(&server, None).stream_complete(&request("openai")).await.unwrap();
        let lines: Vec<String> = stream.map(|c| c.as_str().to_string()).collect().await;

        assert_eq!(lines, vec!["data: {\"a\":1}", "data: {\"b\":2}", "data: [DONE]"]);
    }

    #[tokio::test]
    async fn test_stream_error_status_before_first_byte() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = dispatcher(&server, None)
            .stream_complete(&request("openai"))
            .await
            .err()
            .unwrap();
        assert_eq!(err, GatewayError::upstream("openai", Some(429), "slow down"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_stream_connect_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("data: [DONE]\n\n", "text/event-stream")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let err = dispatcher(&server, None)
            .with_stream_connect_timeout(Duration::from_millis(200))
            .stream_complete(&request("openai"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, GatewayError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_dropping_stream_closes_upstream_connection() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (closed_tx, closed_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                assert!(n > 0, "client hung up before sending headers");
                request.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\n\
                      content-type: text/event-stream\r\n\
                      transfer-encoding: chunked\r\n\r\n\
                      8\r\ndata: a\n\r\n",
                )
                .await
                .unwrap();

            // Keep the stream open; only the client hanging up ends this loop
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
            let _ = closed_tx.send(());
        });

        let backend = BackendConfig::new("raw", &format!("http://{addr}/v1/chat/completions"), None)
            .unwrap();
        let registry = BackendRegistry::from_configs([backend]).unwrap();
        let dispatcher = CompletionDispatcher::new(registry.into_handle(), Client::new());

        let mut stream = dispatcher.stream_complete(&request("raw")).await.unwrap();
        assert_eq!(stream.next().await.unwrap().as_str(), "data: a");
        drop(stream);

        tokio::time::timeout(Duration::from_secs(5), closed_rx)
            .await
            .expect("upstream connection still open after the stream was dropped")
            .unwrap();
    }
}
