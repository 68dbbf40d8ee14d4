use crate::models::{ErrorResponse, GenerationRequest};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Client-side view of the relay. Returns the raw response body so that
/// [`normalize_images`](super::normalize_images) can deal with its shape.
#[async_trait]
pub trait RelayService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Value>;
}

pub struct HttpRelayClient {
    client: Client,
    base_url: String,
}

impl HttpRelayClient {
    pub fn new(base_url: String) -> Self {
        Self::new_with_client(base_url, Client::new())
    }

    pub fn new_with_client(base_url: String, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RelayService for HttpRelayClient {
    async fn generate(&self, prompt: &str) -> Result<Value> {
        let url = format!("{}/generate-image", self.base_url);
        tracing::debug!("Posting prompt to relay at {}", url);

        let response = self
            .client
            .post(&url)
            .json(&GenerationRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach relay: {}", e);
                e
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!("Relay returned status {}: {}", status, body);
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .ok()
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            return Err(Error::Relay(message));
        }

        // A 2xx body that is not JSON carries no images; the caller reports it
        // as an empty result rather than a failure.
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            tracing::warn!("Relay returned a non-JSON success body: {}", e);
            Value::Null
        }))
    }
}

pub struct MockRelayClient {
    responses: Arc<Mutex<Vec<Value>>>,
    failure: Arc<Mutex<Option<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
    gate: Option<Arc<Notify>>,
}

impl MockRelayClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            gate: None,
        }
    }

    pub fn with_response(self, response: Value) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Every call fails with `Error::Relay(message)`.
    pub fn with_failure(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Calls block until the gate is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockRelayClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayService for MockRelayClient {
    async fn generate(&self, prompt: &str) -> Result<Value> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(Error::Relay(message));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(serde_json::json!({ "images": ["QUJD"] }))
        } else {
            Ok(responses[(count - 1) % responses.len()].clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_returns_raw_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate-image"))
            .and(body_json(serde_json::json!({ "prompt": "a red cube" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "images": ["QUJD"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpRelayClient::new(server.uri());

        let body = client.generate("a red cube").await.unwrap();
        assert_eq!(body, serde_json::json!({ "images": ["QUJD"] }));
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_null() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate-image"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        let client = HttpRelayClient::new(server.uri());

        let body = client.generate("a red cube").await.unwrap();
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_server_error_message_is_extracted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate-image"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "Image generation failed"
            })))
            .mount(&server)
            .await;

        let client = HttpRelayClient::new(format!("{}/", server.uri()));

        let err = client.generate("a red cube").await.unwrap_err();
        assert!(matches!(&err, Error::Relay(message) if message == "Image generation failed"));
    }

    #[tokio::test]
    async fn test_error_without_body_uses_status_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate-image"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = HttpRelayClient::new(server.uri());

        let err = client.generate("a red cube").await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status code 502");
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_http_error() {
        let client = HttpRelayClient::new("http://127.0.0.1:1".to_string());

        let err = client.generate("a red cube").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[tokio::test]
    async fn test_mock_relay_records_prompts() {
        let relay = MockRelayClient::new().with_response(serde_json::json!({ "image": "abc" }));

        let body = relay.generate("first").await.unwrap();
        assert_eq!(body, serde_json::json!({ "image": "abc" }));
        assert_eq!(relay.get_prompts(), vec!["first".to_string()]);
        assert_eq!(relay.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_relay_failure() {
        let relay = MockRelayClient::new().with_failure("boom");

        let err = relay.generate("x").await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
