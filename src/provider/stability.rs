use super::ImageGenerationService;
use crate::config::DEFAULT_STABILITY_BASE_URL;
use crate::models::{TextPrompt, TextToImageRequest, TextToImageResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;

const ENGINE_ID: &str = "stable-diffusion-xl-1024-v1-0";

/// Generation settings sent with every request. Callers cannot override them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub cfg_scale: f32,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub samples: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            cfg_scale: 7.0,
            width: 1024,
            height: 1024,
            steps: 30,
            samples: 1,
        }
    }
}

pub struct StabilityClient {
    client: Client,
    api_key: String,
    base_url: String,
    params: GenerationParams,
}

impl StabilityClient {
    pub fn new(api_key: String) -> Self {
        Self::new_with_client(api_key, Client::new())
    }

    pub fn new_with_client(api_key: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_STABILITY_BASE_URL.to_string(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/generation/{}/text-to-image",
            self.base_url, ENGINE_ID
        )
    }

    async fn text_to_image(&self, request: &TextToImageRequest) -> Result<TextToImageResponse> {
        tracing::debug!("Sending text-to-image request to Stability");

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Stability: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Stability API error (status {}): {}", status, error_text);
            return Err(Error::Provider(format!(
                "Stability API error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Stability response: {}", e);
            Error::Provider(format!("Failed to parse Stability response: {}", e))
        })
    }
}

#[async_trait]
impl ImageGenerationService for StabilityClient {
    async fn generate_images(&self, prompt: &str) -> Result<Vec<String>> {
        let request = TextToImageRequest {
            text_prompts: vec![TextPrompt {
                text: prompt.to_string(),
            }],
            cfg_scale: self.params.cfg_scale,
            width: self.params.width,
            height: self.params.height,
            steps: self.params.steps,
            samples: self.params.samples,
        };

        let response = self.text_to_image(&request).await?;

        tracing::debug!(
            "Stability returned {} artifact(s)",
            response.artifacts.len()
        );

        Ok(response
            .artifacts
            .into_iter()
            .map(|artifact| artifact.base64)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEXT_TO_IMAGE_PATH: &str = "/v1/generation/stable-diffusion-xl-1024-v1-0/text-to-image";

    fn make_client(server: &MockServer, api_key: &str) -> StabilityClient {
        StabilityClient::new(api_key.to_string()).with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_generate_images_parses_artifacts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(TEXT_TO_IMAGE_PATH))
            .and(header("Authorization", "Bearer test-key"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "artifacts": [
                    { "base64": "QUJD", "seed": 1, "finishReason": "SUCCESS" }
                ]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key");

        let images = client.generate_images("a red cube").await.unwrap();
        assert_eq!(images, vec!["QUJD".to_string()]);
    }

    #[tokio::test]
    async fn test_request_uses_fixed_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(TEXT_TO_IMAGE_PATH))
            .and(body_partial_json(serde_json::json!({
                "text_prompts": [{ "text": "a red cube" }],
                "cfg_scale": 7.0,
                "width": 1024,
                "height": 1024,
                "steps": 30,
                "samples": 1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "artifacts": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "key");

        let images = client.generate_images("a red cube").await.unwrap();
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_returns_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(TEXT_TO_IMAGE_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = make_client(&server, "bad-key");

        let err = client.generate_images("a red cube").await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[tokio::test]
    async fn test_missing_artifacts_returns_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(TEXT_TO_IMAGE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "something-else"
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "key");

        let err = client.generate_images("a red cube").await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[tokio::test]
    async fn test_unreachable_provider_returns_http_error() {
        // Nothing listens on port 1.
        let client =
            StabilityClient::new("key".to_string()).with_base_url("http://127.0.0.1:1".to_string());

        let err = client.generate_images("a red cube").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn test_default_params() {
        let params = GenerationParams::default();
        assert_eq!(params.width, params.height);
        assert_eq!(params.steps, 30);
        assert_eq!(params.samples, 1);
    }
}
