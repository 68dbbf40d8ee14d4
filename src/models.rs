//! Data models and structures
//!
//! Wire types for the relay endpoint and the Stability text-to-image API,
//! plus the image records the client persists.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

// Relay request/response models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationResponse {
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

/// A generated image as stored by the client, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub data_url: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl ImageRecord {
    pub fn new(data_url: String) -> Self {
        Self {
            data_url,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Media type declared in the data URL, if any.
    pub fn media_type(&self) -> Option<&str> {
        let rest = self.data_url.strip_prefix("data:")?;
        let (mime, _) = rest.split_once(";base64,")?;
        Some(mime)
    }

    pub fn created_at_display(&self) -> String {
        Utc.timestamp_millis_opt(self.created_at)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| self.created_at.to_string())
    }
}

// Stability API request/response models
#[derive(Debug, Serialize)]
pub struct TextToImageRequest {
    pub text_prompts: Vec<TextPrompt>,
    pub cfg_scale: f32,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub samples: u32,
}

#[derive(Debug, Serialize)]
pub struct TextPrompt {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct TextToImageResponse {
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub base64: String,
    pub seed: Option<u64>,
    pub finish_reason: Option<String>,
}
