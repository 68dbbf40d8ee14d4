//! Text-to-image provider integration
//!
//! The relay talks to the hosted generation API through [`ImageGenerationService`]
//! so handlers can be exercised against a mock.

pub mod mock;
pub mod stability;

pub use mock::MockImageGenerationClient;
pub use stability::{GenerationParams, StabilityClient};

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Generate images for `prompt`, returned as base64-encoded payloads.
    async fn generate_images(&self, prompt: &str) -> Result<Vec<String>>;
}
