//! Process configuration for the relay and the client.
//!
//! Both are read once at startup from the environment (and `.env`).

use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_STABILITY_BASE_URL: &str = "https://api.stability.ai";
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3001";
pub const DEFAULT_STATE_DIR: &str = ".promptpix";

#[derive(Clone)]
pub struct RelayConfig {
    pub stability_api_key: String,
    pub port: u16,
    pub stability_base_url: String,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let stability_api_key = std::env::var("STABILITY_API_KEY")
            .map_err(|_| Error::Config("STABILITY_API_KEY not set".to_string()))?;

        let port = match std::env::var("PORT") {
            Ok(raw) => parse_port(&raw)?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            stability_api_key,
            port,
            stability_base_url: std::env::var("STABILITY_API_BASE")
                .unwrap_or_else(|_| DEFAULT_STABILITY_BASE_URL.to_string()),
        })
    }
}

// The key must never end up in logs.
impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("stability_api_key", &"<redacted>")
            .field("port", &self.port)
            .field("stability_base_url", &self.stability_base_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub relay_url: String,
    pub state_dir: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            relay_url: std::env::var("RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string()),
            state_dir: std::env::var("PROMPTPIX_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_DIR)),
        }
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid PORT '{}'", raw)))
}
