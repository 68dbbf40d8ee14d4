//! Prompt-to-image relay and client
//!
//! A small HTTP relay that forwards text prompts to a hosted text-to-image
//! API while keeping the credential server-side, and a client that submits
//! prompts, keeps the returned images in local storage and saves them to disk.

pub mod client;
pub mod config;
pub mod error;
pub mod mime;
pub mod models;
pub mod provider;
pub mod relay;

pub use error::{Error, Result};
