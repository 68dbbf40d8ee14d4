//! HTTP relay in front of the image provider
//!
//! Exposes `POST /generate-image`, keeps the provider credential server-side
//! and retains nothing between requests.

pub mod server;

pub use server::{router, serve, RelayState, GENERATION_FAILED};
