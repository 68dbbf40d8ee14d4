//! Client application
//!
//! Owns the prompt, the generated image list and the loading/error flags,
//! talks to the relay and keeps everything in an injected [`StateStore`].

pub mod app;
pub mod download;
pub mod normalize;
pub mod relay;
pub mod storage;

pub use app::{ClientApp, ClientState, SubmitOutcome};
pub use download::{download_file_name, extension_for, save_image};
pub use normalize::normalize_images;
pub use relay::{HttpRelayClient, MockRelayClient, RelayService};
pub use storage::{FileStateStore, MemoryStateStore, StateStore};
