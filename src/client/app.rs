//! Client state machine: prompt editing, submission, deletion, persistence.

use super::normalize::normalize_images;
use super::relay::RelayService;
use super::storage::{StateStore, IMAGES_KEY, PROMPT_KEY};
use crate::models::ImageRecord;
use crate::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

pub const BLANK_PROMPT_MESSAGE: &str = "Please enter a prompt first.";
pub const NO_IMAGE_MESSAGE: &str = "No image returned from server.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong while generating.";

/// Everything the user can see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    pub prompt: String,
    /// Newest first.
    pub images: Vec<ImageRecord>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Another submission was in flight, or the key did not trigger one.
    Ignored,
    /// Blank prompt; no relay call was made.
    Rejected,
    /// The relay returned this many images, all prepended.
    Generated(usize),
    /// The relay succeeded but returned no usable image.
    Empty,
    /// The relay call failed; the message is in `ClientState::error`.
    Failed,
}

pub struct ClientApp {
    state: Mutex<ClientState>,
    relay: Arc<dyn RelayService>,
    store: Arc<dyn StateStore>,
}

impl ClientApp {
    /// Restore persisted state and wire up the relay.
    ///
    /// A missing prompt slot loads as empty text. A missing, unreadable or
    /// non-array image slot loads as an empty list; array elements that are
    /// not image records are skipped.
    pub fn load(relay: Arc<dyn RelayService>, store: Arc<dyn StateStore>) -> Result<Self> {
        let prompt = store.get(PROMPT_KEY)?.unwrap_or_default();
        let images = match store.get(IMAGES_KEY) {
            Ok(Some(raw)) => parse_images(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read stored images: {}. Starting empty.", e);
                Vec::new()
            }
        };

        info!("Loaded client state with {} stored image(s)", images.len());

        Ok(Self {
            state: Mutex::new(ClientState {
                prompt,
                images,
                loading: false,
                error: None,
            }),
            relay,
            store,
        })
    }

    pub fn snapshot(&self) -> ClientState {
        self.lock().clone()
    }

    /// Replace the prompt text and persist it.
    pub fn set_prompt(&self, prompt: &str) -> Result<()> {
        self.lock().prompt = prompt.to_string();
        self.store.set(PROMPT_KEY, prompt)
    }

    pub fn can_generate(&self) -> bool {
        let state = self.lock();
        !state.prompt.trim().is_empty() && !state.loading
    }

    pub fn dismiss_error(&self) {
        self.lock().error = None;
    }

    /// Submit on an "Enter" key press when a submission is allowed.
    pub async fn submit_on_key(&self, key: &str) -> Result<SubmitOutcome> {
        if key == "Enter" && self.can_generate() {
            self.submit().await
        } else {
            Ok(SubmitOutcome::Ignored)
        }
    }

    /// Send the trimmed prompt to the relay and fold the answer into state.
    ///
    /// At most one submission runs at a time; a call made while another is
    /// in flight returns [`SubmitOutcome::Ignored`] without touching the relay.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let prompt = {
            let mut state = self.lock();
            if state.loading {
                return Ok(SubmitOutcome::Ignored);
            }

            let prompt = state.prompt.trim().to_string();
            if prompt.is_empty() {
                state.error = Some(BLANK_PROMPT_MESSAGE.to_string());
                return Ok(SubmitOutcome::Rejected);
            }

            state.loading = true;
            state.error = None;
            prompt
        };

        info!("Submitting prompt ({} chars)", prompt.len());
        let result = self.relay.generate(&prompt).await;

        let mut state = self.lock();
        state.loading = false;

        match result {
            Ok(body) => {
                let urls = normalize_images(&body);
                if urls.is_empty() {
                    warn!("Relay returned no usable image");
                    state.error = Some(NO_IMAGE_MESSAGE.to_string());
                    return Ok(SubmitOutcome::Empty);
                }

                let count = urls.len();
                let mut images: Vec<ImageRecord> = urls.into_iter().map(ImageRecord::new).collect();
                images.extend(state.images.iter().cloned());

                self.persist_images(&images).inspect_err(|e| {
                    state.error = Some(save_failure_message(e));
                })?;
                state.images = images;

                info!("Added {} image(s), {} stored", count, state.images.len());
                Ok(SubmitOutcome::Generated(count))
            }
            Err(e) => {
                warn!("Generation failed: {}", e);
                state.error = Some(failure_message(&e));
                Ok(SubmitOutcome::Failed)
            }
        }
    }

    /// Remove the image at `index`. Out-of-range positions are ignored.
    pub fn delete(&self, index: usize) -> Result<bool> {
        let mut state = self.lock();
        if index >= state.images.len() {
            return Ok(false);
        }

        let mut images = state.images.clone();
        images.remove(index);

        self.persist_images(&images).inspect_err(|e| {
            state.error = Some(save_failure_message(e));
        })?;
        state.images = images;
        Ok(true)
    }

    /// Memory is only updated after the store accepts the new list, so a
    /// failed write leaves both sides as they were.
    fn persist_images(&self, images: &[ImageRecord]) -> Result<()> {
        let json = serde_json::to_string(images)?;
        self.store
            .set(IMAGES_KEY, &json)
            .inspect_err(|e| warn!("Could not save images: {}", e))
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        // A poisoned lock only means a panic elsewhere; the state itself is
        // always left consistent.
        self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn parse_images(raw: &str) -> Vec<ImageRecord> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => {
            let total = items.len();
            let images: Vec<ImageRecord> = items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect();

            let skipped = total - images.len();
            if skipped > 0 {
                warn!("Skipped {} malformed stored image(s)", skipped);
            }
            images
        }
        Ok(_) => {
            warn!("Stored images are not a list. Starting empty.");
            Vec::new()
        }
        Err(e) => {
            warn!("Stored images are corrupt: {}. Starting empty.", e);
            Vec::new()
        }
    }
}

fn save_failure_message(error: &Error) -> String {
    format!("Could not save images: {}", error)
}

fn failure_message(error: &Error) -> String {
    let message = match error {
        Error::Relay(message) => message.clone(),
        Error::Http(e) => e.to_string(),
        _ => String::new(),
    };

    if message.trim().is_empty() {
        GENERIC_FAILURE_MESSAGE.to_string()
    } else {
        message
    }
}
