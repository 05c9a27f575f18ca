//! External asset-fetch collaborator boundary
//!
//! The script parser does not retrieve bytes itself; it asks an
//! [`AssetSource`] to schedule retrieval and patches descriptors when the
//! paired completion fires. A completion delivers its resource at most once.

use std::sync::{Arc, Mutex};

use super::materials::texture::TextureImage;

/// Kind tag attached to collaborator requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Texture image resource
    Texture,
}

type Callback = Box<dyn FnOnce(TextureImage) + Send + 'static>;

#[derive(Default)]
struct CompletionState {
    callback: Option<Callback>,
    /// Result that arrived before a callback was registered
    delivered: Option<TextureImage>,
    fired: bool,
}

/// Requester side of an in-flight asset request.
///
/// Supports registering exactly one completion callback, which may never be
/// invoked if the source drops the request.
pub struct RequestHandle {
    state: Arc<Mutex<CompletionState>>,
}

impl RequestHandle {
    /// Create a connected handle/completion pair. The collaborator keeps the
    /// [`Completion`] and hands the handle back to the requester.
    pub fn pair() -> (Self, Completion) {
        let state = Arc::new(Mutex::new(CompletionState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            Completion { state },
        )
    }

    /// Register the single completion callback.
    ///
    /// If the completion already fired, the callback runs immediately with
    /// the delivered resource.
    pub fn on_complete<F>(self, callback: F)
    where
        F: FnOnce(TextureImage) + Send + 'static,
    {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(image) = state.delivered.take() {
            drop(state);
            callback(image);
        } else {
            state.callback = Some(Box::new(callback));
        }
    }
}

/// Producer side held by the collaborator.
pub struct Completion {
    state: Arc<Mutex<CompletionState>>,
}

impl Completion {
    /// Deliver the resolved resource. Only the first call has any effect.
    pub fn fire(&self, image: TextureImage) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.fired {
            log::debug!("asset completion fired more than once, ignoring");
            return;
        }
        state.fired = true;

        if let Some(callback) = state.callback.take() {
            drop(state);
            callback(image);
        } else {
            state.delivered = Some(image);
        }
    }
}

/// Collaborator that retrieves named asset bytes on its own schedule.
pub trait AssetSource {
    /// Request an asset by name.
    ///
    /// Returning `None` means the request cannot be scheduled; no completion
    /// will ever fire and the requester keeps whatever default it holds.
    fn request(&mut self, name: &str, kind: AssetKind) -> Option<RequestHandle>;
}

/// Source that never schedules anything.
///
/// Useful for parsing scripts when no retrieval backend is wired up; texture
/// slots keep the placeholder indefinitely.
#[derive(Debug, Default)]
pub struct NullAssetSource;

impl AssetSource for NullAssetSource {
    fn request(&mut self, _name: &str, _kind: AssetKind) -> Option<RequestHandle> {
        None
    }
}
