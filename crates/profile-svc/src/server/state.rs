//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use fieldcrypt::{FieldCipher, PathGroup};

use crate::store::ProfileStore;

/// Application state shared across all request handlers.
///
/// All fields are `Arc`-wrapped so that Axum can clone the state for each
/// request without copying the key or the policy.
#[derive(Clone)]
pub struct AppState {
    /// Field cipher holding the service key.
    pub cipher: Arc<FieldCipher>,
    /// Active path-group policy.
    pub groups: Arc<Vec<PathGroup>>,
    /// Sealed profile records.
    pub store: Arc<dyn ProfileStore>,
}

impl AppState {
    /// Create a new [`AppState`].
    pub fn new(cipher: FieldCipher, groups: Vec<PathGroup>, store: Arc<dyn ProfileStore>) -> Self {
        Self {
            cipher: Arc::new(cipher),
            groups: Arc::new(groups),
            store,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State with a fresh random key, the default policy and an empty
    /// in-memory store.
    pub fn for_tests() -> Self {
        Self::with_store(Arc::new(crate::store::MemoryProfileStore::new()))
    }

    /// Like [`AppState::for_tests`], over the given store.
    pub fn with_store(store: Arc<dyn ProfileStore>) -> Self {
        Self::new(
            FieldCipher::new(fieldcrypt::FieldKey::generate()),
            crate::policy::default_groups().unwrap(),
            store,
        )
    }
}
