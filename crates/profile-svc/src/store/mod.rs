//! Profile record storage.
//!
//! Records are stored exactly as [`Profile::to_record`](crate::model::Profile::to_record)
//! writes them: sealed fields hold base64 blobs, never plaintext.

pub mod memory;

pub use memory::MemoryProfileStore;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use common::ServiceError;

/// Errors from a profile store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with this id already exists.
    #[error("profile {0} already exists")]
    Duplicate(Uuid),

    /// The backing store cannot serve requests right now.
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(_) => ServiceError::Internal("profile id collision".into()),
            StoreError::Unavailable(_) => {
                ServiceError::Unavailable("profile store unavailable".into())
            }
        }
    }
}

/// Persistence seam for sealed profile records.
#[cfg_attr(test, mockall::automock)]
pub trait ProfileStore: Send + Sync {
    /// Store a new record under `id`.
    fn insert(&self, id: Uuid, record: Value) -> Result<(), StoreError>;

    /// Fetch the record stored under `id`, if any.
    fn get(&self, id: Uuid) -> Result<Option<Value>, StoreError>;

    /// Every stored record, ordered by id.
    fn list(&self) -> Result<Vec<(Uuid, Value)>, StoreError>;

    /// Number of stored records.
    fn count(&self) -> Result<usize, StoreError>;
}
