//! Durable keyed storage for the two records of a job.
//!
//! Each job id owns at most one metadata record and one state record. Writes
//! replace the whole record. The store does no locking of its own; callers
//! serialize writes per job (see [`crate::locks::JobLocks`]).

use std::path::PathBuf;
use std::sync::Arc;

use printmaps_core::{JobId, MapMetadata, MapState};

pub mod file;
pub mod memory;

pub use file::FileRecordStore;
pub use memory::InMemoryRecordStore;

/// Record store abstraction.
pub trait RecordStore: Send + Sync {
    /// Create or overwrite the metadata record of `metadata.id`.
    fn put_metadata(&self, metadata: &MapMetadata) -> Result<(), StoreError>;

    fn get_metadata(&self, id: JobId) -> Result<Option<MapMetadata>, StoreError>;

    /// Create or overwrite the state record of `state.id`.
    fn put_state(&self, state: &MapState) -> Result<(), StoreError>;

    fn get_state(&self, id: JobId) -> Result<Option<MapState>, StoreError>;

    /// Whether a job with this id was created (its metadata exists).
    fn exists(&self, id: JobId) -> Result<bool, StoreError>;
}

impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    fn put_metadata(&self, metadata: &MapMetadata) -> Result<(), StoreError> {
        (**self).put_metadata(metadata)
    }

    fn get_metadata(&self, id: JobId) -> Result<Option<MapMetadata>, StoreError> {
        (**self).get_metadata(id)
    }

    fn put_state(&self, state: &MapState) -> Result<(), StoreError> {
        (**self).put_state(state)
    }

    fn get_state(&self, id: JobId) -> Result<Option<MapState>, StoreError> {
        (**self).get_state(id)
    }

    fn exists(&self, id: JobId) -> Result<bool, StoreError> {
        (**self).exists(id)
    }
}

/// Record store error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt record at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("record for job {id} could not be encoded: {source}")]
    Encode {
        id: JobId,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
