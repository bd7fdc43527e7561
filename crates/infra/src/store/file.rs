//! File-backed record store.
//!
//! Layout: `<root>/<job id>/metadata.json` and `<root>/<job id>/state.json`.
//! Every write goes to a temp file in the job directory, is fsynced and then
//! renamed over the target, so a reader sees either the old or the new record
//! and a successful `put_*` is on disk.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::debug;

use printmaps_core::{JobId, MapMetadata, MapState};

use super::{RecordStore, StoreError};

const METADATA_FILE: &str = "metadata.json";
const STATE_FILE: &str = "state.json";

#[derive(Debug, Clone)]
pub struct FileRecordStore {
    root: PathBuf,
}

impl FileRecordStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    fn job_dir(&self, id: JobId) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn write<T: Serialize>(&self, id: JobId, file: &str, record: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(record).map_err(|source| StoreError::Encode { id, source })?;
        let dir = self.job_dir(id);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let path = dir.join(file);
        write_atomic(&dir, &path, &bytes).map_err(|e| StoreError::io(&path, e))?;
        debug!(job_id = %id, path = %path.display(), "record written");
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, id: JobId, file: &str) -> Result<Option<T>, StoreError> {
        let path = self.job_dir(id).join(file);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { path, source })
    }
}

impl RecordStore for FileRecordStore {
    fn put_metadata(&self, metadata: &MapMetadata) -> Result<(), StoreError> {
        self.write(metadata.id, METADATA_FILE, metadata)
    }

    fn get_metadata(&self, id: JobId) -> Result<Option<MapMetadata>, StoreError> {
        self.read(id, METADATA_FILE)
    }

    fn put_state(&self, state: &MapState) -> Result<(), StoreError> {
        self.write(state.id, STATE_FILE, state)
    }

    fn get_state(&self, id: JobId) -> Result<Option<MapState>, StoreError> {
        self.read(id, STATE_FILE)
    }

    fn exists(&self, id: JobId) -> Result<bool, StoreError> {
        let path = self.job_dir(id).join(METADATA_FILE);
        path.try_exists().map_err(|e| StoreError::io(&path, e))
    }
}

/// Replace `path` with `bytes` via temp file + fsync + rename inside `dir`.
pub(crate) fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    sync_dir(dir)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
