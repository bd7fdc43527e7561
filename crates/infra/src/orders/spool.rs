use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{BuildOrder, OrderQueue, QueueError};
use crate::store::file::write_atomic;

/// Spools each order as `<dir>/<job id>.json` for an external map builder.
///
/// A resubmitted order for the same job replaces the pending file.
#[derive(Debug, Clone)]
pub struct FileOrderSpool {
    dir: PathBuf,
}

impl FileOrderSpool {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, QueueError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| QueueError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn order_path(&self, order: &BuildOrder) -> PathBuf {
        self.dir.join(format!("{}.json", order.id))
    }
}

impl OrderQueue for FileOrderSpool {
    fn submit(&self, order: BuildOrder) -> Result<(), QueueError> {
        let bytes = serde_json::to_vec_pretty(&order).map_err(|source| QueueError::Encode {
            id: order.id,
            source,
        })?;
        let path = self.order_path(&order);
        write_atomic(&self.dir, &path, &bytes).map_err(|source| QueueError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(job_id = %order.id, path = %path.display(), "build order spooled");
        Ok(())
    }
}
