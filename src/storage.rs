//! Local save path for downloaded media
//!
//! One folder per run, named by the local date, under the configured data
//! root. Resolved once and reused for every file of the run.

use crate::config::StorageConfig;
use crate::error::{Result, SyncError};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePath {
    dir: PathBuf,
}

impl SavePath {
    /// Resolve `<root>/<date>` and create it.
    ///
    /// Falls back to the fallback root when the data root is missing, which
    /// happens when the external disk is not mounted.
    pub fn resolve(storage: &StorageConfig, date: NaiveDate) -> Result<Self> {
        let mut root = storage.data_root();
        if !root.exists() {
            warn!("NOT EXIST: {}", root.display());
            root = storage.fallback_root();
        }

        let dir = root.join(date.format("%Y-%m-%d").to_string());
        Self::at(dir)
    }

    /// Use `dir` as-is, creating it if needed.
    pub fn at(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let metadata = fs::metadata(&dir)?;
        if !metadata.is_dir() {
            return Err(SyncError::Config(format!(
                "save path {} is not a directory",
                dir.display()
            )));
        }
        // Create a file for real; removed again on drop.
        tempfile::Builder::new()
            .prefix(".gopro-sync-")
            .tempfile_in(&dir)
            .map_err(|e| {
                SyncError::Config(format!("save path {} is not writable: {}", dir.display(), e))
            })?;

        info!("Save path: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Destination for a downloaded file; only the final path component of
    /// `file_name` is used so a listing can't write outside the folder.
    pub fn file(&self, file_name: &str) -> Result<PathBuf> {
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| SyncError::Transfer(format!("invalid media file name '{file_name}'")))?;
        Ok(self.dir.join(name))
    }
}
