use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the camera was handed back to recording
    pub finished_at: Option<DateTime<Utc>>,

    /// Folder the media went into
    pub save_path: PathBuf,

    /// Files downloaded, in order
    pub downloaded: Vec<String>,

    /// Total bytes written
    pub bytes_downloaded: u64,

    /// Files deleted from the camera, in order
    pub deleted: Vec<String>,
}

impl RunReport {
    pub fn new(save_path: PathBuf) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            save_path,
            downloaded: Vec::new(),
            bytes_downloaded: 0,
            deleted: Vec::new(),
        }
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }
}
