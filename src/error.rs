//! Error taxonomy for a sync run.
//!
//! No step recovers locally: every variant aborts the run and surfaces at
//! the process boundary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("no device matching '{prefix}' found after {attempts} scan(s)")]
    DiscoveryFailure { prefix: String, attempts: u32 },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("no acknowledgement for '{command}' within {timeout_secs}s")]
    CommandTimeout { command: String, timeout_secs: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("network association failed (command: {command}): {output}")]
    Association { command: String, output: String },

    #[error("transfer error: {0}")]
    Transfer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SyncError {
    fn from(error: reqwest::Error) -> Self {
        SyncError::Transfer(error.to_string())
    }
}

impl From<btleplug::Error> for SyncError {
    fn from(error: btleplug::Error) -> Self {
        SyncError::Transport(error.to_string())
    }
}

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;
