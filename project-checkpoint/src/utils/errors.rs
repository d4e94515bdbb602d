//! Custom error types for checkpoint creation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid backup item '{name}': {reason}")]
    InvalidItem { name: String, reason: String },

    #[error("Failed to create backup directory {}: {source}", .path.display())]
    BackupDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Version control error: {0}")]
    Vcs(String),

    #[error("Not a checkpoint directory: {0}")]
    NotACheckpoint(String),
}

pub type Result<T> = std::result::Result<T, CheckpointError>;
