//! Custom error types for minepack.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackError {
    #[error("selection is empty after filtering protected paths")]
    EmptySelection,

    #[error("root path does not exist or is not a directory: {0}")]
    MissingRoot(PathBuf),

    #[error("archive hash mismatch: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    #[error("backup failed before apply: {0}")]
    BackupFailed(#[source] std::io::Error),

    #[error("failed to replace {path}: {source}")]
    PartialIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("GitHub authorization failed: no token (set GITHUB_TOKEN or store a PAT)")]
    AuthRequired,

    #[error("asset not found in latest release: {0}")]
    AssetNotFound(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, PackError>;
