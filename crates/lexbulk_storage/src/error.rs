//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The key is empty or walks upwards with `..`.
    #[error("invalid storage key: {0}")]
    InvalidPath(String),

    /// A write targeted a directory that was never created.
    #[error("missing directory: {}", .0.display())]
    MissingDirectory(PathBuf),
}
