//! Storage sink trait definition.

use crate::error::{StorageError, StorageResult};
use std::path::{Component, Path};

/// A keyed byte sink.
///
/// Relative keys are resolved against the sink's root; absolute keys are used
/// as given. Callers create
/// containing directories explicitly with [`StorageSink::ensure_directory`]
/// before writing into them.
///
/// # Invariants
///
/// - `write_bytes` replaces any previous content stored under the same key
/// - `ensure_directory` is idempotent
/// - Keys containing `..` are rejected
/// - Sinks must be `Send + Sync` so a dispatcher can share them across files
///
/// # Implementors
///
/// - [`super::FileSink`] - For persistent output
/// - [`super::MemorySink`] - For testing
pub trait StorageSink: Send + Sync {
    /// Writes `content` under `path`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key is invalid
    /// - The containing directory does not exist
    /// - An I/O error occurs
    fn write_bytes(&self, path: &Path, content: &[u8]) -> StorageResult<()>;

    /// Creates the directory at `path` and all of its parents.
    ///
    /// Succeeds without doing anything if the directory already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the directory cannot be created.
    fn ensure_directory(&self, path: &Path) -> StorageResult<()>;
}

impl<S: StorageSink + ?Sized> StorageSink for &S {
    fn write_bytes(&self, path: &Path, content: &[u8]) -> StorageResult<()> {
        (**self).write_bytes(path, content)
    }

    fn ensure_directory(&self, path: &Path) -> StorageResult<()> {
        (**self).ensure_directory(path)
    }
}

impl<S: StorageSink + ?Sized> StorageSink for std::sync::Arc<S> {
    fn write_bytes(&self, path: &Path, content: &[u8]) -> StorageResult<()> {
        (**self).write_bytes(path, content)
    }

    fn ensure_directory(&self, path: &Path) -> StorageResult<()> {
        (**self).ensure_directory(path)
    }
}

/// Checks that `path` names something and never walks upwards.
///
/// # Errors
///
/// Returns [`StorageError::InvalidPath`] for empty keys and for keys with a
/// `..` component.
pub fn validate_key(path: &Path) -> StorageResult<()> {
    let mut normal = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                return Err(StorageError::InvalidPath(path.display().to_string()));
            }
        }
    }
    if normal == 0 {
        return Err(StorageError::InvalidPath(path.display().to_string()));
    }
    Ok(())
}
