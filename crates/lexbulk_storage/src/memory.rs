//! In-memory sink for testing.

use crate::error::{StorageError, StorageResult};
use crate::sink::{validate_key, StorageSink};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

/// An in-memory sink.
///
/// Behaves like [`super::FileSink`] with respect to directories: writing a
/// key whose parent was never passed to `ensure_directory` fails with
/// [`StorageError::MissingDirectory`].
///
/// # Example
///
/// ```rust
/// use lexbulk_storage::{MemorySink, StorageSink};
/// use std::path::Path;
///
/// let sink = MemorySink::new();
/// sink.write_bytes(Path::new("top-level.txt"), b"data").unwrap();
/// assert_eq!(sink.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    directories: RwLock<BTreeSet<PathBuf>>,
}

impl MemorySink {
    /// Creates a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the content stored under `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().get(&normalize(path)).cloned()
    }

    /// Returns the content under `path` as UTF-8 text.
    #[must_use]
    pub fn get_text(&self, path: &Path) -> Option<String> {
        self.get(path)
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// Returns every key written so far, in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<PathBuf> {
        self.files.read().keys().cloned().collect()
    }

    /// Returns true if `path` was created as a directory.
    #[must_use]
    pub fn has_directory(&self, path: &Path) -> bool {
        self.directories.read().contains(&normalize(path))
    }

    /// Returns the number of stored files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl StorageSink for MemorySink {
    fn write_bytes(&self, path: &Path, content: &[u8]) -> StorageResult<()> {
        validate_key(path)?;
        let key = normalize(path);
        if let Some(parent) = key.parent() {
            if !parent.as_os_str().is_empty() && !self.directories.read().contains(parent) {
                return Err(StorageError::MissingDirectory(parent.to_path_buf()));
            }
        }
        self.files.write().insert(key, content.to_vec());
        Ok(())
    }

    fn ensure_directory(&self, path: &Path) -> StorageResult<()> {
        validate_key(path)?;
        let mut directories = self.directories.write();
        let mut current = PathBuf::new();
        for component in normalize(path).components() {
            current.push(component);
            directories.insert(current.clone());
        }
        Ok(())
    }
}

/// Drops `.` components so `./a/b` and `a/b` name the same entry.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
