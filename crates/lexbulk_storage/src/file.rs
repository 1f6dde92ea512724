//! Filesystem sink for persistent output.

use crate::error::{StorageError, StorageResult};
use crate::sink::{validate_key, StorageSink};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A sink that writes files under a root directory.
///
/// # Durability
///
/// - Every write truncates the target and flushes it to the OS
/// - With [`FileSink::with_sync`] each write also calls `File::sync_all()`
///
/// # Example
///
/// ```no_run
/// use lexbulk_storage::{FileSink, StorageSink};
/// use std::path::Path;
///
/// let sink = FileSink::new("/var/lib/lexbulk");
/// sink.ensure_directory(Path::new("output/subscriptions/SUB1")).unwrap();
/// sink.write_bytes(Path::new("output/subscriptions/SUB1/ABC123"), b"text").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
    sync: bool,
}

impl FileSink {
    /// Creates a sink rooted at `root`.
    ///
    /// The root itself is not created until something is written.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sync: false,
        }
    }

    /// Enables `sync_all` after every write.
    #[must_use]
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a key to a filesystem path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidPath`] if the key is rejected by
    /// [`validate_key`].
    pub fn resolve(&self, path: &Path) -> StorageResult<PathBuf> {
        validate_key(path)?;
        Ok(self.root.join(path))
    }
}

impl StorageSink for FileSink {
    fn write_bytes(&self, path: &Path, content: &[u8]) -> StorageResult<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(StorageError::MissingDirectory(parent.to_path_buf()));
            }
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&target)?;
        file.write_all(content)?;
        file.flush()?;
        if self.sync {
            file.sync_all()?;
        }
        Ok(())
    }

    fn ensure_directory(&self, path: &Path) -> StorageResult<()> {
        let target = self.resolve(path)?;
        fs::create_dir_all(target)?;
        Ok(())
    }
}
