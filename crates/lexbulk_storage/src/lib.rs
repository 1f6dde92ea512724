//! # lexbulk storage
//!
//! Storage sinks for lexbulk.
//!
//! A sink is an **opaque keyed byte store**: it writes bytes under a path
//! and creates directories on request. It knows nothing about delivery
//! files, change sets or action types.
//!
//! ## Available Sinks
//!
//! - [`FileSink`] - Writes under a root directory on the local filesystem
//! - [`MemorySink`] - Keeps everything in memory, for tests
//!
//! ## Example
//!
//! ```rust
//! use lexbulk_storage::{MemorySink, StorageSink};
//! use std::path::Path;
//!
//! let sink = MemorySink::new();
//! sink.ensure_directory(Path::new("subscriptions/SUB1")).unwrap();
//! sink.write_bytes(Path::new("subscriptions/SUB1/ABC123"), b"Hello world").unwrap();
//! assert_eq!(sink.get(Path::new("subscriptions/SUB1/ABC123")).unwrap(), b"Hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod sink;

pub use error::{StorageError, StorageResult};
pub use file::FileSink;
pub use memory::MemorySink;
pub use sink::{validate_key, StorageSink};
