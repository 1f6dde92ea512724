//! # lexbulk testkit
//!
//! Test utilities for lexbulk.
//!
//! This crate provides:
//! - Payload and header fixtures matching the vendor wire format
//! - Temporary output directories backed by a [`lexbulk_storage::FileSink`]
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use lexbulk_testkit::PayloadBuilder;
//!
//! let payload = PayloadBuilder::new()
//!     .entry("ABC123", "add", "SUB1")
//!     .body("ABC123", "Hello world")
//!     .build();
//! assert!(payload.contains("urn:contentItem:ABC123@lexisnexis.com"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
