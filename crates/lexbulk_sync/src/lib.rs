//! # lexbulk sync
//!
//! Retrieval and reconciliation of bulk delivery files.
//!
//! This crate provides:
//! - [`Pager`]: offset-based continuation of one file's multi-part download
//! - [`Reconciler`]: applies a parsed change set to a storage sink
//! - [`Dispatcher`]: runs pager, parser and reconciler for subscriptions
//! - [`HttpTransport`]: the vendor HTTP protocol over an [`HttpClient`]
//! - [`process_local_delivery`]: replays files delivered out of band
//!
//! ## Data Flow
//!
//! ```text
//! Dispatcher -> Pager (pages of one file)
//!            -> ChangeSetParser (one page -> change set)
//!            -> Reconciler (change set -> sink writes)
//! ```
//!
//! ## Key Invariants
//!
//! - One page is parsed and reconciled before the next is requested
//! - The file cursor never moves backwards
//! - The core never retries; only the dispatcher may
//! - Per-record anomalies are logged and skipped, never fatal

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod credentials;
mod dispatcher;
mod error;
mod http;
mod local;
mod pager;
mod reconciler;
mod transport;

pub use config::{PagerConfig, ReconcileConfig, RetryConfig, SyncConfig, DEFAULT_API_HOST};
pub use credentials::{request_token, BearerCredentials, CredentialProvider};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::{SyncError, SyncResult};
pub use http::{HttpClient, HttpRequest, HttpResponse, HttpTransport, ReqwestClient};
pub use local::{is_delivery_file, process_local_delivery};
pub use pager::{page_file_name, Pager, Pages};
pub use reconciler::{ReconcileReport, Reconciler, SkipReason, SkippedRecord};
pub use transport::{FeedTransport, MockTransport};
