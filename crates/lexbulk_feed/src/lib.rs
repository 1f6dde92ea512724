//! # lexbulk feed
//!
//! Formats used by the bulk content delivery feed.
//!
//! This crate provides:
//! - [`ActionType`], [`ChangeRecord`] and [`ChangeSet`] for parsed changes
//! - [`ChangeSetParser`] for splitting a multipart payload into a change set
//! - [`FileData`] for the `X-LN-Bulk-File` pagination header
//! - [`FileHandle`], [`PageRequest`], [`RawPage`] and [`PageResult`] for paging
//! - [`parse_subscription_files`] for listing delivery files in a subscription
//!
//! This is a pure format crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod content_id;
mod error;
mod file_data;
mod metadata;
mod page;
mod parser;
mod record;
mod subscription;
mod xml;

pub use action::ActionType;
pub use content_id::{
    body_content_id, identifier_line_id, metadata_content_id, CONTENT_ID_DOMAIN,
    CONTENT_ID_PREFIX,
};
pub use error::{FeedError, FeedResult};
pub use file_data::{FileData, BULK_FILE_HEADER, BULK_MEDIA_TYPE};
pub use metadata::{decode_entries, EntryDecodeError, EntryMeta};
pub use page::{FileHandle, PageRequest, PageResult, RawPage};
pub use parser::{ChangeSetParser, ParseOutcome, ParseWarning, BLOCK_SEPARATOR};
pub use record::{destination_key, ChangeRecord, ChangeSet};
pub use subscription::{parse_subscription_files, SubscriptionFiles};
