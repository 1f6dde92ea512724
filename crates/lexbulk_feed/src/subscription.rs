//! Delivery file listing from a subscription document.
//!
//! `GET subscription/{id}?startEpoch={n}` answers with a document whose
//! `epochs` element holds one `epoch` per time segment; each epoch links to
//! its delivery file, and the file id is the last segment of the link.

use crate::error::{FeedError, FeedResult};
use crate::xml::{self, attribute, is_end_named, is_named};
use quick_xml::events::{BytesStart, Event};

/// Delivery files found in a subscription document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFiles {
    /// File ids in document order.
    pub file_ids: Vec<String>,
    /// Indexes of epochs that had no usable link.
    pub skipped_epochs: Vec<usize>,
}

struct EpochScan {
    index: usize,
    file_id: Option<String>,
}

fn file_id_from_link(start: &BytesStart<'_>) -> Option<String> {
    let href = attribute(start, "href")?;
    let id = href.trim().trim_end_matches('/').rsplit('/').next()?.trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Lists the delivery file ids of a subscription document.
///
/// # Errors
///
/// Returns an error if the document cannot be tokenised as XML.
pub fn parse_subscription_files(document: &str) -> FeedResult<SubscriptionFiles> {
    let mut reader = xml::lenient_reader(document);
    let mut files = SubscriptionFiles::default();
    let mut epochs_seen = 0usize;
    let mut current: Option<EpochScan> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) if is_named(&start, "epoch") => {
                current = Some(EpochScan {
                    index: epochs_seen,
                    file_id: None,
                });
                epochs_seen += 1;
            }
            Ok(Event::Start(start)) | Ok(Event::Empty(start)) if is_named(&start, "link") => {
                if let Some(epoch) = current.as_mut() {
                    if epoch.file_id.is_none() {
                        epoch.file_id = file_id_from_link(&start);
                    }
                }
            }
            Ok(Event::Empty(start)) if is_named(&start, "epoch") => {
                files.skipped_epochs.push(epochs_seen);
                epochs_seen += 1;
            }
            Ok(Event::End(end)) if is_end_named(&end, "epoch") => {
                if let Some(epoch) = current.take() {
                    match epoch.file_id {
                        Some(id) => files.file_ids.push(id),
                        None => files.skipped_epochs.push(epoch.index),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(FeedError::xml("subscription document", e)),
        }
    }

    if let Some(epoch) = current.take() {
        match epoch.file_id {
            Some(id) => files.file_ids.push(id),
            None => files.skipped_epochs.push(epoch.index),
        }
    }
    Ok(files)
}
