//! Applies change sets to a storage sink.
//!
//! Only `Add` records are applied: their text is written to
//! `{output_dir}/subscriptions/{S}/{C}`. Every other record, including
//! records with no declared action, is serialized to
//! `{unprocessed_dir}/{C}.json` for deferred handling.

use crate::config::ReconcileConfig;
use crate::error::SyncResult;
use lexbulk_feed::{ChangeRecord, ChangeSet};
use lexbulk_storage::StorageSink;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Why a record was neither written nor deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// An `Add` record without text.
    MissingText,
    /// An `Add` record without a destination.
    MissingDestination,
    /// The content or subscription id cannot be used as a file name.
    UnsafeId,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::MissingText => "add record has no text",
            SkipReason::MissingDestination => "add record has no destination",
            SkipReason::UnsafeId => "id is not a plain file name",
        })
    }
}

/// A record that was skipped with a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Content id.
    pub content_id: String,
    /// Subscription id, if known.
    pub subscription_id: Option<String>,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// What happened to each record of a change set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Storage keys written for `Add` records.
    pub written: Vec<PathBuf>,
    /// Content ids sent to the unprocessed area.
    pub deferred: Vec<String>,
    /// Records skipped with a warning.
    pub skipped: Vec<SkippedRecord>,
}

impl ReconcileReport {
    /// Number of records accounted for.
    pub fn total(&self) -> usize {
        self.written.len() + self.deferred.len() + self.skipped.len()
    }

    /// Adds another report's outcomes to this one.
    pub fn merge(&mut self, other: ReconcileReport) {
        self.written.extend(other.written);
        self.deferred.extend(other.deferred);
        self.skipped.extend(other.skipped);
    }
}

/// Applies change sets one record at a time.
pub struct Reconciler<'a, S: StorageSink> {
    sink: &'a S,
    config: &'a ReconcileConfig,
}

impl<'a, S: StorageSink> Reconciler<'a, S> {
    /// Creates a reconciler writing through `sink`.
    pub fn new(sink: &'a S, config: &'a ReconcileConfig) -> Self {
        Self { sink, config }
    }

    /// Applies every record of `change_set`.
    ///
    /// Each record ends up in exactly one of the report's lists.
    ///
    /// # Errors
    ///
    /// Returns an error only if the sink fails or a record cannot be
    /// serialized.
    pub fn apply(&self, change_set: &ChangeSet) -> SyncResult<ReconcileReport> {
        debug!(records = change_set.len(), "reconciling change set; only add records are applied");
        let mut report = ReconcileReport::default();
        let mut unprocessed_ready = false;

        for record in change_set.iter() {
            if !is_plain_name(&record.content_id) {
                self.skip(&mut report, record, SkipReason::UnsafeId);
                continue;
            }

            if record.is_add() {
                self.apply_add(&mut report, record)?;
            } else {
                if !unprocessed_ready {
                    self.sink.ensure_directory(&self.config.unprocessed_dir)?;
                    unprocessed_ready = true;
                }
                self.defer(&mut report, record)?;
            }
        }

        Ok(report)
    }

    fn apply_add(&self, report: &mut ReconcileReport, record: &ChangeRecord) -> SyncResult<()> {
        let Some(text) = record.non_empty_text() else {
            self.skip(report, record, SkipReason::MissingText);
            return Ok(());
        };
        let Some(subscription_id) = record.subscription_id.as_deref() else {
            self.skip(report, record, SkipReason::MissingDestination);
            return Ok(());
        };
        if !is_plain_name(subscription_id) {
            self.skip(report, record, SkipReason::UnsafeId);
            return Ok(());
        }
        let Some(destination) = record.destination_key.as_deref() else {
            self.skip(report, record, SkipReason::MissingDestination);
            return Ok(());
        };

        let key = self.config.output_dir.join(destination);
        if let Some(parent) = key.parent() {
            self.sink.ensure_directory(parent)?;
        }
        self.sink.write_bytes(&key, text.as_bytes())?;
        debug!(content_id = %record.content_id, key = %key.display(), "applied add");
        report.written.push(key);
        Ok(())
    }

    fn defer(&self, report: &mut ReconcileReport, record: &ChangeRecord) -> SyncResult<()> {
        let key = self
            .config
            .unprocessed_dir
            .join(format!("{}.json", record.content_id));
        let json = serde_json::to_vec_pretty(record)?;
        self.sink.write_bytes(&key, &json)?;
        debug!(
            content_id = %record.content_id,
            action = ?record.action_type,
            "deferred to unprocessed area"
        );
        report.deferred.push(record.content_id.clone());
        Ok(())
    }

    fn skip(&self, report: &mut ReconcileReport, record: &ChangeRecord, reason: SkipReason) {
        warn!(
            content_id = %record.content_id,
            subscription_id = record.subscription_id.as_deref().unwrap_or("-"),
            "skipping record: {reason}"
        );
        report.skipped.push(SkippedRecord {
            content_id: record.content_id.clone(),
            subscription_id: record.subscription_id.clone(),
            reason,
        });
    }
}

/// True if `name` is a single, ordinary path component.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some()
}
