//! Replay of delivery files that arrived out of band.
//!
//! Delivery files are named by GUID, so their base name contains exactly
//! four `-`. Anything else under the root is ignored.

use crate::config::ReconcileConfig;
use crate::dispatcher::{process_payload, DispatchReport};
use crate::error::{SyncError, SyncResult};
use crate::reconciler::Reconciler;
use lexbulk_feed::ChangeSetParser;
use lexbulk_storage::StorageSink;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Returns true if `path` names a delivery file.
pub fn is_delivery_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.matches('-').count() == 4)
}

/// Parses and reconciles every delivery file below `root`.
///
/// Files are visited in name order. A file whose payload cannot be parsed
/// is recorded in [`DispatchReport::failed`] and the walk continues.
///
/// # Errors
///
/// Returns an error if the tree cannot be walked, a file cannot be read, or
/// the sink fails.
pub fn process_local_delivery<S: StorageSink>(
    root: &Path,
    sink: &S,
    config: &ReconcileConfig,
) -> SyncResult<DispatchReport> {
    let parser = ChangeSetParser::new();
    let reconciler = Reconciler::new(sink, config);
    let mut report = DispatchReport::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_delivery_file(path) {
            debug!(path = %path.display(), "not a delivery file");
            continue;
        }

        let payload = fs::read_to_string(path)?;
        let source = path.display().to_string();
        match process_payload(&parser, &reconciler, &payload, &source) {
            Ok(file_report) => {
                report.merge(file_report);
                report.files += 1;
            }
            Err(SyncError::Feed(e)) => {
                warn!(path = %source, error = %e, "abandoning delivery file");
                report.failed.push(source);
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        root = %root.display(),
        files = report.files,
        written = report.written,
        deferred = report.deferred,
        skipped = report.skipped,
        "local delivery processed"
    );
    Ok(report)
}
