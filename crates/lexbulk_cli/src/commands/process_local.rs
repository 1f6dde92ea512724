//! Process-local command implementation.

use super::{print_summary, GlobalOptions};
use lexbulk_storage::FileSink;
use lexbulk_sync::process_local_delivery;
use std::path::Path;

/// Runs the process-local command.
pub fn run(options: &GlobalOptions, root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !root.is_dir() {
        return Err(format!("No delivery directory at {}", root.display()).into());
    }

    let sink = FileSink::new(".");
    let report = process_local_delivery(root, &sink, &options.reconcile_config())?;
    print_summary(&report);
    Ok(())
}
