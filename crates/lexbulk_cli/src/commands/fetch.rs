//! Fetch command implementation.

use super::{dispatcher, print_summary, GlobalOptions};
use std::path::PathBuf;

/// Runs the fetch command.
pub fn run(
    options: &GlobalOptions,
    subscription: &str,
    file: &str,
    page_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = options.sync_config(0, page_dir);
    let report = dispatcher(options, config)?.sync_file(subscription, file)?;
    print_summary(&report);
    Ok(())
}
