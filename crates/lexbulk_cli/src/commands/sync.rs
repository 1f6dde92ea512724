//! Sync command implementation.

use super::{dispatcher, print_summary, GlobalOptions};
use lexbulk_sync::DispatchReport;
use std::path::PathBuf;
use tracing::info;

/// Runs the sync command.
pub fn run(
    options: &GlobalOptions,
    subscriptions: &[String],
    start_epoch: u64,
    page_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = dispatcher(options, options.sync_config(start_epoch, page_dir))?;

    let mut total = DispatchReport::default();
    for subscription in subscriptions {
        info!(subscription_id = %subscription, "syncing subscription");
        total.merge(dispatcher.sync_subscription(subscription)?);
    }

    print_summary(&total);
    Ok(())
}
