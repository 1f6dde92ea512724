//! CLI command implementations.

pub mod fetch;
pub mod parse;
pub mod process_local;
pub mod sync;

use lexbulk_storage::FileSink;
use lexbulk_sync::{
    BearerCredentials, DispatchReport, Dispatcher, HttpTransport, PagerConfig, ReconcileConfig,
    ReqwestClient, RetryConfig, SyncConfig,
};
use std::path::PathBuf;
use std::time::Duration;

/// Options shared by every command.
pub struct GlobalOptions {
    /// API host name.
    pub api_host: String,
    /// Output directory.
    pub output: PathBuf,
    /// Unprocessed directory.
    pub unprocessed: PathBuf,
    /// Access token.
    pub token: Option<String>,
    /// Attempts per file.
    pub retries: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl GlobalOptions {
    /// Returns the reconcile directories.
    pub fn reconcile_config(&self) -> ReconcileConfig {
        ReconcileConfig::new(self.output.clone(), self.unprocessed.clone())
    }

    /// Builds the engine configuration.
    pub fn sync_config(&self, start_epoch: u64, page_dir: Option<PathBuf>) -> SyncConfig {
        let mut config = SyncConfig::new(&self.api_host)
            .with_start_epoch(start_epoch)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry(RetryConfig::new(self.retries))
            .with_reconcile(self.reconcile_config());
        if let Some(dir) = page_dir {
            config = config.with_pager(PagerConfig::writing_to(dir));
        }
        config
    }
}

/// The dispatcher used by networked commands.
pub type CliDispatcher = Dispatcher<HttpTransport<ReqwestClient, BearerCredentials>, FileSink>;

/// Builds a dispatcher talking to the API and writing below the working
/// directory.
pub fn dispatcher(
    options: &GlobalOptions,
    config: SyncConfig,
) -> Result<CliDispatcher, Box<dyn std::error::Error>> {
    let token = options
        .token
        .clone()
        .ok_or("access token required (--token or LEXBULK_TOKEN)")?;
    let client = ReqwestClient::new(config.timeout)?;
    let transport = HttpTransport::new(config.base_url(), client, BearerCredentials::new(token));
    Ok(Dispatcher::new(config, transport, FileSink::new(".")))
}

/// Prints a run summary.
pub fn print_summary(report: &DispatchReport) {
    println!("Files:      {}", report.files);
    println!("Pages:      {}", report.pages);
    println!("Written:    {}", report.written);
    println!("Deferred:   {}", report.deferred);
    println!("Skipped:    {}", report.skipped);
    println!("Warnings:   {}", report.warnings);
    if !report.failed.is_empty() {
        println!("Failed:     {}", report.failed.join(", "));
    }
}
