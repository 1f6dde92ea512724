//! lexbulk CLI
//!
//! Command-line client for the bulk content feed.
//!
//! # Commands
//!
//! - `fetch` - Download one delivery file and reconcile it
//! - `sync` - Synchronize every file listed for one or more subscriptions
//! - `process-local` - Reconcile delivery files already on disk
//! - `parse` - Parse a payload file and print its change records

mod commands;

use clap::{Parser, Subcommand};
use commands::GlobalOptions;
use lexbulk_sync::DEFAULT_API_HOST;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Bulk content feed client.
#[derive(Parser)]
#[command(name = "lexbulk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// API host name
    #[arg(global = true, long, default_value = DEFAULT_API_HOST)]
    api_host: String,

    /// Output directory for applied content
    #[arg(global = true, short, long, default_value = "output")]
    output: PathBuf,

    /// Directory for records that are not applied
    #[arg(global = true, short, long, default_value = "unprocessed")]
    unprocessed: PathBuf,

    /// Access token
    #[arg(global = true, long, env = "LEXBULK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Attempts per file (1 disables retries)
    #[arg(global = true, long, default_value = "1")]
    retries: u32,

    /// HTTP request timeout in seconds
    #[arg(global = true, long, default_value = "30")]
    timeout_secs: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download one delivery file and reconcile it
    Fetch {
        /// Subscription the file belongs to
        subscription: String,

        /// Delivery file id
        file: String,

        /// Store raw pages instead of reconciling them
        #[arg(long)]
        write_pages: bool,

        /// Directory for raw pages
        #[arg(long, default_value = "output")]
        page_dir: PathBuf,
    },

    /// Synchronize every file listed for the given subscriptions
    Sync {
        /// Subscription ids
        #[arg(required = true)]
        subscriptions: Vec<String>,

        /// First epoch to list
        #[arg(long, default_value = "0")]
        start_epoch: u64,

        /// Store raw pages instead of reconciling them
        #[arg(long)]
        write_pages: bool,

        /// Directory for raw pages
        #[arg(long, default_value = "output")]
        page_dir: PathBuf,
    },

    /// Reconcile delivery files already on disk
    ProcessLocal {
        /// Directory to walk
        root: PathBuf,
    },

    /// Parse a payload file and print its change records
    Parse {
        /// Payload file
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = GlobalOptions {
        api_host: cli.api_host,
        output: cli.output,
        unprocessed: cli.unprocessed,
        token: cli.token,
        retries: cli.retries,
        timeout_secs: cli.timeout_secs,
    };

    match cli.command {
        Commands::Fetch {
            subscription,
            file,
            write_pages,
            page_dir,
        } => {
            let pages = write_pages.then_some(page_dir);
            commands::fetch::run(&options, &subscription, &file, pages)?;
        }
        Commands::Sync {
            subscriptions,
            start_epoch,
            write_pages,
            page_dir,
        } => {
            let pages = write_pages.then_some(page_dir);
            commands::sync::run(&options, &subscriptions, start_epoch, pages)?;
        }
        Commands::ProcessLocal { root } => {
            commands::process_local::run(&options, &root)?;
        }
        Commands::Parse { file, format } => {
            commands::parse::run(&file, &format)?;
        }
        Commands::Version => {
            println!("lexbulk CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
