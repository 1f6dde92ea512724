//! Configuration for the sync engine.

use std::path::PathBuf;
use std::time::Duration;

/// Default API host.
pub const DEFAULT_API_HOST: &str = "content-api.lexisnexis.com";

/// Configuration for a sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// API host, without scheme.
    pub api_host: String,
    /// First epoch requested when listing a subscription's files.
    pub start_epoch: u64,
    /// Request timeout, enforced by the HTTP client.
    pub timeout: Duration,
    /// Whole-file retry used by the dispatcher.
    pub retry: RetryConfig,
    /// Pager settings.
    pub pager: PagerConfig,
    /// Reconciler settings.
    pub reconcile: ReconcileConfig,
}

impl SyncConfig {
    /// Creates a configuration for `api_host`.
    pub fn new(api_host: impl Into<String>) -> Self {
        Self {
            api_host: api_host.into(),
            start_epoch: 0,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            pager: PagerConfig::default(),
            reconcile: ReconcileConfig::default(),
        }
    }

    /// Returns `https://{api_host}/bulkweb`.
    pub fn base_url(&self) -> String {
        format!("https://{}/bulkweb", self.api_host)
    }

    /// Sets the start epoch.
    pub fn with_start_epoch(mut self, epoch: u64) -> Self {
        self.start_epoch = epoch;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the pager configuration.
    pub fn with_pager(mut self, pager: PagerConfig) -> Self {
        self.pager = pager;
        self
    }

    /// Sets the reconciler configuration.
    pub fn with_reconcile(mut self, reconcile: ReconcileConfig) -> Self {
        self.reconcile = reconcile;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_HOST)
    }
}

/// Pager settings.
///
/// With `write_pages` set, raw pages are stored under `page_dir` as
/// `{subscription}-{file}-{offset}.txt` instead of being yielded.
#[derive(Debug, Clone)]
pub struct PagerConfig {
    /// Persist raw pages instead of yielding them.
    pub write_pages: bool,
    /// Directory for persisted pages.
    pub page_dir: PathBuf,
}

impl PagerConfig {
    /// Enables page persistence into `dir`.
    pub fn writing_to(dir: impl Into<PathBuf>) -> Self {
        Self {
            write_pages: true,
            page_dir: dir.into(),
        }
    }
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            write_pages: false,
            page_dir: PathBuf::from("output"),
        }
    }
}

/// Reconciler settings.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Base directory; `Add` records go to `{output_dir}/subscriptions/{S}/{C}`.
    pub output_dir: PathBuf,
    /// Directory for records that are not applied: `{unprocessed_dir}/{C}.json`.
    pub unprocessed_dir: PathBuf,
}

impl ReconcileConfig {
    /// Creates a reconciler configuration.
    pub fn new(output_dir: impl Into<PathBuf>, unprocessed_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            unprocessed_dir: unprocessed_dir.into(),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self::new("output", "unprocessed")
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Creates a retry configuration with `max_attempts` attempts.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay before a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);

        Duration::from_secs_f64(base_delay.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::no_retry()
    }
}
