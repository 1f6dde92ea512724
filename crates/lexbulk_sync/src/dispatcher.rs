//! Sequencing of pager, parser and reconciler.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::pager::Pager;
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::transport::FeedTransport;
use lexbulk_feed::{parse_subscription_files, ChangeSetParser};
use lexbulk_storage::StorageSink;
use std::thread;
use tracing::{info, warn};

/// Totals of a dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Files processed to the end.
    pub files: usize,
    /// Pages received.
    pub pages: u64,
    /// Records written to the output area.
    pub written: usize,
    /// Records sent to the unprocessed area.
    pub deferred: usize,
    /// Records skipped with a warning.
    pub skipped: usize,
    /// Metadata entries and blocks skipped by the parser.
    pub warnings: usize,
    /// Files abandoned because a payload could not be parsed.
    pub failed: Vec<String>,
}

impl DispatchReport {
    /// Adds a reconcile report's record counts.
    pub fn absorb(&mut self, report: &ReconcileReport) {
        self.written += report.written.len();
        self.deferred += report.deferred.len();
        self.skipped += report.skipped.len();
    }

    /// Adds another dispatch report.
    pub fn merge(&mut self, other: DispatchReport) {
        self.files += other.files;
        self.pages += other.pages;
        self.written += other.written;
        self.deferred += other.deferred;
        self.skipped += other.skipped;
        self.warnings += other.warnings;
        self.failed.extend(other.failed);
    }
}

/// Parses one payload and reconciles its change set.
///
/// `source` names the payload in log lines.
pub(crate) fn process_payload<S: StorageSink>(
    parser: &ChangeSetParser,
    reconciler: &Reconciler<'_, S>,
    payload: &str,
    source: &str,
) -> SyncResult<DispatchReport> {
    let outcome = parser.parse(payload)?;
    for warning in &outcome.warnings {
        warn!(source, "{warning}");
    }

    let applied = reconciler.apply(&outcome.change_set)?;
    let mut report = DispatchReport {
        pages: 1,
        warnings: outcome.warnings.len(),
        ..Default::default()
    };
    report.absorb(&applied);
    Ok(report)
}

/// Drives subscriptions and files through the engine.
///
/// Owns the transport and the sink. Pages are processed strictly one at a
/// time; a file is only retried as a whole, from offset 0.
pub struct Dispatcher<T: FeedTransport, S: StorageSink> {
    config: SyncConfig,
    transport: T,
    sink: S,
    parser: ChangeSetParser,
}

impl<T: FeedTransport, S: StorageSink> Dispatcher<T, S> {
    /// Creates a dispatcher.
    pub fn new(config: SyncConfig, transport: T, sink: S) -> Self {
        Self {
            config,
            transport,
            sink,
            parser: ChangeSetParser::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the storage sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Synchronizes every delivery file listed for a subscription.
    ///
    /// A file whose payload cannot be parsed is recorded in
    /// [`DispatchReport::failed`] and the remaining files still run.
    ///
    /// # Errors
    ///
    /// Returns transport and storage errors, after retries.
    pub fn sync_subscription(&self, subscription_id: &str) -> SyncResult<DispatchReport> {
        let document = self
            .transport
            .fetch_subscription(subscription_id, self.config.start_epoch)?;
        let files = parse_subscription_files(&document)?;
        for index in &files.skipped_epochs {
            warn!(subscription_id, epoch = *index, "epoch has no file link, skipping");
        }
        info!(
            subscription_id,
            files = files.file_ids.len(),
            start_epoch = self.config.start_epoch,
            "subscription listed"
        );

        let mut report = DispatchReport::default();
        for file_id in &files.file_ids {
            match self.sync_file(subscription_id, file_id) {
                Ok(file_report) => report.merge(file_report),
                Err(SyncError::Feed(e)) => {
                    warn!(subscription_id, file_id = %file_id, error = %e, "abandoning file");
                    report.failed.push(file_id.clone());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Synchronizes one delivery file.
    ///
    /// Retryable failures restart the file from the beginning, up to
    /// `retry.max_attempts` attempts in total.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted, or the first
    /// non-retryable error.
    pub fn sync_file(&self, subscription_id: &str, file_id: &str) -> SyncResult<DispatchReport> {
        let retry = &self.config.retry;
        let mut attempt = 0;
        loop {
            let delay = retry.delay_for_attempt(attempt);
            if !delay.is_zero() {
                thread::sleep(delay);
            }

            match self.sync_file_once(subscription_id, file_id) {
                Ok(report) => return Ok(report),
                Err(e) if e.is_retryable() && attempt + 1 < retry.max_attempts => {
                    attempt += 1;
                    warn!(
                        subscription_id,
                        file_id,
                        attempt,
                        max_attempts = retry.max_attempts,
                        error = %e,
                        "file sync failed, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn sync_file_once(&self, subscription_id: &str, file_id: &str) -> SyncResult<DispatchReport> {
        let pager = Pager::new(&self.transport, &self.sink, &self.config.pager);
        let mut report = DispatchReport {
            files: 1,
            ..Default::default()
        };

        if self.config.pager.write_pages {
            report.pages = pager.drain(file_id, subscription_id)?;
            info!(subscription_id, file_id, pages = report.pages, "pages stored");
            return Ok(report);
        }

        let reconciler = Reconciler::new(&self.sink, &self.config.reconcile);
        let source = format!("{subscription_id}/{file_id}");
        for page in pager.fetch_all(file_id, subscription_id) {
            let page = page?;
            report.merge(process_payload(&self.parser, &reconciler, &page.payload, &source)?);
        }

        info!(
            subscription_id,
            file_id,
            pages = report.pages,
            written = report.written,
            deferred = report.deferred,
            skipped = report.skipped,
            "file done"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PagerConfig, RetryConfig};
    use crate::transport::MockTransport;
    use lexbulk_storage::MemorySink;
    use lexbulk_testkit::{file_data_header, subscription_document, PayloadBuilder};
    use std::path::Path;
    use std::time::Duration;

    fn dispatcher(config: SyncConfig) -> Dispatcher<MockTransport, MemorySink> {
        Dispatcher::new(config, MockTransport::new(), MemorySink::new())
    }

    #[test]
    fn sync_file_reconciles_every_page() {
        let d = dispatcher(SyncConfig::default());
        let first = PayloadBuilder::new()
            .entry("A", "add", "S")
            .entry("B", "delete", "S")
            .body("A", "alpha")
            .build();
        let second = PayloadBuilder::new()
            .entry("C", "add", "S")
            .body("C", "gamma")
            .build();
        d.transport().push_page("F", first, Some(file_data_header(100, 200, true)));
        d.transport().push_page("F", second, Some(file_data_header(200, 200, false)));

        let report = d.sync_file("S", "F").unwrap();

        assert_eq!(report.files, 1);
        assert_eq!(report.pages, 2);
        assert_eq!(report.written, 2);
        assert_eq!(report.deferred, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(
            d.sink().get_text(Path::new("output/subscriptions/S/C")).unwrap(),
            "gamma"
        );
        assert!(d.sink().get(Path::new("unprocessed/B.json")).is_some());
    }

    #[test]
    fn parser_warnings_are_counted() {
        let d = dispatcher(SyncConfig::default());
        let payload = PayloadBuilder::new()
            .entry("A", "add", "S")
            .raw_entry("<entry><action>add</action></entry>")
            .body("A", "alpha")
            .build();
        d.transport().push_page("F", payload, None);

        let report = d.sync_file("S", "F").unwrap();
        assert_eq!(report.warnings, 1);
        assert_eq!(report.written, 1);
    }

    #[test]
    fn write_mode_only_stores_pages() {
        let config = SyncConfig::default().with_pager(PagerConfig::writing_to("raw"));
        let d = dispatcher(config);
        let payload = PayloadBuilder::new().entry("A", "add", "S").body("A", "alpha").build();
        d.transport().push_page("F", payload.clone(), None);

        let report = d.sync_file("S", "F").unwrap();

        assert_eq!(report.pages, 1);
        assert_eq!(report.written, 0);
        assert_eq!(d.sink().len(), 1);
        assert_eq!(d.sink().get_text(Path::new("raw/S-F-0.txt")).unwrap(), payload);
    }

    #[test]
    fn retryable_failure_restarts_file() {
        let config = SyncConfig::default()
            .with_retry(RetryConfig::new(2).with_initial_delay(Duration::ZERO));
        let d = dispatcher(config);
        d.transport().push_failure("F", "connection reset", true);
        let payload = PayloadBuilder::new().entry("A", "add", "S").body("A", "alpha").build();
        d.transport().push_page("F", payload, None);

        let report = d.sync_file("S", "F").unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(d.transport().request_count(), 2);
    }

    #[test]
    fn no_retry_by_default() {
        let d = dispatcher(SyncConfig::default());
        d.transport().push_failure("F", "connection reset", true);

        let err = d.sync_file("S", "F").unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(d.transport().request_count(), 1);
    }

    #[test]
    fn fatal_failure_is_not_retried() {
        let config = SyncConfig::default().with_retry(RetryConfig::new(3).with_initial_delay(Duration::ZERO));
        let d = dispatcher(config);
        d.transport().push_failure("F", "bad certificate", false);

        assert!(d.sync_file("S", "F").is_err());
        assert_eq!(d.transport().request_count(), 1);
    }

    #[test]
    fn sync_subscription_runs_listed_files() {
        let d = dispatcher(SyncConfig::default().with_start_epoch(3));
        d.transport().set_subscription("S", subscription_document(&["F1", "F2"]));
        d.transport().push_page(
            "F1",
            PayloadBuilder::new().entry("A", "add", "S").body("A", "alpha").build(),
            None,
        );
        d.transport().push_page(
            "F2",
            PayloadBuilder::new().entry("B", "remove", "S").build(),
            None,
        );

        let report = d.sync_subscription("S").unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.written, 1);
        assert_eq!(report.deferred, 1);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn unparseable_file_does_not_stop_subscription() {
        let d = dispatcher(SyncConfig::default());
        d.transport().set_subscription("S", subscription_document(&["BAD", "GOOD"]));
        d.transport().push_page("BAD", "only a header", None);
        d.transport().push_page(
            "GOOD",
            PayloadBuilder::new().entry("A", "add", "S").body("A", "alpha").build(),
            None,
        );

        let report = d.sync_subscription("S").unwrap();
        assert_eq!(report.failed, vec!["BAD".to_string()]);
        assert_eq!(report.files, 1);
        assert_eq!(report.written, 1);
    }

    #[test]
    fn unknown_subscription_is_an_error() {
        let d = dispatcher(SyncConfig::default());
        assert!(matches!(
            d.sync_subscription("missing"),
            Err(SyncError::Http { status: 404, .. })
        ));
    }

    #[test]
    fn report_merge() {
        let mut total = DispatchReport::default();
        total.merge(DispatchReport {
            files: 1,
            pages: 2,
            written: 3,
            failed: vec!["X".into()],
            ..Default::default()
        });
        total.merge(DispatchReport {
            files: 1,
            deferred: 1,
            ..Default::default()
        });
        assert_eq!(total.files, 2);
        assert_eq!(total.pages, 2);
        assert_eq!(total.written, 3);
        assert_eq!(total.deferred, 1);
        assert_eq!(total.failed.len(), 1);
    }
}
