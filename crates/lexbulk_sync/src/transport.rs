//! Transport abstraction for the bulk feed.

use crate::error::{SyncError, SyncResult};
use lexbulk_feed::{PageRequest, RawPage};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// A feed transport performs the network calls the engine needs.
///
/// This trait abstracts the network layer, allowing for the HTTP
/// implementation and a scripted mock for testing.
pub trait FeedTransport: Send + Sync {
    /// Fetches one page of a delivery file.
    ///
    /// An empty body means the file has no data at this offset.
    fn fetch_page(&self, request: &PageRequest) -> SyncResult<RawPage>;

    /// Fetches the subscription document listing delivery files.
    fn fetch_subscription(&self, subscription_id: &str, start_epoch: u64) -> SyncResult<String>;
}

impl<T: FeedTransport + ?Sized> FeedTransport for &T {
    fn fetch_page(&self, request: &PageRequest) -> SyncResult<RawPage> {
        (**self).fetch_page(request)
    }

    fn fetch_subscription(&self, subscription_id: &str, start_epoch: u64) -> SyncResult<String> {
        (**self).fetch_subscription(subscription_id, start_epoch)
    }
}

impl<T: FeedTransport + ?Sized> FeedTransport for Arc<T> {
    fn fetch_page(&self, request: &PageRequest) -> SyncResult<RawPage> {
        (**self).fetch_page(request)
    }

    fn fetch_subscription(&self, subscription_id: &str, start_epoch: u64) -> SyncResult<String> {
        (**self).fetch_subscription(subscription_id, start_epoch)
    }
}

#[derive(Debug)]
enum Scripted {
    Page(RawPage),
    Failure { message: String, retryable: bool },
}

/// A scripted transport for testing.
///
/// Pages are queued per file id and handed out in order, whatever offset is
/// requested. Once a file's queue is exhausted every further request gets
/// an empty body.
#[derive(Debug, Default)]
pub struct MockTransport {
    pages: Mutex<HashMap<String, VecDeque<Scripted>>>,
    subscriptions: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a page for `file_id`.
    pub fn push_page(&self, file_id: &str, body: impl Into<String>, file_data: Option<String>) {
        self.pages
            .lock()
            .entry(file_id.to_string())
            .or_default()
            .push_back(Scripted::Page(RawPage::new(body, file_data)));
    }

    /// Queues a transport failure for `file_id`.
    pub fn push_failure(&self, file_id: &str, message: impl Into<String>, retryable: bool) {
        self.pages
            .lock()
            .entry(file_id.to_string())
            .or_default()
            .push_back(Scripted::Failure {
                message: message.into(),
                retryable,
            });
    }

    /// Sets the subscription document returned for `subscription_id`.
    pub fn set_subscription(&self, subscription_id: &str, document: impl Into<String>) {
        self.subscriptions
            .lock()
            .insert(subscription_id.to_string(), document.into());
    }

    /// Returns every page request received so far.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of page requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl FeedTransport for MockTransport {
    fn fetch_page(&self, request: &PageRequest) -> SyncResult<RawPage> {
        self.requests.lock().push(request.clone());
        let next = self
            .pages
            .lock()
            .get_mut(&request.file_id)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Scripted::Page(page)) => Ok(page),
            Some(Scripted::Failure { message, retryable }) => Err(SyncError::Transport {
                message,
                retryable,
            }),
            None => Ok(RawPage::default()),
        }
    }

    fn fetch_subscription(&self, subscription_id: &str, _start_epoch: u64) -> SyncResult<String> {
        self.subscriptions
            .lock()
            .get(subscription_id)
            .cloned()
            .ok_or(SyncError::Http {
                status: 404,
                body: format!("unknown subscription {subscription_id}"),
            })
    }
}
