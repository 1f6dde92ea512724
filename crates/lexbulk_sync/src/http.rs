//! HTTP transport implementation.
//!
//! [`HttpTransport`] speaks the bulk API: it builds routes under
//! `https://{host}/bulkweb/`, attaches credentials and the pagination
//! header, and checks statuses. The actual HTTP client is abstracted via
//! [`HttpClient`]; [`ReqwestClient`] is the blocking `reqwest` implementation.

use crate::credentials::{CredentialProvider, REQUEST_TOKEN_HEADER};
use crate::error::{SyncError, SyncResult};
use crate::transport::FeedTransport;
use lexbulk_feed::{PageRequest, RawPage, BULK_FILE_HEADER, BULK_MEDIA_TYPE};
use std::time::Duration;
use tracing::debug;

/// An outgoing GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute URL.
    pub url: String,
    /// Headers in insertion order.
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Looks up a header, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A received HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Body text.
    pub body: String,
    /// Response headers.
    pub headers: Vec<(String, String)>,
}

impl HttpResponse {
    /// Creates a 200 response with `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Looks up a header, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. Errors are
/// transport-level failures (connection, TLS, timeout); HTTP error statuses
/// are returned as responses.
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the full response.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

/// Blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::transport_fatal(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let mut builder = self.client.get(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().map_err(|e| e.to_string())?;

        Ok(HttpResponse {
            status,
            body,
            headers,
        })
    }
}

/// HTTP-based feed transport.
pub struct HttpTransport<C: HttpClient, P: CredentialProvider> {
    /// Base URL (e.g., "https://content-api.lexisnexis.com/bulkweb").
    base_url: String,
    client: C,
    credentials: P,
}

impl<C: HttpClient, P: CredentialProvider> HttpTransport<C, P> {
    /// Creates a new HTTP transport.
    pub fn new(base_url: impl Into<String>, client: C, credentials: P) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            credentials,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the URL of an API route.
    pub fn url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }

    /// Sends an authenticated GET for `route`.
    ///
    /// # Errors
    ///
    /// Client failures become retryable transport errors; non-2xx statuses
    /// become [`SyncError::Http`].
    pub fn get(&self, route: &str, headers: &[(&str, String)]) -> SyncResult<HttpResponse> {
        let mut request = HttpRequest::get(self.url(route))
            .with_header("Authorization", self.credentials.authorization()?)
            .with_header(REQUEST_TOKEN_HEADER, self.credentials.request_token());
        for (name, value) in headers {
            request = request.with_header(*name, value.clone());
        }

        debug!(url = %request.url, "GET");
        let response = self
            .client
            .send(&request)
            .map_err(|e| SyncError::transport_retryable(e))?;

        if !response.is_success() {
            return Err(SyncError::Http {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response)
    }
}

impl<C: HttpClient, P: CredentialProvider> FeedTransport for HttpTransport<C, P> {
    fn fetch_page(&self, request: &PageRequest) -> SyncResult<RawPage> {
        let headers = [
            ("Accept", BULK_MEDIA_TYPE.to_string()),
            ("Content-Type", BULK_MEDIA_TYPE.to_string()),
            (BULK_FILE_HEADER, request.file_data_header()),
        ];
        let response = self.get(&format!("file/{}", request.file_id), &headers)?;
        let file_data = response.header(BULK_FILE_HEADER).map(str::to_string);

        Ok(RawPage::new(response.body, file_data))
    }

    fn fetch_subscription(&self, subscription_id: &str, start_epoch: u64) -> SyncResult<String> {
        let route = format!("subscription/{subscription_id}?startEpoch={start_epoch}");
        Ok(self.get(&route, &[])?.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::BearerCredentials;
    use parking_lot::Mutex;

    struct TestClient {
        response: Mutex<Result<HttpResponse, String>>,
        sent: Mutex<Vec<HttpRequest>>,
    }

    impl TestClient {
        fn answering(response: Result<HttpResponse, String>) -> Self {
            Self {
                response: Mutex::new(response),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for TestClient {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
            self.sent.lock().push(request.clone());
            self.response.lock().clone()
        }
    }

    fn transport(response: Result<HttpResponse, String>) -> HttpTransport<TestClient, BearerCredentials> {
        HttpTransport::new(
            "https://api.example.com/bulkweb/",
            TestClient::answering(response),
            BearerCredentials::new("tok"),
        )
    }

    fn page_request() -> PageRequest {
        PageRequest {
            file_id: "F1".into(),
            subscription_id: "SUB1".into(),
            offset: 512,
        }
    }

    #[test]
    fn url_joins_routes() {
        let transport = transport(Ok(HttpResponse::ok("")));
        assert_eq!(transport.base_url(), "https://api.example.com/bulkweb/");
        assert_eq!(
            transport.url("/file/F1"),
            "https://api.example.com/bulkweb/file/F1"
        );
    }

    #[test]
    fn page_request_headers() {
        let transport = transport(Ok(HttpResponse::ok("body")));
        transport.fetch_page(&page_request()).unwrap();

        let sent = transport.client.sent.lock();
        let request = &sent[0];
        assert_eq!(request.url, "https://api.example.com/bulkweb/file/F1");
        assert_eq!(request.header("authorization"), Some("Bearer tok"));
        assert!(request.header("X-LN-Request").unwrap().contains("<transactionID>"));
        assert_eq!(request.header("Accept"), Some(BULK_MEDIA_TYPE));
        assert_eq!(
            request.header("x-ln-bulk-file"),
            Some("<FileData><offset>512</offset><subscriptionGUID>SUB1</subscriptionGUID></FileData>")
        );
    }

    #[test]
    fn page_response_carries_file_data() {
        let response = HttpResponse::ok("payload")
            .with_header("x-ln-bulk-file", "<FileData><offset>9</offset></FileData>");
        let page = transport(Ok(response)).fetch_page(&page_request()).unwrap();

        assert_eq!(page.body, "payload");
        assert_eq!(
            page.file_data.as_deref(),
            Some("<FileData><offset>9</offset></FileData>")
        );
    }

    #[test]
    fn client_failure_is_retryable_transport_error() {
        let err = transport(Err("connection refused".into()))
            .fetch_page(&page_request())
            .unwrap_err();
        assert!(matches!(err, SyncError::Transport { retryable: true, .. }));
    }

    #[test]
    fn error_status_is_http_error() {
        let response = HttpResponse {
            status: 401,
            body: "expired".into(),
            headers: Vec::new(),
        };
        let err = transport(Ok(response)).fetch_page(&page_request()).unwrap_err();
        assert!(matches!(err, SyncError::Http { status: 401, .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn subscription_route() {
        let transport = transport(Ok(HttpResponse::ok("<subscription/>")));
        let body = transport.fetch_subscription("SUB1", 3).unwrap();

        assert_eq!(body, "<subscription/>");
        assert_eq!(
            transport.client.sent.lock()[0].url,
            "https://api.example.com/bulkweb/subscription/SUB1?startEpoch=3"
        );
    }

    #[test]
    fn missing_credentials_stop_before_sending() {
        let transport = HttpTransport::new(
            "https://api.example.com/bulkweb",
            TestClient::answering(Ok(HttpResponse::ok(""))),
            BearerCredentials::new(""),
        );
        assert!(matches!(
            transport.fetch_page(&page_request()),
            Err(SyncError::Credentials(_))
        ));
        assert!(transport.client.sent.lock().is_empty());
    }
}
