//! HTTP transport for API requests.
//!
//! Uses async reqwest internally, driven on a shared tokio runtime,
//! but presents a sync interface so the crawl loop stays strictly sequential.

use std::sync::LazyLock;
use std::time::Duration;

use crate::error::RequestError;

/// Default connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default whole-request timeout (headers + body)
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// Fixed header set sent with every request (media type, credential, ...).
///
/// Owned by the caller and passed explicitly; there is no process-wide header state.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders(Vec<(String, String)>);

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((name.into(), value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

// Header values carry credentials
impl std::fmt::Debug for RequestHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(|(k, _)| format!("{k}: <redacted>")))
            .finish()
    }
}

/// One HTTP GET. The seam between the retry loop and the network.
pub trait Transport {
    /// Perform a GET. Non-200 statuses are returned as `Ok`; only failures
    /// to obtain a response at all are `Err`.
    fn get(&self, url: &str, headers: &RequestHeaders) -> Result<RawResponse, RequestError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, headers: &RequestHeaders) -> Result<RawResponse, RequestError> {
        (**self).get(url, headers)
    }
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Timeouts for [`HttpTransport`]
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Network-backed [`Transport`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(concat!("repo-harvest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RequestError::from_reqwest)?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, headers: &RequestHeaders) -> Result<RawResponse, RequestError> {
        SHARED_RUNTIME.handle().block_on(async {
            let mut request = self.client.get(url);
            for (name, value) in headers.iter() {
                request = request.header(name, value);
            }
            let response = request.send().await.map_err(RequestError::from_reqwest)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(RequestError::from_reqwest)?;
            Ok(RawResponse { status, body })
        })
    }
}
