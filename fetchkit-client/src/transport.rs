//! Network transport abstraction and its reqwest implementation.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::{self, BoxFuture, FutureExt};
use http::{HeaderMap, Method, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{Body, RequestConfig, TransportError};

/// Deferred, single-use response body.
pub type BodyFuture = BoxFuture<'static, Result<Bytes, TransportError>>;

/// Cooperative cancellation flag observed by transports.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    /// Create a signal that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal.
    pub fn abort(&self) {
        self.token.cancel();
    }

    /// Check if the signal has fired.
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the signal fires.
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }
}

/// What the pipeline hands to the transport for one attempt.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Target address.
    pub url: String,
    /// HTTP method.
    pub method: Method,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Option<Body>,
}

impl From<&RequestConfig> for TransportRequest {
    fn from(config: &RequestConfig) -> Self {
        Self {
            url: config.url.clone(),
            method: config.method.clone(),
            headers: config.headers.clone(),
            body: config.body.clone(),
        }
    }
}

/// Response head plus a body that can be read once.
pub struct TransportResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: BodyFuture,
}

impl TransportResponse {
    /// Create a response whose body is produced by `body`.
    pub fn new<F>(status: StatusCode, headers: HeaderMap, body: F) -> Self
    where
        F: Future<Output = Result<Bytes, TransportError>> + Send + 'static,
    {
        Self {
            status,
            headers,
            body: body.boxed(),
        }
    }

    /// Create a response with a body already in memory.
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self::new(status, headers, future::ready(Ok(body.into())))
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Consume the response and read the body.
    pub async fn bytes(self) -> Result<Bytes, TransportError> {
        self.body.await
    }

    /// Split into status, headers and the unread body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, BodyFuture) {
        (self.status, self.headers, self.body)
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Network capability the pipeline dispatches through.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request`, abandoning it when `signal` fires.
    async fn dispatch(
        &self,
        request: TransportRequest,
        signal: AbortSignal,
    ) -> Result<TransportResponse, TransportError>;
}

/// Connection-level settings for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Enable gzip decompression.
    pub gzip: bool,
    /// Enable brotli decompression.
    pub brotli: bool,
    /// Follow redirects.
    pub follow_redirects: bool,
    /// Maximum redirects to follow.
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("fetchkit/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
            brotli: true,
            follow_redirects: true,
            max_redirects: 10,
        }
    }
}

impl TransportConfig {
    /// Create a new configuration builder.
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for [`TransportConfig`].
#[derive(Debug, Default)]
pub struct TransportConfigBuilder {
    config: TransportConfig,
}

impl TransportConfigBuilder {
    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enable or disable gzip decompression.
    pub fn gzip(mut self, enable: bool) -> Self {
        self.config.gzip = enable;
        self
    }

    /// Enable or disable brotli decompression.
    pub fn brotli(mut self, enable: bool) -> Self {
        self.config.brotli = enable;
        self
    }

    /// Enable or disable following redirects.
    pub fn follow_redirects(mut self, enable: bool) -> Self {
        self.config.follow_redirects = enable;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> TransportConfig {
        self.config
    }
}

/// Transport backed by [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport from connection settings.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let redirect = if config.follow_redirects {
            reqwest::redirect::Policy::limited(config.max_redirects)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(config.gzip)
            .brotli(config.brotli)
            .redirect(redirect)
            .build()
            .map_err(|e| TransportError::other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get the underlying reqwest client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(TransportConfig::default()).unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to a plain reqwest client");
            Self::from_client(reqwest::Client::new())
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn dispatch(
        &self,
        request: TransportRequest,
        signal: AbortSignal,
    ) -> Result<TransportResponse, TransportError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| TransportError::invalid_url(format!("{}: {e}", request.url)))?;

        let mut builder = self
            .client
            .request(request.method, url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body.into_bytes());
        }

        let response = tokio::select! {
            biased;
            () = signal.aborted() => return Err(TransportError::aborted("request aborted")),
            result = builder.send() => result?,
        };

        debug!(status = %response.status(), url = %response.url(), "Response head received");

        let status = response.status();
        let headers = response.headers().clone();
        let body = async move {
            tokio::select! {
                biased;
                () = signal.aborted() => Err(TransportError::aborted("body read aborted")),
                bytes = response.bytes() => bytes.map_err(TransportError::from),
            }
        };

        Ok(TransportResponse::new(status, headers, body))
    }
}
