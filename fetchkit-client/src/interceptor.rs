//! Request, response and error interceptors.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{FetchResponse, RequestConfig, RequestError, ResponseError};

/// Transforms the resolved configuration before dispatch.
#[async_trait]
pub trait RequestHook: Send + Sync {
    /// Return the configuration to dispatch with.
    async fn on_request(&self, config: RequestConfig) -> RequestConfig;
}

/// Transforms a successful response before it reaches the caller.
#[async_trait]
pub trait ResponseHook: Send + Sync {
    /// Return the response delivered to the caller.
    async fn on_response(&self, response: FetchResponse) -> FetchResponse;
}

/// Transforms an HTTP-level failure before it is surfaced.
#[async_trait]
pub trait ResponseErrorHook: Send + Sync {
    /// Return the error the call is rejected with.
    async fn on_response_error(&self, error: ResponseError) -> ResponseError;
}

/// Transforms a transport-level failure before it is surfaced.
#[async_trait]
pub trait RequestErrorHook: Send + Sync {
    /// Return the error the call is rejected with.
    async fn on_request_error(&self, error: RequestError) -> RequestError;
}

#[async_trait]
impl<F, Fut> RequestHook for F
where
    F: Fn(RequestConfig) -> Fut + Send + Sync,
    Fut: Future<Output = RequestConfig> + Send + 'static,
{
    async fn on_request(&self, config: RequestConfig) -> RequestConfig {
        self(config).await
    }
}

#[async_trait]
impl<F, Fut> ResponseHook for F
where
    F: Fn(FetchResponse) -> Fut + Send + Sync,
    Fut: Future<Output = FetchResponse> + Send + 'static,
{
    async fn on_response(&self, response: FetchResponse) -> FetchResponse {
        self(response).await
    }
}

#[async_trait]
impl<F, Fut> ResponseErrorHook for F
where
    F: Fn(ResponseError) -> Fut + Send + Sync,
    Fut: Future<Output = ResponseError> + Send + 'static,
{
    async fn on_response_error(&self, error: ResponseError) -> ResponseError {
        self(error).await
    }
}

#[async_trait]
impl<F, Fut> RequestErrorHook for F
where
    F: Fn(RequestError) -> Fut + Send + Sync,
    Fut: Future<Output = RequestError> + Send + 'static,
{
    async fn on_request_error(&self, error: RequestError) -> RequestError {
        self(error).await
    }
}

/// The four optional interception points of a call.
#[derive(Clone, Default)]
pub struct Interceptors {
    /// Runs before dispatch.
    pub on_request: Option<Arc<dyn RequestHook>>,
    /// Runs after a 2xx response.
    pub on_response: Option<Arc<dyn ResponseHook>>,
    /// Runs after a non-2xx response.
    pub on_response_error: Option<Arc<dyn ResponseErrorHook>>,
    /// Runs after a transport failure once retry is exhausted.
    pub on_request_error: Option<Arc<dyn RequestErrorHook>>,
}

impl Interceptors {
    /// Install `logger` at all four points.
    pub fn logging(logger: LoggingInterceptor) -> Self {
        let logger = Arc::new(logger);
        Self {
            on_request: Some(logger.clone()),
            on_response: Some(logger.clone()),
            on_response_error: Some(logger.clone()),
            on_request_error: Some(logger),
        }
    }

    /// Check if no hook is installed.
    pub fn is_empty(&self) -> bool {
        self.on_request.is_none()
            && self.on_response.is_none()
            && self.on_response_error.is_none()
            && self.on_request_error.is_none()
    }

    /// Hooks present in `call` replace the ones in `self`.
    pub fn overlay(&self, call: Interceptors) -> Interceptors {
        Interceptors {
            on_request: call.on_request.or_else(|| self.on_request.clone()),
            on_response: call.on_response.or_else(|| self.on_response.clone()),
            on_response_error: call
                .on_response_error
                .or_else(|| self.on_response_error.clone()),
            on_request_error: call
                .on_request_error
                .or_else(|| self.on_request_error.clone()),
        }
    }
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors")
            .field("on_request", &self.on_request.is_some())
            .field("on_response", &self.on_response.is_some())
            .field("on_response_error", &self.on_response_error.is_some())
            .field("on_request_error", &self.on_request_error.is_some())
            .finish()
    }
}

/// Logging interceptor that traces every interception point.
#[derive(Debug, Clone, Default)]
pub struct LoggingInterceptor {
    log_headers: bool,
}

impl LoggingInterceptor {
    /// Create a new logging interceptor.
    pub fn new() -> Self {
        Self { log_headers: false }
    }

    /// Enable logging of headers.
    pub fn with_headers(mut self) -> Self {
        self.log_headers = true;
        self
    }
}

#[async_trait]
impl RequestHook for LoggingInterceptor {
    async fn on_request(&self, config: RequestConfig) -> RequestConfig {
        tracing::debug!(
            method = %config.method,
            url = %config.url,
            timeout = ?config.timeout,
            retry = config.retry,
            "Sending HTTP request"
        );

        if self.log_headers {
            for (name, value) in &config.headers {
                tracing::trace!(header = %name, value = ?value, "Request header");
            }
        }

        config
    }
}

#[async_trait]
impl ResponseHook for LoggingInterceptor {
    async fn on_response(&self, response: FetchResponse) -> FetchResponse {
        tracing::debug!(
            status = %response.status,
            url = %response.config.url,
            "Received HTTP response"
        );

        if self.log_headers {
            for (name, value) in &response.headers {
                tracing::trace!(header = %name, value = ?value, "Response header");
            }
        }

        response
    }
}

#[async_trait]
impl ResponseErrorHook for LoggingInterceptor {
    async fn on_response_error(&self, error: ResponseError) -> ResponseError {
        tracing::warn!(
            status = %error.status,
            url = %error.config.url,
            "HTTP request failed"
        );
        error
    }
}

#[async_trait]
impl RequestErrorHook for LoggingInterceptor {
    async fn on_request_error(&self, error: RequestError) -> RequestError {
        tracing::warn!(
            aborted = error.aborted,
            url = %error.config.url,
            error = %error.message,
            "HTTP request could not be completed"
        );
        error
    }
}
