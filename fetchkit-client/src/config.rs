//! Pipeline configuration.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::interceptor::{
    Interceptors, LoggingInterceptor, RequestErrorHook, RequestHook, ResponseErrorHook,
    ResponseHook,
};
use crate::{Body, FetchResponse, Payload, RequestError, ResponseError};

/// Timeout applied when neither the defaults nor the call set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);

/// How a successful response body is decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseType {
    /// Parse as JSON.
    #[default]
    Json,
    /// Decode as UTF-8 text.
    Text,
    /// Raw bytes tagged with their content type.
    Blob,
    /// Raw bytes.
    ArrayBuffer,
    /// URL-encoded form fields.
    FormData,
}

impl ResponseType {
    /// Selector name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Blob => "blob",
            Self::ArrayBuffer => "arrayBuffer",
            Self::FormData => "formData",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown selector names fall back to [`ResponseType::Json`].
impl FromStr for ResponseType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "text" => Self::Text,
            "blob" => Self::Blob,
            "arrayBuffer" => Self::ArrayBuffer,
            "formData" => Self::FormData,
            _ => Self::Json,
        })
    }
}

/// Partial pipeline options.
///
/// Used both for factory defaults and per-call options. Absent fields fall
/// back to the layer beneath; empty `headers`/`query` count as absent.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Base address relative targets are resolved against.
    pub base_url: Option<String>,
    /// HTTP method.
    pub method: Option<Method>,
    /// Header pairs, applied in order (last write wins per name).
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Option<Body>,
    /// Timeout after which the in-flight exchange is aborted.
    pub timeout: Option<Duration>,
    /// Replay once on transport failure.
    pub retry: Option<bool>,
    /// Response body decoding.
    pub response_type: Option<ResponseType>,
    /// Query pairs appended to the target address.
    pub query: Vec<(String, String)>,
    /// Interception hooks.
    pub interceptors: Interceptors,
}

impl FetchOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new options builder.
    pub fn builder() -> FetchOptionsBuilder {
        FetchOptionsBuilder::default()
    }

    /// Shallow overlay: every field set in `call` wins, headers are unioned
    /// with `call`'s entries applied last.
    pub fn overlay(&self, call: FetchOptions) -> FetchOptions {
        let mut headers = self.headers.clone();
        headers.extend(call.headers);

        FetchOptions {
            base_url: call.base_url.or_else(|| self.base_url.clone()),
            method: call.method.or_else(|| self.method.clone()),
            headers,
            body: call.body.or_else(|| self.body.clone()),
            timeout: call.timeout.or(self.timeout),
            retry: call.retry.or(self.retry),
            response_type: call.response_type.or(self.response_type),
            query: if call.query.is_empty() {
                self.query.clone()
            } else {
                call.query
            },
            interceptors: self.interceptors.overlay(call.interceptors),
        }
    }
}

/// Builder for [`FetchOptions`].
#[derive(Debug, Default)]
pub struct FetchOptionsBuilder {
    options: FetchOptions,
}

impl FetchOptionsBuilder {
    /// Set the base URL relative targets resolve against.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.options.base_url = Some(url.into());
        self
    }

    /// Set the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.options.method = Some(method);
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.push((name.into(), value.into()));
        self
    }

    /// Add multiple headers.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.options
            .headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add headers from a native header container.
    pub fn header_map(mut self, headers: &HeaderMap) -> Self {
        self.options.headers.extend(header_pairs(headers));
        self
    }

    /// Set the request body.
    pub fn body(mut self, payload: impl Into<Payload>) -> Self {
        self.options.body = Some(payload.into().into_body());
        self
    }

    /// Set the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Enable or disable the one-shot retry.
    pub fn retry(mut self, retry: bool) -> Self {
        self.options.retry = Some(retry);
        self
    }

    /// Set the response body decoding.
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.options.response_type = Some(response_type);
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.options.query.push((key.into(), value.to_string()));
        self
    }

    /// Transform the resolved configuration before dispatch.
    pub fn on_request<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(RequestConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RequestConfig> + Send + 'static,
    {
        self.options.interceptors.on_request = Some(Arc::new(hook));
        self
    }

    /// Transform a successful response.
    pub fn on_response<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(FetchResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FetchResponse> + Send + 'static,
    {
        self.options.interceptors.on_response = Some(Arc::new(hook));
        self
    }

    /// Transform an HTTP-level failure.
    pub fn on_response_error<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(ResponseError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResponseError> + Send + 'static,
    {
        self.options.interceptors.on_response_error = Some(Arc::new(hook));
        self
    }

    /// Transform a transport-level failure.
    pub fn on_request_error<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(RequestError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RequestError> + Send + 'static,
    {
        self.options.interceptors.on_request_error = Some(Arc::new(hook));
        self
    }

    /// Install a request hook object.
    pub fn request_hook(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.options.interceptors.on_request = Some(hook);
        self
    }

    /// Install a response hook object.
    pub fn response_hook(mut self, hook: Arc<dyn ResponseHook>) -> Self {
        self.options.interceptors.on_response = Some(hook);
        self
    }

    /// Install a response-error hook object.
    pub fn response_error_hook(mut self, hook: Arc<dyn ResponseErrorHook>) -> Self {
        self.options.interceptors.on_response_error = Some(hook);
        self
    }

    /// Install a request-error hook object.
    pub fn request_error_hook(mut self, hook: Arc<dyn RequestErrorHook>) -> Self {
        self.options.interceptors.on_request_error = Some(hook);
        self
    }

    /// Log every interception point.
    pub fn logging(mut self, logger: LoggingInterceptor) -> Self {
        self.options.interceptors = Interceptors::logging(logger);
        self
    }

    /// Build the options.
    pub fn build(self) -> FetchOptions {
        self.options
    }
}

/// Flatten a header container into one pair per name.
///
/// Multiple values for a name are joined with `", "`. Values that are not
/// visible ASCII are skipped.
pub(crate) fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .keys()
        .filter_map(|name| {
            let values: Vec<&str> = headers
                .get_all(name)
                .iter()
                .filter_map(|value| match value.to_str() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(header = %name, "Skipping non-ASCII header value");
                        None
                    }
                })
                .collect();

            (!values.is_empty()).then(|| (name.as_str().to_string(), values.join(", ")))
        })
        .collect()
}

/// Configuration of a single dispatch attempt.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Final target address (query appended, base applied).
    pub url: String,
    /// HTTP method.
    pub method: Method,
    /// Merged headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Option<Body>,
    /// Timeout for the exchange.
    pub timeout: Duration,
    /// Replay once on transport failure.
    pub retry: bool,
    /// Response body decoding.
    pub response_type: ResponseType,
    /// Interception hooks.
    pub interceptors: Interceptors,
}

impl RequestConfig {
    /// Create a GET configuration with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
            retry: false,
            response_type: ResponseType::Json,
            interceptors: Interceptors::default(),
        }
    }
}

/// Serializable pipeline defaults, e.g. loaded from a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchSettings {
    /// Base URL.
    pub base_url: Option<String>,
    /// Timeout in milliseconds.
    pub timeout: Option<u64>,
    /// Replay once on transport failure.
    pub retry: Option<bool>,
    /// Response body decoding.
    pub response_type: Option<ResponseType>,
    /// Default headers.
    pub headers: BTreeMap<String, String>,
}

impl FetchSettings {
    /// Parse settings from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl From<FetchSettings> for FetchOptions {
    fn from(settings: FetchSettings) -> Self {
        FetchOptions {
            base_url: settings.base_url,
            timeout: settings.timeout.map(Duration::from_millis),
            retry: settings.retry,
            response_type: settings.response_type,
            headers: settings.headers.into_iter().collect(),
            ..Default::default()
        }
    }
}
