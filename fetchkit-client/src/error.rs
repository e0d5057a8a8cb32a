//! Pipeline error types.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, StatusCode};
use thiserror::Error;

use crate::RequestConfig;

/// Result type for pipeline calls.
pub type Result<T> = std::result::Result<T, FetchError>;

/// Rejection of a pipeline call.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// A response was received but its status was outside 200-299.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// No response was received (network failure, timeout or cancellation).
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl FetchError {
    /// Check if the call was aborted by its timeout.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Request(e) if e.aborted)
    }

    /// Check if this is an HTTP-level failure.
    pub fn is_response_error(&self) -> bool {
        matches!(self, Self::Response(_))
    }

    /// Check if this is a transport-level failure.
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// Get the HTTP status code if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Response(e) => Some(e.status),
            Self::Request(_) => None,
        }
    }

    /// Get the configuration of the attempt that produced this error.
    pub fn config(&self) -> &RequestConfig {
        match self {
            Self::Response(e) => &e.config,
            Self::Request(e) => &e.config,
        }
    }

    /// Borrow the inner response error, if any.
    pub fn as_response_error(&self) -> Option<&ResponseError> {
        match self {
            Self::Response(e) => Some(e),
            Self::Request(_) => None,
        }
    }

    /// Borrow the inner request error, if any.
    pub fn as_request_error(&self) -> Option<&RequestError> {
        match self {
            Self::Request(e) => Some(e),
            Self::Response(_) => None,
        }
    }
}

/// HTTP-level failure: the server answered with a non-success status.
#[derive(Debug, Clone, Error)]
#[error("Response error: {status}")]
pub struct ResponseError {
    /// HTTP status code.
    pub status: StatusCode,
    /// Canonical reason phrase for the status. The phrase sent by the
    /// server is not preserved.
    pub status_text: String,
    /// Response headers.
    pub headers: HeaderMap,
    /// Configuration that produced this response.
    pub config: Arc<RequestConfig>,
}

/// Transport-level failure: no response was obtained.
#[derive(Debug, Clone, Error)]
#[error("Request error: {message}")]
pub struct RequestError {
    /// True iff the failure was caused by the timeout or cancellation.
    pub aborted: bool,
    /// Failure message.
    pub message: String,
    /// Configuration of the failed attempt.
    pub config: Arc<RequestConfig>,
}

/// Failure reported by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

/// Classification of transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The abort signal fired.
    Aborted,
    /// The pipeline timeout elapsed.
    Timeout,
    /// Could not connect to the remote host.
    Connect,
    /// The target address could not be parsed.
    InvalidUrl,
    /// Reading or decoding the response body failed.
    Body,
    /// Anything else.
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Aborted => "aborted",
            Self::Timeout => "timeout",
            Self::Connect => "connection error",
            Self::InvalidUrl => "invalid URL",
            Self::Body => "body error",
            Self::Other => "transport error",
        };
        f.write_str(name)
    }
}

impl TransportError {
    /// Create a transport error of the given kind.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The abort signal fired before the exchange completed.
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Aborted, message)
    }

    /// The pipeline timeout elapsed.
    pub fn timeout(after: Duration) -> Self {
        Self::new(
            TransportErrorKind::Timeout,
            format!("request aborted after {after:?}"),
        )
    }

    /// Connection failure.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    /// Malformed target address.
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::InvalidUrl, message)
    }

    /// Body read or decode failure.
    pub fn body(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Body, message)
    }

    /// Unclassified failure.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Other, message)
    }

    /// Get the failure kind.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Get the failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if the failure was abort-driven (cancellation or timeout).
    pub fn is_abort(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Aborted | TransportErrorKind::Timeout
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        // Client-side timeouts are connection failures; only the pipeline
        // timer aborts a call.
        let kind = if error.is_timeout() || error.is_connect() {
            TransportErrorKind::Connect
        } else if error.is_body() || error.is_decode() {
            TransportErrorKind::Body
        } else if error.is_builder() {
            TransportErrorKind::InvalidUrl
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, error.to_string())
    }
}
