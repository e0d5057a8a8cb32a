//! Scripted in-memory transport.
//!
//! Useful for testing code built on [`Fetch`](crate::Fetch) without a
//! network.
//!
//! ```
//! use std::sync::Arc;
//! use fetchkit_client::{Fetch, FetchOptions, MockReply, MockTransport, StatusCode};
//!
//! # tokio_test::block_on(async {
//! let mock = Arc::new(MockTransport::new());
//! mock.enqueue(MockReply::json(StatusCode::OK, serde_json::json!({"id": 1})));
//!
//! let fetch = Fetch::with_transport(FetchOptions::new(), mock.clone());
//! let response = fetch.get("https://api.example.com/users/1").send().await.unwrap();
//! assert_eq!(response.status, StatusCode::OK);
//! assert_eq!(mock.request_count(), 1);
//! # });
//! ```

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode};
use parking_lot::Mutex;

use crate::{AbortSignal, Transport, TransportError, TransportRequest, TransportResponse};

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer with a response.
    Respond {
        /// Status code.
        status: StatusCode,
        /// Response headers.
        headers: HeaderMap,
        /// Response body.
        body: Bytes,
    },
    /// Fail at the transport level.
    Fail(TransportError),
    /// Never answer; settles only when the abort signal fires.
    Hang,
}

impl MockReply {
    /// Response with an empty body.
    pub fn status(status: StatusCode) -> Self {
        Self::Respond {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// JSON response.
    pub fn json(status: StatusCode, value: serde_json::Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self::Respond {
            status,
            headers,
            body: Bytes::from(value.to_string()),
        }
    }

    /// Plain-text response.
    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self::Respond {
            status,
            headers,
            body: Bytes::from(text.into()),
        }
    }

    /// Connection failure.
    pub fn connect_error() -> Self {
        Self::Fail(TransportError::connect("connection refused"))
    }
}

/// Transport that replays queued [`MockReply`] values and records requests.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    fallback: Option<MockReply>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    /// Create a transport with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` whenever the queue is empty.
    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Queue a reply.
    pub fn enqueue(&self, reply: MockReply) {
        self.replies.lock().push_back(reply);
    }

    /// Requests dispatched so far.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Number of dispatch attempts so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Most recent request.
    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().last().cloned()
    }

    fn next_reply(&self) -> Option<MockReply> {
        self.replies
            .lock()
            .pop_front()
            .or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn dispatch(
        &self,
        request: TransportRequest,
        signal: AbortSignal,
    ) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push(request);

        match self.next_reply() {
            Some(MockReply::Respond {
                status,
                headers,
                body,
            }) => Ok(TransportResponse::from_bytes(status, headers, body)),
            Some(MockReply::Fail(error)) => Err(error),
            Some(MockReply::Hang) => {
                signal.aborted().await;
                Err(TransportError::aborted("request aborted"))
            }
            None => Err(TransportError::other("no scripted reply")),
        }
    }
}
