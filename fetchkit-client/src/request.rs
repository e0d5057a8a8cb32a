//! Verb request builder.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use http::{HeaderMap, Method};
use serde::Serialize;

use crate::config::header_pairs;
use crate::resolve::resolve;
use crate::{
    Fetch, FetchError, FetchOptions, FetchResponse, Payload, RequestError, ResponseType, Result,
};

/// Fixed-method request builder returned by the verb shortcuts.
///
/// Awaiting the builder directly is the same as calling [`send`](Self::send).
#[must_use = "requests do nothing until sent or awaited"]
pub struct RequestBuilder<'a> {
    fetch: &'a Fetch,
    method: Method,
    url: String,
    options: FetchOptions,
    body_error: Option<serde_json::Error>,
}

impl<'a> RequestBuilder<'a> {
    /// Create a new request builder.
    pub(crate) fn new(fetch: &'a Fetch, method: Method, url: String) -> Self {
        Self {
            fetch,
            method,
            url,
            options: FetchOptions::new(),
            body_error: None,
        }
    }

    /// Add a header to the request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.push((name.into(), value.into()));
        self
    }

    /// Add headers from a native header container.
    pub fn headers(mut self, headers: &HeaderMap) -> Self {
        self.options.headers.extend(header_pairs(headers));
        self
    }

    /// Add a query parameter. The value is not percent-encoded.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.options.query.push((key.into(), value.to_string()));
        self
    }

    /// Add multiple query parameters.
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.options
            .query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Set the request body. JSON objects are serialized; anything else is
    /// sent as-is.
    pub fn body(mut self, payload: impl Into<Payload>) -> Self {
        self.options.body = Some(payload.into().into_body());
        self
    }

    /// Set the request body from a serializable value.
    ///
    /// If serialization fails, [`send`](Self::send) rejects with a
    /// [`RequestError`] without dispatching.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match Payload::json(value) {
            Ok(payload) => self.options.body = Some(payload.into_body()),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON body");
                self.body_error = Some(e);
            }
        }
        self
    }

    /// Set a custom timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Enable or disable the one-shot retry for this request.
    pub fn retry(mut self, retry: bool) -> Self {
        self.options.retry = Some(retry);
        self
    }

    /// Set how the response body is decoded.
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.options.response_type = Some(response_type);
        self
    }

    /// Overlay additional per-call options. The verb's method is kept.
    pub fn options(mut self, options: FetchOptions) -> Self {
        self.options = self.options.overlay(options);
        self
    }

    /// Set bearer authentication.
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.into()))
    }

    /// Set basic authentication.
    pub fn basic_auth(
        self,
        username: impl Into<String>,
        password: Option<impl Into<String>>,
    ) -> Self {
        use base64::Engine;
        let credentials = match password {
            Some(p) => format!("{}:{}", username.into(), p.into()),
            None => format!("{}:", username.into()),
        };
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        self.header("Authorization", format!("Basic {}", encoded))
    }

    /// Send the request.
    pub async fn send(mut self) -> Result<FetchResponse> {
        self.options.method = Some(self.method);

        if let Some(e) = self.body_error {
            let config = resolve(self.fetch.defaults(), self.options, self.url);
            return Err(FetchError::Request(RequestError {
                aborted: false,
                message: format!("failed to serialize JSON body: {e}"),
                config: Arc::new(config),
            }));
        }

        self.fetch.fetch(self.url, self.options).await
    }
}

impl<'a> IntoFuture for RequestBuilder<'a> {
    type Output = Result<FetchResponse>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.send())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Body, MockReply, MockTransport, StatusCode};

    fn pipeline() -> (Fetch, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new().with_fallback(MockReply::status(StatusCode::OK)));
        (Fetch::with_transport(FetchOptions::new(), mock.clone()), mock)
    }

    #[tokio::test]
    async fn test_builder_is_awaitable() {
        let (fetch, mock) = pipeline();

        let response = fetch.get("https://api.example.com/ping").await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_queries_keep_order() {
        let (fetch, mock) = pipeline();

        fetch
            .get("https://api.example.com/search")
            .queries([("q", "rust"), ("page", "2")])
            .query("limit", 10)
            .send()
            .await
            .unwrap();

        assert_eq!(
            mock.last_request().unwrap().url,
            "https://api.example.com/search?q=rust&page=2&limit=10"
        );
    }

    #[tokio::test]
    async fn test_json_body() {
        let (fetch, mock) = pipeline();

        fetch
            .put("https://api.example.com/users/1")
            .json(&serde_json::json!({"name": "b"}))
            .send()
            .await
            .unwrap();

        assert_eq!(
            mock.last_request().unwrap().body,
            Some(Body::Text(r#"{"name":"b"}"#.to_string()))
        );
    }

    #[tokio::test]
    async fn test_auth_headers() {
        let (fetch, mock) = pipeline();

        fetch
            .get("https://api.example.com/me")
            .basic_auth("user", Some("pass"))
            .send()
            .await
            .unwrap();
        assert_eq!(
            mock.last_request().unwrap().headers["authorization"],
            "Basic dXNlcjpwYXNz"
        );

        fetch
            .get("https://api.example.com/me")
            .bearer_auth("token123")
            .send()
            .await
            .unwrap();
        assert_eq!(
            mock.last_request().unwrap().headers["authorization"],
            "Bearer token123"
        );
    }

    #[tokio::test]
    async fn test_extra_options_overlay() {
        let (fetch, mock) = pipeline();

        let response = fetch
            .delete("https://api.example.com/users/1")
            .options(
                FetchOptions::builder()
                    .header("X-Reason", "cleanup")
                    .response_type(ResponseType::Text)
                    .build(),
            )
            .send()
            .await
            .unwrap();

        assert_eq!(response.config.response_type, ResponseType::Text);
        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::DELETE);
        assert_eq!(request.headers["x-reason"], "cleanup");
    }

    #[tokio::test]
    async fn test_unserializable_json_rejects_without_dispatch() {
        let (fetch, mock) = pipeline();

        let mut value = std::collections::HashMap::new();
        value.insert((1u8, 2u8), "tuple keys are not valid JSON keys");

        let err = fetch
            .post("https://api.example.com/items")
            .json(&value)
            .send()
            .await
            .unwrap_err();

        let error = err.as_request_error().unwrap();
        assert!(!error.aborted);
        assert!(error.message.starts_with("failed to serialize JSON body"));
        assert_eq!(error.config.method, Method::POST);
        assert_eq!(mock.request_count(), 0);
    }
}
