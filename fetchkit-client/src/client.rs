//! Request pipeline.

use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode};
use tracing::{debug, warn};

use crate::response::status_text;
use crate::{
    AbortSignal, FetchError, FetchOptions, FetchResponse, ReqwestTransport, RequestBuilder,
    RequestConfig, RequestError, ResponseBody, ResponseError, Result, Transport, TransportError,
    TransportRequest,
};

/// A transport failure is replayed at most once.
const MAX_ATTEMPTS: u32 = 2;

/// Create a pipeline over the default reqwest transport.
pub fn create(defaults: FetchOptions) -> Fetch {
    Fetch::new(defaults)
}

/// Configured request pipeline.
///
/// Cloning is cheap; clones share defaults and transport. Every call
/// resolves its own configuration, so calls never share mutable state.
#[derive(Clone)]
pub struct Fetch {
    defaults: Arc<FetchOptions>,
    transport: Arc<dyn Transport>,
}

/// Outcome of a completed exchange.
enum Exchange {
    Accepted {
        status: StatusCode,
        headers: HeaderMap,
        data: ResponseBody,
    },
    Rejected {
        status: StatusCode,
        headers: HeaderMap,
    },
}

impl Fetch {
    /// Create a pipeline over the default reqwest transport.
    pub fn new(defaults: FetchOptions) -> Self {
        Self::with_transport(defaults, Arc::new(ReqwestTransport::default()))
    }

    /// Create a pipeline over a custom transport.
    pub fn with_transport(defaults: FetchOptions, transport: Arc<dyn Transport>) -> Self {
        Self {
            defaults: Arc::new(defaults),
            transport,
        }
    }

    /// Get the factory defaults.
    pub fn defaults(&self) -> &FetchOptions {
        &self.defaults
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::GET, url)
    }

    /// Create a POST request builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::POST, url)
    }

    /// Create a PUT request builder.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::PUT, url)
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::DELETE, url)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::PATCH, url)
    }

    /// Create a HEAD request builder.
    pub fn head(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::HEAD, url)
    }

    /// Create a TRACE request builder.
    pub fn trace(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::TRACE, url)
    }

    /// Create an OPTIONS request builder.
    pub fn options(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::OPTIONS, url)
    }

    /// Create a CONNECT request builder.
    pub fn connect(&self, url: impl Into<String>) -> RequestBuilder<'_> {
        self.request(Method::CONNECT, url)
    }

    /// Create a request builder with a custom method.
    pub fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, method, url.into())
    }

    /// Run the pipeline for `url` with per-call `options`.
    pub async fn fetch(&self, url: impl Into<String>, options: FetchOptions) -> Result<FetchResponse> {
        let config = crate::resolve::resolve(&self.defaults, options, url);
        self.execute(config).await
    }

    /// Request hook, dispatch, classification and the single retry.
    async fn execute(&self, mut config: RequestConfig) -> Result<FetchResponse> {
        let mut attempt = 1;

        loop {
            if let Some(hook) = config.interceptors.on_request.clone() {
                config = hook.on_request(config).await;
            }

            debug!(
                attempt,
                method = %config.method,
                url = %config.url,
                "Dispatching request"
            );

            let outcome = self.dispatch(&config).await;
            let shared = Arc::new(config);

            match outcome {
                Ok(Exchange::Accepted {
                    status,
                    headers,
                    data,
                }) => {
                    let mut response = FetchResponse {
                        data,
                        status,
                        status_text: status_text(status),
                        headers,
                        config: shared.clone(),
                    };
                    if let Some(hook) = &shared.interceptors.on_response {
                        response = hook.on_response(response).await;
                    }
                    return Ok(response);
                }
                Ok(Exchange::Rejected { status, headers }) => {
                    debug!(status = %status, url = %shared.url, "Request rejected by server");
                    let mut error = ResponseError {
                        status,
                        status_text: status_text(status),
                        headers,
                        config: shared.clone(),
                    };
                    if let Some(hook) = &shared.interceptors.on_response_error {
                        error = hook.on_response_error(error).await;
                    }
                    return Err(FetchError::Response(error));
                }
                Err(e) if shared.retry && attempt < MAX_ATTEMPTS => {
                    warn!(attempt, error = %e, url = %shared.url, "Transport failure, retrying once");
                    config = Arc::unwrap_or_clone(shared);
                    config.retry = false;
                    attempt += 1;
                }
                Err(e) => {
                    debug!(error = %e, url = %shared.url, "Request failed");
                    let mut error = RequestError {
                        aborted: e.is_abort(),
                        message: e.message().to_string(),
                        config: shared.clone(),
                    };
                    if let Some(hook) = &shared.interceptors.on_request_error {
                        error = hook.on_request_error(error).await;
                    }
                    return Err(FetchError::Request(error));
                }
            }
        }
    }

    /// One attempt under a timeout-armed abort signal.
    ///
    /// The timer lives only as long as this future, so it can never fire
    /// after the attempt has settled.
    async fn dispatch(&self, config: &RequestConfig) -> std::result::Result<Exchange, TransportError> {
        let signal = AbortSignal::new();

        tokio::select! {
            biased;
            outcome = self.exchange(config, signal.clone()) => outcome,
            () = tokio::time::sleep(config.timeout) => {
                signal.abort();
                warn!(timeout = ?config.timeout, url = %config.url, "Request timed out");
                Err(TransportError::timeout(config.timeout))
            }
        }
    }

    /// Send the request and decode the body of a successful response.
    async fn exchange(
        &self,
        config: &RequestConfig,
        signal: AbortSignal,
    ) -> std::result::Result<Exchange, TransportError> {
        let response = self
            .transport
            .dispatch(TransportRequest::from(config), signal)
            .await?;
        let (status, headers, body) = response.into_parts();

        if !status.is_success() {
            return Ok(Exchange::Rejected { status, headers });
        }

        let bytes = body.await?;
        let data = ResponseBody::decode(config.response_type, &headers, bytes).await?;
        Ok(Exchange::Accepted {
            status,
            headers,
            data,
        })
    }
}

impl std::fmt::Debug for Fetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetch")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Default for Fetch {
    fn default() -> Self {
        Self::new(FetchOptions::default())
    }
}
