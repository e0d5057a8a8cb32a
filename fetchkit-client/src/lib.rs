//! # Fetchkit Client
//!
//! A thin, configurable request pipeline over a pluggable network transport.
//! A factory captures default options; each call overlays its own options,
//! runs the optional interceptor hooks, dispatches under a timeout and
//! classifies the outcome into a success, an HTTP error or a transport error.
//!
//! ## Features
//!
//! - **Option merging**: Call options win over factory defaults, headers merge key-wise
//! - **Base URL and query**: Relative targets resolve against a base, query pairs are appended
//! - **Timeouts**: Every attempt is aborted once its timeout elapses
//! - **One-shot retry**: A transport failure can be replayed exactly once
//! - **Interceptors**: Request, response, response-error and request-error hooks
//! - **Response types**: JSON, text, blob, array buffer and form data decoding
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fetchkit_client::{create, FetchOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetch = create(
//!         FetchOptions::builder()
//!             .base_url("https://api.example.com")
//!             .build(),
//!     );
//!
//!     let response = fetch.get("/users").query("id", 1).send().await?;
//!
//!     println!("Status: {}", response.status);
//!     Ok(())
//! }
//! ```
//!
//! ## With Interceptors, Timeout and Retry
//!
//! ```rust,no_run
//! use fetchkit_client::{create, FetchOptions, RequestConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetch = create(
//!         FetchOptions::builder()
//!             .base_url("https://api.example.com")
//!             .timeout(Duration::from_secs(5))
//!             .retry(true)
//!             .on_request(|mut config: RequestConfig| async move {
//!                 config.headers.insert("x-request-source", "fetchkit".parse().unwrap());
//!                 config
//!             })
//!             .build(),
//!     );
//!
//!     // Plain JSON objects are serialized into the body
//!     let response = fetch
//!         .post("/orders")
//!         .body(serde_json::json!({"item": "widget", "quantity": 5}))
//!         .send()
//!         .await?;
//!
//!     println!("Created: {:?}", response.data);
//!     Ok(())
//! }
//! ```

mod body;
mod client;
mod config;
mod error;
mod interceptor;
mod mock;
mod request;
mod resolve;
mod response;
mod transport;

pub use body::{Body, Payload};
pub use client::{create, Fetch};
pub use config::{FetchOptions, FetchOptionsBuilder, FetchSettings, RequestConfig, ResponseType, DEFAULT_TIMEOUT};
pub use error::{FetchError, RequestError, ResponseError, Result, TransportError, TransportErrorKind};
pub use interceptor::{
    Interceptors, LoggingInterceptor, RequestErrorHook, RequestHook, ResponseErrorHook,
    ResponseHook,
};
pub use mock::{MockReply, MockTransport};
pub use request::RequestBuilder;
pub use resolve::{append_query, merge_headers, resolve, resolve_base_url};
pub use response::{FetchResponse, ResponseBody};
pub use transport::{
    AbortSignal, BodyFuture, ReqwestTransport, Transport, TransportConfig, TransportConfigBuilder,
    TransportRequest, TransportResponse,
};

// Re-export common types
pub use bytes::Bytes;
pub use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use fetchkit_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::body::{Body, Payload};
    pub use crate::client::{create, Fetch};
    pub use crate::config::{FetchOptions, FetchOptionsBuilder, RequestConfig, ResponseType};
    pub use crate::error::{FetchError, RequestError, ResponseError, Result};
    pub use crate::interceptor::LoggingInterceptor;
    pub use crate::request::RequestBuilder;
    pub use crate::response::{FetchResponse, ResponseBody};
    pub use crate::transport::{AbortSignal, ReqwestTransport, Transport};
    pub use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
}
