//! Integration tests for common Fetchkit workflows.
//!
//! These tests verify that the most common use cases work correctly.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fetchkit::*;
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
}

// =============================================================================
// Factory and verb shortcuts
// =============================================================================

#[tokio::test]
async fn test_typed_json_roundtrip_through_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7, "name": "a"})))
        .mount(&server)
        .await;

    let fetch = create(FetchOptions::builder().base_url(server.uri()).build());
    let user: User = fetch.get("/users/7").await.unwrap().json().unwrap();

    assert_eq!(
        user,
        User {
            id: 7,
            name: "a".to_string()
        }
    );
}

#[tokio::test]
async fn test_defaults_loaded_from_settings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("up"))
        .mount(&server)
        .await;

    let settings = FetchSettings::from_json(&format!(
        r#"{{"baseUrl": "{}", "timeout": 1000, "responseType": "text"}}"#,
        server.uri()
    ))
    .unwrap();

    let fetch = create(settings.into());
    let response = fetch.get("/health").send().await.unwrap();

    assert_eq!(response.text(), Some("up"));
    assert_eq!(response.config.timeout, Duration::from_millis(1000));
}

// =============================================================================
// Interceptors
// =============================================================================

#[tokio::test]
async fn test_hooks_run_once_per_attempt_in_order() {
    let requests = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));

    let mock = Arc::new(MockTransport::new());
    mock.enqueue(MockReply::connect_error());
    mock.enqueue(MockReply::connect_error());

    let request_counter = requests.clone();
    let error_counter = errors.clone();
    let fetch = Fetch::with_transport(
        FetchOptions::builder()
            .retry(true)
            .on_request(move |config: RequestConfig| {
                request_counter.fetch_add(1, Ordering::SeqCst);
                async move { config }
            })
            .on_request_error(move |mut error: RequestError| {
                error_counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    error.message = format!("wrapped: {}", error.message);
                    error
                }
            })
            .build(),
        mock.clone(),
    );

    let err = fetch.get("https://api.example.com/").send().await.unwrap_err();

    assert_eq!(requests.load(Ordering::SeqCst), 2);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert_eq!(
        err.as_request_error().unwrap().message,
        "wrapped: connection refused"
    );
}

#[tokio::test]
async fn test_logging_interceptor_does_not_change_outcome() {
    let mock = Arc::new(MockTransport::new());
    mock.enqueue(MockReply::json(StatusCode::OK, json!({"id": 1, "name": "a"})));

    let fetch = Fetch::with_transport(
        FetchOptions::builder()
            .logging(LoggingInterceptor::new().with_headers())
            .build(),
        mock,
    );

    let response = fetch.get("https://api.example.com/users/1").await.unwrap();
    assert_eq!(response.json::<User>().unwrap().id, 1);
}

// =============================================================================
// Timeouts
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_hanging_transport_is_aborted() {
    let mock = Arc::new(MockTransport::new().with_fallback(MockReply::Hang));
    let fetch = Fetch::with_transport(
        FetchOptions::builder()
            .timeout(Duration::from_millis(10))
            .build(),
        mock.clone(),
    );

    let err = fetch.get("https://api.example.com/slow").await.unwrap_err();

    assert!(err.is_aborted());
    assert_eq!(mock.request_count(), 1);
}
