//! Integration tests for fetchkit-client over a real HTTP server.

use std::time::Duration;

use fetchkit_client::*;
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Fetch {
    create(FetchOptions::builder().base_url(server.uri()).build())
}

#[tokio::test]
async fn test_get_with_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "a"}])))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .get("/users")
        .query("id", "1")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.status_text, "OK");
    assert_eq!(response.data.as_json(), Some(&json!([{"id": 1, "name": "a"}])));
    assert_eq!(response.config.url, format!("{}/users?id=1", server.uri()));
}

#[tokio::test]
async fn test_post_json_object_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_string(r#"{"name":"a"}"#))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .post("/users")
        .body(json!({"name": "a"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json::<serde_json::Value>().unwrap(), json!({"id": 2}));
}

#[tokio::test]
async fn test_default_and_call_headers_are_merged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("accept", "text/plain"))
        .and(header("x-client", "fetchkit"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let fetch = create(
        FetchOptions::builder()
            .base_url(server.uri())
            .header("Accept", "application/json")
            .header("X-Client", "fetchkit")
            .response_type(ResponseType::Text)
            .build(),
    );

    let response = fetch
        .get("/greeting")
        .header("Accept", "text/plain")
        .send()
        .await
        .unwrap();
    assert_eq!(response.text(), Some("hello"));
}

#[tokio::test]
async fn test_not_found_is_response_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetch = create(
        FetchOptions::builder()
            .base_url(server.uri())
            .retry(true)
            .build(),
    );

    let err = fetch.get("/missing").send().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert!(err.is_response_error());
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get("/slow")
        .timeout(Duration::from_millis(50))
        .send()
        .await
        .unwrap_err();

    assert!(err.is_aborted());
}

#[tokio::test]
async fn test_array_buffer_and_form_data() {
    let server = MockServer::start().await;
    Mock::given(path("/raw"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;
    Mock::given(path("/form"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("name=a&role=admin", "application/x-www-form-urlencoded"),
        )
        .mount(&server)
        .await;

    let fetch = client_for(&server);

    let raw = fetch
        .get("/raw")
        .response_type(ResponseType::ArrayBuffer)
        .send()
        .await
        .unwrap();
    assert_eq!(raw.data.as_bytes().map(|b| b.to_vec()), Some(vec![1u8, 2, 3]));

    let form = fetch
        .get("/form")
        .response_type(ResponseType::FormData)
        .send()
        .await
        .unwrap();
    assert_eq!(
        form.data.as_form(),
        Some(
            &[
                ("name".to_string(), "a".to_string()),
                ("role".to_string(), "admin".to_string())
            ][..]
        )
    );
}

#[tokio::test]
async fn test_multipart_form_data() {
    let server = MockServer::start().await;
    let body = "--boundary42\r\n\
         Content-Disposition: form-data; name=\"title\"\r\n\
         \r\n\
         Report\r\n\
         --boundary42\r\n\
         Content-Disposition: form-data; name=\"pages\"\r\n\
         \r\n\
         12\r\n\
         --boundary42--\r\n";
    Mock::given(path("/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "multipart/form-data; boundary=boundary42"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .get("/upload")
        .response_type(ResponseType::FormData)
        .retry(true)
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.data.as_form(),
        Some(
            &[
                ("title".to_string(), "Report".to_string()),
                ("pages".to_string(), "12".to_string())
            ][..]
        )
    );
}

#[tokio::test]
async fn test_connection_refused_retries_once() {
    // Nothing listens on the discard port.
    let fetch = create(
        FetchOptions::builder()
            .base_url("http://127.0.0.1:9")
            .retry(true)
            .timeout(Duration::from_secs(5))
            .build(),
    );

    let err = fetch.get("/unreachable").send().await.unwrap_err();
    let error = err.as_request_error().unwrap();
    assert!(!error.aborted);
    assert!(!error.config.retry);
}
