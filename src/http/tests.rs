//! Tests for the HTTP transport module

use super::*;
use crate::error::Error;
use crate::types::Method;
use crate::validate::QueryParams;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(20),
        ..RetryPolicy::default()
    }
}

fn client_for(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .retry(fast_retry())
        .build();
    HttpClient::with_config(config).unwrap()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.connect_timeout, Duration::from_secs(10));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.initial_backoff, Duration::from_millis(200));
    assert!(config.user_agent.starts_with("catalog-client/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://catalog.example.com")
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(3))
        .max_attempts(2)
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, "https://catalog.example.com");
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.connect_timeout, Duration::from_secs(3));
    assert_eq!(config.retry.max_attempts, 2);
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_empty_base_url_rejected() {
    let err = HttpClient::with_config(HttpClientConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_request_config_builder() {
    let config = RequestConfig::new()
        .query("limit", "10")
        .query("skip", "0")
        .header("X-Request-Id", "abc123")
        .json(json!({"key": "value"}))
        .timeout(Duration::from_secs(10))
        .attempts(2);

    assert_eq!(config.query.get("limit"), Some("10"));
    assert_eq!(config.query.get("skip"), Some("0"));
    assert_eq!(
        config.headers.get("X-Request-Id"),
        Some(&"abc123".to_string())
    );
    assert!(matches!(config.body, RequestBody::Json(_)));
    assert_eq!(config.timeout, Some(Duration::from_secs(10)));
    assert_eq!(config.max_attempts, Some(2));
}

#[test]
fn test_build_url_has_no_double_slash() {
    let config = HttpClientConfig::builder()
        .base_url("https://catalog.example.com/")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(
        client.build_url("/integration/v2/table/").unwrap().as_str(),
        "https://catalog.example.com/integration/v2/table/"
    );
    assert_eq!(
        client.build_url("integration/v2/table/").unwrap().as_str(),
        "https://catalog.example.com/integration/v2/table/"
    );
    assert_eq!(
        client
            .build_url("https://other.example.com/x?page=2")
            .unwrap()
            .as_str(),
        "https://other.example.com/x?page=2"
    );
}

#[tokio::test]
async fn test_http_client_get_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/integration/v2/datasource/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client.get("/integration/v2/datasource/").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, ResponseBody::Json(json!([{"id": 1}])));

    let typed: Vec<serde_json::Value> = client
        .get_json("/integration/v2/datasource/")
        .await
        .unwrap();
    assert_eq!(typed.len(), 1);
}

#[tokio::test]
async fn test_http_client_text_body_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client.get("/ping").await.unwrap();
    assert_eq!(response.body.as_text(), Some("pong"));
}

#[tokio::test]
async fn test_http_client_post_strips_nulls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/integration/v2/document/"))
        .and(body_json(json!({"title": "Doc"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"job_id": 3})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .post(
            "/integration/v2/document/",
            &json!({"title": "Doc", "description": null}),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn test_http_client_json_with_nulls_is_preserved() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/x"))
        .and(body_json(json!({"value": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client
        .request(
            Method::PATCH,
            "/x",
            RequestConfig::new().body(RequestBody::JsonWithNulls(json!({"value": null}))),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_http_client_default_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .and(header("content-type", "application/json; charset=utf-8"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.get("/x").await.unwrap();
}

#[tokio::test]
async fn test_http_client_query_params_in_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/integration/v2/schema/"))
        .and(query_param("ds_id", "7"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let mut query = QueryParams::new();
    query.push("ds_id", "7");
    query.push("limit", "100");
    client
        .get_with_query("/integration/v2/schema/", query)
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received[0].url.query(), Some("ds_id=7&limit=100"));
}

#[tokio::test]
async fn test_http_client_injects_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/integration/v2/table/"))
        .and(header("Token", "access-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.set_token(Some("access-123".to_string()));
    client.get("/integration/v2/table/").await.unwrap();
}

#[tokio::test]
async fn test_http_client_skips_token_on_auth_paths() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/integration/v1/validateRefreshToken/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.set_token(Some("access-123".to_string()));
    client
        .post("/integration/v1/validateRefreshToken/", &json!({}))
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert!(received[0].headers.get("token").is_none());
}

#[tokio::test]
async fn test_http_client_request_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data"))
        .and(header("X-Request-Id", "req-456"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .request(
            Method::GET,
            "/api/data",
            RequestConfig::new().header("X-Request-Id", "req-456"),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_http_client_404_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.get("/api/missing").await.unwrap_err();

    match err {
        Error::HttpStatus { status, body, url } => {
            assert_eq!(status, 404);
            assert_eq!(body, ResponseBody::Json(json!({"detail": "Not found"})));
            assert!(url.ends_with("/api/missing"));
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_client_400_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.post("/api/items", &json!({})).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_http_client_retry_on_503() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client.get("/api/flaky").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_http_client_max_attempts_exceeded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/always-fail"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(5)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.get("/api/always-fail").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_http_client_per_request_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .request(Method::GET, "/api/limited", RequestConfig::new().attempts(2))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(429));
}

#[tokio::test]
async fn test_http_client_single_attempt_override() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/once"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .request(Method::GET, "/api/once", RequestConfig::new().attempts(1))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_http_client_raw_ndjson_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/bulk_metadata/extraction/3"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"job_name": "j"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let body = RequestBody::ndjson(&[json!({"key": "a"}), json!({"key": "b"})]).unwrap();
    client
        .request(
            Method::POST,
            "/api/v1/bulk_metadata/extraction/3",
            RequestConfig::new().body(body),
        )
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received[0].body, b"{\"key\":\"a\"}\n{\"key\":\"b\"}".to_vec());
}

#[tokio::test]
async fn test_http_client_multipart_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let form = MultipartForm::new().file("csv_file", "a.csv", b"x,y".to_vec(), Some("text/csv"));
    client
        .request(
            Method::POST,
            "/upload",
            RequestConfig::new().body(RequestBody::Multipart(form)),
        )
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let content_type = received[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
}

#[tokio::test]
async fn test_http_client_next_page_header_case_insensitive() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/p"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-NEXT-PAGE", "/p?page=2")
                .set_body_json(json!([1])),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client.get("/p").await.unwrap();
    assert_eq!(response.next_page(), Some("/p?page=2"));
    assert_eq!(response.header("x-next-page"), Some("/p?page=2"));
}

#[tokio::test]
async fn test_http_client_cancelled_before_send() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.cancel_handle().cancel();

    let err = client.get("/x").await.unwrap_err();
    assert!(matches!(err, Error::Cancelled { .. }));
    assert!(client.is_cancelled());
}

#[tokio::test]
async fn test_http_client_cancel_interrupts_sleep() {
    let mock_server = MockServer::start().await;
    let client = client_for(&mock_server);
    let handle = client.cancel_handle();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });

    let err = client.sleep(Duration::from_secs(30)).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled { .. }));
}

#[test]
fn test_http_client_debug_hides_token() {
    let config = HttpClientConfig::builder()
        .base_url("https://catalog.example.com")
        .build();
    let client = HttpClient::with_config(config).unwrap();
    client.set_token(Some("super-secret".to_string()));

    let debug_str = format!("{client:?}");
    assert!(debug_str.contains("HttpClient"));
    assert!(debug_str.contains("has_token: true"));
    assert!(!debug_str.contains("super-secret"));
}
