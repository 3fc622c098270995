//! One-shot request and cancellation tests

mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use httpoll::{
    is_cancel, join_all, HttpClient, HttpollError, RequestBody, RequestConfig,
    DEFAULT_CANCEL_MESSAGE,
};

#[tokio::test]
async fn test_get_returns_json_body() {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "ok"})))
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let response = client
        .get(&format!("{}/status", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["state"], "ok");
}

#[tokio::test]
async fn test_post_sends_json_body() {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/items"))
        .and(body_json(json!({"name": "John", "age": 30})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let response = client
        .post(
            &format!("{}/items", server.uri()),
            RequestBody::Json(json!({"name": "John", "age": 30})),
            None,
        )
        .await
        .unwrap();

    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["id"], 1);
}

#[tokio::test]
async fn test_put_sends_form_body() {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/form"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("username=john&greeting=hello"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let response = client
        .put(
            &format!("{}/form", server.uri()),
            RequestBody::Form(vec![
                ("username".to_string(), "john".to_string()),
                ("greeting".to_string(), "hello".to_string()),
            ]),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_query_params_and_headers_applied() {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .and(header("x-request-tag", "abc"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let config = RequestConfig::new()
        .param("page", "1")
        .param("limit", "10")
        .header("x-request-tag", "abc");
    let response = client
        .get(&format!("{}/search", server.uri()), Some(config))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_default_headers_merge_and_caller_wins() {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/merged"))
        .and(header("x-token", "override"))
        .and(header("x-keep", "base"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = HttpClient::builder()
        .default_header("x-token", "base")
        .default_header("x-keep", "base")
        .build()
        .unwrap();
    let config = RequestConfig::new().header("x-token", "override");
    let response = client
        .get(&format!("{}/merged", server.uri()), Some(config))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_base_url_joins_relative_paths() {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = HttpClient::builder()
        .base_url(format!("{}/api/", server.uri()))
        .build()
        .unwrap();
    let response = client.get("status", None).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_request_verb_requires_method_and_url() {
    common::init_tracing();
    let client = HttpClient::new();
    let err = client.request(RequestConfig::new()).await.unwrap_err();
    assert!(matches!(err, HttpollError::Config(_)));
    assert!(!is_cancel(&err));
}

#[tokio::test]
async fn test_request_verb_with_full_config() {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/things/7"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let config = RequestConfig::new()
        .method(reqwest::Method::DELETE)
        .url(format!("{}/things/7", server.uri()));
    let response = client.request(config).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_non_2xx_status_is_a_failure() {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let err = client
        .get(&format!("{}/broken", server.uri()), None)
        .await
        .unwrap_err();
    assert!(!is_cancel(&err));
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_request() {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let request = client.get(&format!("{}/slow", server.uri()), None);
    let handle = request.cancel_handle();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel(None);
    });

    let err = request.await.unwrap_err();
    assert!(is_cancel(&err));
    assert_eq!(err.to_string(), DEFAULT_CANCEL_MESSAGE);
}

#[tokio::test]
async fn test_cancel_propagates_through_chained_continuations() {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let chained = client
        .get(&format!("{}/slow", server.uri()), None)
        .map(|response| response.text())
        .and_then(|text| Ok(text.len()))
        .finally(|| {});

    // Cancelling the outermost derived result aborts the original request.
    chained.cancel(Some("caller went away"));
    let err = chained.await.unwrap_err();
    assert!(is_cancel(&err));
    assert_eq!(err.to_string(), "caller went away");
}

#[tokio::test]
async fn test_join_all_passthrough() {
    common::init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("b"))
        .mount(&server)
        .await;

    let client = HttpClient::new();
    let results = join_all(vec![
        client.get(&format!("{}/a", server.uri()), None),
        client.get(&format!("{}/b", server.uri()), None),
    ])
    .await;

    let bodies: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().text())
        .collect();
    assert_eq!(bodies, vec!["a".to_string(), "b".to_string()]);
}
