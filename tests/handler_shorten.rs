mod common;

use axum::{Router, routing::post};
use axum_test::TestServer;
use serde_json::{Value, json};
use tinylink::api::handlers::shorten_handler;

#[tokio::test]
async fn test_shorten_returns_six_char_key() {
    let (state, _whitelist) = common::create_test_state().await;
    let app = Router::new()
        .route("/api/shorten", post(shorten_handler))
        .with_state(state);

    let server = TestServer::new(app).unwrap();

    let response = server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/some/long/path" }))
        .await;

    response.assert_status_ok();

    let body = response.json::<Value>();
    let id = body["id"].as_str().unwrap();
    assert_eq!(id.len(), 6);
}

#[tokio::test]
async fn test_shorten_is_idempotent() {
    let (state, _whitelist) = common::create_test_state().await;
    let app = Router::new()
        .route("/api/shorten", post(shorten_handler))
        .with_state(state);

    let server = TestServer::new(app).unwrap();

    let first = server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/repeated" }))
        .await;
    let second = server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/repeated" }))
        .await;

    first.assert_status_ok();
    second.assert_status_ok();
    assert_eq!(
        first.json::<Value>()["id"].as_str().unwrap(),
        second.json::<Value>()["id"].as_str().unwrap()
    );
}

#[tokio::test]
async fn test_shorten_rejects_short_url() {
    let (state, _whitelist) = common::create_test_state().await;
    let app = Router::new()
        .route("/api/shorten", post(shorten_handler))
        .with_state(state);

    let server = TestServer::new(app).unwrap();

    let response = server
        .post("/api/shorten")
        .json(&json!({ "url": "short" }))
        .await;

    response.assert_status_bad_request();

    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "invalid_input");
}

#[tokio::test]
async fn test_shorten_rejects_url_without_scheme() {
    let (state, _whitelist) = common::create_test_state().await;
    let app = Router::new()
        .route("/api/shorten", post(shorten_handler))
        .with_state(state);

    let server = TestServer::new(app).unwrap();

    let response = server
        .post("/api/shorten")
        .json(&json!({ "url": "www.example.com/no-scheme" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_shorten_rejects_ftp_scheme() {
    let (state, _whitelist) = common::create_test_state().await;
    let app = Router::new()
        .route("/api/shorten", post(shorten_handler))
        .with_state(state);

    let server = TestServer::new(app).unwrap();

    let response = server
        .post("/api/shorten")
        .json(&json!({ "url": "ftp://example.com/file.iso" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_shorten_rejects_unlisted_host() {
    let (state, _whitelist) = common::create_test_state().await;
    let app = Router::new()
        .route("/api/shorten", post(shorten_handler))
        .with_state(state);

    let server = TestServer::new(app).unwrap();

    let response = server
        .post("/api/shorten")
        .json(&json!({ "url": "https://evil.example.net/page" }))
        .await;

    response.assert_status_bad_request();

    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "reputation_denied");
}

#[tokio::test]
async fn test_shorten_accepts_whitelisted_subdomain() {
    let (state, _whitelist) = common::create_test_state().await;
    let app = Router::new()
        .route("/api/shorten", post(shorten_handler))
        .with_state(state);

    let server = TestServer::new(app).unwrap();

    // ".trusted.org" is a suffix pattern, so subdomains pass too.
    let response = server
        .post("/api/shorten")
        .json(&json!({ "url": "https://api.trusted.org/v1/docs" }))
        .await;

    response.assert_status_ok();
}
