//! Integration tests for the web server routes
//!
//! These drive the production router through tower's `oneshot` without
//! binding a socket or talking to Telegram. The webhook tests only cover
//! paths that never reach the Telegram API.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use arkivbot::core::config::Config;
use arkivbot::core::web_server::{router, WebState};
use arkivbot::storage::{create_backend, MetaStore, StorageMode, UploadRecord};
use arkivbot::telegram::{create_bot, schema, HandlerDeps};

/// Bot identity in the shape Telegram's getMe returns it.
fn test_me() -> teloxide::types::Me {
    serde_json::from_value(serde_json::json!({
        "id": 987654321_i64,
        "is_bot": true,
        "first_name": "arkivbot",
        "username": "arkivbot",
        "can_join_groups": false,
        "can_read_all_group_messages": false,
        "supports_inline_queries": false
    }))
    .expect("static getMe payload should deserialize")
}

fn test_config(dir: &Path) -> Config {
    Config {
        bot_token: "ABC123".to_string(),
        storage_mode: StorageMode::Local,
        s3: None,
        supabase: None,
        webhook_host: None,
        port: 0,
        admin_ids: vec![],
        uploads_dir: dir.join("files"),
        meta_file: dir.join("files.json"),
        static_dir: dir.join("static"),
        log_file: dir.join("app.log").to_string_lossy().into_owned(),
    }
}

async fn test_state(dir: &Path) -> WebState {
    let config = Arc::new(test_config(dir));
    tokio::fs::create_dir_all(&config.uploads_dir).await.unwrap();

    let meta = Arc::new(MetaStore::new(config.meta_file.clone()));
    meta.init_if_absent().await.unwrap();

    let backend = create_backend(&config).unwrap();
    let bot = create_bot(&config).unwrap();
    let handler = schema(HandlerDeps::new(Arc::clone(&config), Arc::clone(&meta), backend));

    WebState {
        config,
        meta,
        bot,
        me: test_me(),
        handler,
    }
}

fn record(name: &str, url: &str) -> UploadRecord {
    UploadRecord {
        file_name: name.to_string(),
        uploader_id: 7,
        storage: StorageMode::S3,
        url: url.to_string(),
    }
}

#[tokio::test]
async fn test_webhook_token_mismatch_is_forbidden_and_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/webhook/WRONG")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"update_id": 1}"#))
        .unwrap();

    let response = router(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert!(state.meta.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_acknowledges_unhandled_updates() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;

    // An update no handler branch matches still gets the fixed ack.
    let request = Request::builder()
        .method("POST")
        .uri("/webhook/ABC123")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"update_id": 1}"#))
        .unwrap();

    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let ack: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(ack, serde_json::json!({"ok": true}));
}

#[tokio::test]
async fn test_webhook_rejects_malformed_body() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;

    let request = Request::builder()
        .method("POST")
        .uri("/webhook/ABC123")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();

    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_serve_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;

    let request = Request::builder()
        .uri("/files/missing.pdf")
        .body(Body::empty())
        .unwrap();

    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_serve_staged_file_round_trips_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;

    let payload = b"%PDF-1.4 fake book contents".to_vec();
    tokio::fs::write(state.config.uploads_dir.join("report.pdf"), &payload)
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/files/report.pdf")
        .body(Body::empty())
        .unwrap();

    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body.as_ref(), payload.as_slice());
}

#[tokio::test]
async fn test_serve_recorded_file_redirects_to_stored_url() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;

    state
        .meta
        .append(record("remote.pdf", "https://books.s3.us-east-1.amazonaws.com/remote.pdf"))
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/files/remote.pdf")
        .body(Body::empty())
        .unwrap();

    let response = router(state).oneshot(request).await.unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://books.s3.us-east-1.amazonaws.com/remote.pdf"
    );
}

#[tokio::test]
async fn test_index_lists_uploads_in_store_order() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;

    state
        .meta
        .append(record("a.pdf", "https://books.s3.us-east-1.amazonaws.com/a.pdf"))
        .await
        .unwrap();
    state
        .meta
        .append(record("b.pdf", "https://books.s3.us-east-1.amazonaws.com/b.pdf"))
        .await
        .unwrap();

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();

    let a = html.find("a.pdf").expect("a.pdf should be listed");
    let b = html.find("b.pdf").expect("b.pdf should be listed");
    assert!(a < b, "most recent upload should come last");
}

#[tokio::test]
async fn test_health_check() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path()).await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
