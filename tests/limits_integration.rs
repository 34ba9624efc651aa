mod common;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use common::{FixedRecognizer, PNG_BYTES, StalledRecognizer, TestApp, test_config};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

fn png_form(bytes: Vec<u8>) -> MultipartForm {
    MultipartForm::new()
        .add_part(
            "file",
            Part::bytes(bytes)
                .file_name("scan.png")
                .mime_type("image/png"),
        )
        .add_text("output_format", "txt")
}

#[tokio::test]
async fn test_oversized_upload_is_payload_too_large() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path().join("uploads"), true);
    config.server.max_upload_bytes = 1024;
    let recognizer = Arc::new(FixedRecognizer::new(&["never"]));
    let app = TestApp::with_config(recognizer.clone(), config, dir).await;

    let mut image = PNG_BYTES.to_vec();
    image.resize(4096, 0);
    let response = app.server.post("/api/upload").multipart(png_form(image)).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert!(recognizer.calls().is_empty());
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_within_limit_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path().join("uploads"), true);
    config.server.max_upload_bytes = 64 * 1024;
    let app = TestApp::with_config(Arc::new(FixedRecognizer::new(&["ok"])), config, dir).await;

    let mut image = PNG_BYTES.to_vec();
    image.resize(4096, 0);
    app.server
        .post("/api/upload")
        .multipart(png_form(image))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_requests_beyond_burst_are_rate_limited() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path().join("uploads"), true);
    config.resilience.rate_limit_enabled = true;
    config.resilience.burst_size = 2.0;
    config.resilience.requests_per_second = 0.001;
    let app = TestApp::with_config(Arc::new(FixedRecognizer::new(&["ok"])), config, dir).await;

    app.server.get("/health").await.assert_status_ok();
    app.server.get("/health").await.assert_status_ok();
    app.server
        .get("/health")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_disabled_lets_everything_through() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path().join("uploads"), true);
    config.resilience.burst_size = 1.0;
    config.resilience.requests_per_second = 0.001;
    let app = TestApp::with_config(Arc::new(FixedRecognizer::new(&["ok"])), config, dir).await;

    for _ in 0..5 {
        app.server.get("/health").await.assert_status_ok();
    }
}

#[tokio::test]
async fn test_slow_request_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path().join("uploads"), true);
    config.server.request_timeout_secs = 1;
    config.recognition.timeout_secs = 10;
    let recognizer = Arc::new(StalledRecognizer(Duration::from_secs(3)));
    let app = TestApp::with_config(recognizer, config, dir).await;

    let response = app
        .server
        .post("/api/upload")
        .multipart(png_form(PNG_BYTES.to_vec()))
        .await;

    response.assert_status(StatusCode::REQUEST_TIMEOUT);
}
