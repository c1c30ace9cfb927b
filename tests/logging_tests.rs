//! Structured log output tests.
//!
//! Installs the JSON subscriber once for this test binary with an in-memory
//! writer, then checks that every event emitted while serving a request is
//! tagged with the correlation id returned to the client.
//!
//! Run with: `cargo test --test logging_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::Value;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

use image_analysis_api::middleware::CORRELATION_ID_HEADER;
use image_analysis_api::{AppState, Config, LogFormat, build_router, logging};

const API_KEY: &str = "logging-test-key";

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn lines(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn message(line: &Value) -> &str {
    line["message"].as_str().unwrap_or_default()
}

fn carries_correlation_id(line: &Value, id: &str) -> bool {
    line["spans"]
        .as_array()
        .is_some_and(|spans| spans.iter().any(|s| s["correlation_id"] == id))
}

#[tokio::test]
async fn test_request_events_carry_correlation_id() {
    let logs = CapturedLogs::default();
    logging::init_logging_with_writer("info", LogFormat::Json, logs.clone());

    let upload_dir = tempfile::tempdir().unwrap();
    let config = Config {
        api_key: API_KEY.to_string(),
        upload_dir: upload_dir.path().to_path_buf(),
        metrics_port: 0,
        ..Config::default()
    };
    let router = build_router(AppState::new(config));

    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(2, 2))
        .write_to(&mut png, ImageFormat::Png)
        .unwrap();
    let png = png.into_inner();

    let boundary = "log-test-boundary";
    let mut body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"face.png\"\r\n\
         Content-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(&png);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/upload")
                .header("x-api-key", API_KEY)
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let upload_id = response.headers()[CORRELATION_ID_HEADER]
        .to_str()
        .unwrap()
        .to_string();
    let image_id = {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        json["image_id"].as_str().unwrap().to_string()
    };

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/analyze")
                .header("x-api-key", "wrong")
                .header("content-type", "application/json")
                .body(Body::from(format!(r#"{{"image_id":"{image_id}"}}"#)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let rejected_id = response.headers()[CORRELATION_ID_HEADER]
        .to_str()
        .unwrap()
        .to_string();

    let lines = logs.lines();

    let upload_events: Vec<&Value> = lines
        .iter()
        .filter(|l| carries_correlation_id(l, &upload_id))
        .collect();
    for expected in [
        "Request started",
        "Upload received",
        "Image stored",
        "Image uploaded successfully",
        "Request completed",
    ] {
        assert!(
            upload_events.iter().any(|l| message(l).starts_with(expected)),
            "missing `{expected}` event for upload request"
        );
    }

    let started = upload_events
        .iter()
        .find(|l| message(l).starts_with("Request started"))
        .unwrap();
    assert_eq!(started["level"], "INFO");
    assert_eq!(started["method"], "POST");
    assert_eq!(started["path"], "/api/v1/upload");
    assert!(started["target"].is_string());
    assert!(started["filename"].is_string());
    assert!(started["line_number"].is_number());

    let completed = upload_events
        .iter()
        .find(|l| message(l).starts_with("Request completed"))
        .unwrap();
    assert_eq!(completed["status_code"], 201);

    let rejected: Vec<&Value> = lines
        .iter()
        .filter(|l| carries_correlation_id(l, &rejected_id))
        .collect();
    assert!(
        rejected
            .iter()
            .any(|l| message(l) == "Invalid API key attempt" && l["level"] == "WARN")
    );

    assert!(
        lines
            .iter()
            .all(|l| !l.to_string().contains("logging-test-key")),
        "the API key must never be logged"
    );
}
