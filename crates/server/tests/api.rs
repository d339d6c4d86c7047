//! HTTP round trips through the router with a stub OCR engine.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use ocrgate::{Recognition, RecognizerError, StubEngine};
use serde_json::Value;
use server::{build_router, ServerConfig, ServerState};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "X-OCRGATE-BOUNDARY";

struct Part<'a> {
    name: &'a str,
    filename: &'a str,
    content_type: &'a str,
    bytes: Vec<u8>,
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.name, part.filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(&part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn encode(image: image::DynamicImage, format: image::ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).expect("encode test image");
    buf.into_inner()
}

fn png(seed: u8) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 16, image::Rgb([seed, 128, 255 - seed]));
    encode(image::DynamicImage::ImageRgb8(img), image::ImageFormat::Png)
}

fn jpeg() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 16, image::Rgb([10, 20, 30]));
    encode(image::DynamicImage::ImageRgb8(img), image::ImageFormat::Jpeg)
}

fn image_part(name: &'static str, filename: &'static str, bytes: Vec<u8>) -> Part<'static> {
    let content_type = if filename.ends_with(".png") {
        "image/png"
    } else if filename.ends_with(".jpg") {
        "image/jpeg"
    } else {
        "text/plain"
    };
    Part {
        name,
        filename,
        content_type,
        bytes,
    }
}

fn app_with(engine: StubEngine, config: ServerConfig) -> Router {
    build_router(Arc::new(ServerState::with_engine(config, Arc::new(engine))))
}

fn app(engine: StubEngine) -> Router {
    app_with(engine, ServerConfig::offline())
}

fn post(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let body = multipart_body(parts);
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("content-length", body.len())
        .header("x-forwarded-for", "198.51.100.4")
        .body(Body::from(body))
        .expect("build request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1_000_000)
        .await
        .expect("read body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_check() {
    let app = app(StubEngine::default());
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({ "status": "healthy", "service": "OCR API" })
    );
}

#[tokio::test]
async fn unknown_route_uses_envelope() {
    let app = app(StubEngine::default());
    let request = Request::builder()
        .uri("/nope")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["status_code"], 404);
}

#[tokio::test]
async fn metrics_disabled_is_404() {
    let app = app(StubEngine::default());
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn extract_normalizes_text() {
    let app = app(StubEngine::new("Hello\n\n\n\nWorld", 0.987654));
    let (status, body) = send(
        &app,
        post("/extract-text", &[image_part("image", "scan.png", png(1))]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["text"], "Hello\n\nWorld");
    assert_eq!(body["confidence"], 0.9877);
    assert!(body["processing_time_ms"].is_u64());
    assert!(body.get("cached").is_none());
    assert!(body.get("message").is_none());
    assert!(body.get("metadata").is_none());
}

#[tokio::test]
async fn second_identical_upload_is_cached() {
    let engine = StubEngine::new("Invoice 42", 0.9);
    let app = app(engine.clone());

    let (_, first) = send(
        &app,
        post("/extract-text", &[image_part("image", "a.png", png(2))]),
    )
    .await;
    // Different filename, same bytes.
    let (status, second) = send(
        &app,
        post("/extract-text", &[image_part("image", "b.png", png(2))]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["cached"], true);
    assert_eq!(second["text"], first["text"]);
    assert_eq!(second["confidence"], first["confidence"]);
    assert_eq!(engine.calls(), 1);
}

#[tokio::test]
async fn empty_text_has_message() {
    let app = app(StubEngine::default());
    let (status, body) = send(
        &app,
        post("/extract-text", &[image_part("image", "blank.png", png(3))]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "");
    assert_eq!(body["message"], "No text found in image");
}

#[tokio::test]
async fn include_metadata() {
    let app = app(StubEngine::new("x", 0.5));
    let (status, body) = send(
        &app,
        post(
            "/extract-text?include_metadata=true",
            &[image_part("image", "m.png", png(4))],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["format"], "PNG");
    assert_eq!(body["metadata"]["width"], 16);
    assert_eq!(body["metadata"]["height"], 16);
}

#[tokio::test]
async fn validation_status_codes() {
    let engine = StubEngine::new("never", 1.0);
    let app = app(engine.clone());

    let cases: Vec<(Part<'static>, StatusCode, &str)> = vec![
        (
            image_part("image", "empty.png", Vec::new()),
            StatusCode::BAD_REQUEST,
            "Empty file uploaded.",
        ),
        (
            image_part("image", "notes.txt", png(5)),
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Unsupported file type. Supported formats: JPG, PNG, GIF",
        ),
        (
            image_part("image", "fake.png", b"%PDF-1.7 definitely not".to_vec()),
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Invalid image file. File content does not match image format.",
        ),
        (
            image_part("image", "cut.png", png(6)[..40].to_vec()),
            StatusCode::BAD_REQUEST,
            "Corrupted or invalid image file.",
        ),
        (
            image_part("image", "huge.png", vec![0u8; 10 * 1024 * 1024 + 1]),
            StatusCode::PAYLOAD_TOO_LARGE,
            "File too large. Maximum size is 10MB.",
        ),
    ];

    for (part, expected_status, expected_error) in cases {
        let (status, body) = send(&app, post("/extract-text", &[part])).await;
        assert_eq!(status, expected_status, "{expected_error}");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], expected_error);
        assert_eq!(body["status_code"], expected_status.as_u16());
    }
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn missing_image_field() {
    let app = app(StubEngine::default());
    let (status, body) = send(
        &app,
        post("/extract-text", &[image_part("file", "a.png", png(7))]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing multipart field 'image'.");
}

#[tokio::test]
async fn engine_failure_is_500() {
    let app = app(StubEngine::failing("quota exhausted"));
    let (status, body) = send(
        &app,
        post("/extract-text", &[image_part("image", "a.png", png(8))]),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "OCR processing failed: Vision API error: quota exhausted"
    );
}

#[tokio::test]
async fn batch_mixed_results() {
    let engine = StubEngine::new("Total 12.50", 0.8);
    let app = app(engine.clone());
    let (status, body) = send(
        &app,
        post(
            "/extract-text/batch",
            &[
                image_part("images", "one.png", png(9)),
                image_part("images", "two.png", Vec::new()),
                image_part("images", "three.jpg", jpeg()),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 3);
    assert_eq!(body["processed"], 2);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    for (i, item) in results.iter().enumerate() {
        assert_eq!(item["index"], i);
    }
    assert_eq!(results[0]["filename"], "one.png");
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[0]["text"], "Total 12.50");
    assert_eq!(results[1]["success"], false);
    assert_eq!(results[1]["error"], "Empty file uploaded.");
    assert_eq!(results[2]["success"], true);
    assert_eq!(engine.calls(), 2);
}

#[tokio::test]
async fn batch_item_engine_failure_does_not_fail_batch() {
    let engine = StubEngine::with_handler(|bytes| {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Err(RecognizerError::Service("jpeg unsupported".into()))
        } else {
            Ok(Recognition {
                text: "ok".into(),
                confidence: 0.5,
            })
        }
    });
    let app = app(engine);
    let (status, body) = send(
        &app,
        post(
            "/extract-text/batch",
            &[
                image_part("images", "a.jpg", jpeg()),
                image_part("images", "b.png", png(10)),
            ],
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed"], 1);
    assert_eq!(
        body["results"][0]["error"],
        "OCR processing failed: Vision API error: jpeg unsupported"
    );
    assert_eq!(body["results"][1]["text"], "ok");
}

#[tokio::test]
async fn oversized_batch_rejected() {
    let engine = StubEngine::new("x", 1.0);
    let app = app(engine.clone());
    let parts: Vec<Part<'static>> = (0..11)
        .map(|i| image_part("images", "p.png", png(i as u8)))
        .collect();
    let (status, body) = send(&app, post("/extract-text/batch", &parts)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Maximum 10 images per batch request.");
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn rate_limit_per_route() {
    let config = ServerConfig {
        single_rate_limit_per_minute: 2,
        batch_rate_limit_per_minute: 1,
        ..ServerConfig::offline()
    };
    let app = app_with(StubEngine::new("x", 1.0), config);

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            post("/extract-text", &[image_part("image", "a.png", png(11))]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(
        &app,
        post("/extract-text", &[image_part("image", "a.png", png(11))]),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body,
        serde_json::json!({ "success": false, "error": "Rate limit exceeded.", "status_code": 429 })
    );

    // The batch route keeps its own budget.
    let (status, _) = send(
        &app,
        post(
            "/extract-text/batch",
            &[image_part("images", "a.png", png(11))],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = app(StubEngine::default());
    let request = Request::builder()
        .uri("/")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");
}
