use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use silo_kernel::domain::config::ApiConfig;
use silo_kernel::server::{ApiState, router};
use silo_kernel::storage::Storage;
use tempfile::TempDir;
use tower::ServiceExt;

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
const BOUNDARY: &str = "silo-test-boundary";

struct Part<'a> {
    name: &'a str,
    file_name: Option<&'a str>,
    data: &'a [u8],
}

const fn text<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    Part { name, file_name: None, data: value.as_bytes() }
}

const fn file<'a>(file_name: &'a str, data: &'a [u8]) -> Part<'a> {
    Part { name: "file", file_name: Some(file_name), data }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                    .as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn app_with(config: ApiConfig) -> (TempDir, Storage, Router) {
    let tmp = tempfile::tempdir().unwrap();
    let storage = Storage::builder().root(tmp.path().join("data")).connect().await.unwrap();
    let state = ApiState::builder().config(config).storage(storage.clone()).build().unwrap();
    (tmp, storage, router::api_router(state))
}

async fn app() -> (TempDir, Storage, Router) {
    app_with(ApiConfig::default()).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn upload(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn put(uri: &str, data: &'static str) -> Request<Body> {
    Request::builder().method(Method::PUT).uri(uri).body(Body::from(data)).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_up() {
    let (_tmp, _storage, app) = app().await;

    let (status, body) = send_json(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_upload_then_duplicate_upload() {
    let (_tmp, storage, app) = app().await;
    let parts = [text("key", "a/b/file.txt"), file("ignored.bin", b"hello")];

    let (status, first) = send_json(&app, upload("/docs", &parts)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["bucket"], "docs");
    assert_eq!(first["key"], format!("a/b/{HELLO_SHA256}.txt"));
    assert_eq!(first["url"], format!("/docs/a/b/{HELLO_SHA256}.txt"));
    assert_eq!(first["size"], 5);
    assert_eq!(first["hash"], HELLO_SHA256);
    assert_eq!(first["deduplicated"], false);

    let (status, second) = send_json(&app, upload("/docs", &parts)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["key"], first["key"]);
    assert_eq!(second["deduplicated"], true);

    let stored = storage.root().join("docs/a/b").join(format!("{HELLO_SHA256}.txt"));
    assert_eq!(std::fs::read(stored).unwrap(), b"hello");
}

#[tokio::test]
async fn test_uploaded_object_is_served_back() {
    let (_tmp, _storage, app) = app().await;

    let (_, receipt) =
        send_json(&app, upload("/media", &[text("key", "img/cat.png"), file("x", b"meow")])).await;
    let url = receipt["url"].as_str().unwrap().to_owned();

    let (status, body) = send(&app, get(&url)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"meow");
}

#[tokio::test]
async fn test_extension_comes_from_filename_without_key() {
    let (_tmp, _storage, app) = app().await;

    let (status, receipt) = send_json(&app, upload("/docs", &[file("notes.md", b"hello")])).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["key"], format!("{HELLO_SHA256}.md"));
}

#[tokio::test]
async fn test_key_after_file_still_places_object() {
    let (_tmp, storage, app) = app().await;

    let (status, receipt) =
        send_json(&app, upload("/docs", &[file("f.txt", b"hello"), text("key", "late/x.txt")]))
            .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["key"], format!("late/{HELLO_SHA256}.txt"));

    let bucket_root = storage.root().join("docs");
    let leftovers: Vec<_> = std::fs::read_dir(&bucket_root)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".silo-stage-"))
        .collect();
    assert!(leftovers.is_empty(), "stage files left: {leftovers:?}");
}

#[tokio::test]
async fn test_traversal_key_is_rejected() {
    let (tmp, _storage, app) = app().await;

    let (status, body) = send_json(
        &app,
        upload("/docs", &[text("key", "../../escape.txt"), file("f.txt", b"pwned")]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
    assert!(!tmp.path().join("escape.txt").exists());
}

#[tokio::test]
async fn test_missing_file_field_is_rejected() {
    let (_tmp, _storage, app) = app().await;

    let (status, body) = send_json(&app, upload("/docs", &[text("key", "a.txt")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn test_invalid_bucket_is_rejected() {
    let (_tmp, _storage, app) = app().await;

    let (status, _) = send_json(&app, upload("/bad%20bucket", &[file("f", b"hello")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_put_overwrites_in_place() {
    let (_tmp, _storage, app) = app().await;

    let (status, first) = send_json(&app, put("/docs/notes/today.txt", "one")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["key"], "notes/today.txt");
    assert_eq!(first["url"], "/docs/notes/today.txt");
    assert!(first.get("hash").is_none());
    assert!(first.get("deduplicated").is_none());

    let (status, second) = send_json(&app, put("/docs/notes/today.txt", "two!")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["size"], 4);

    let (status, body) = send(&app, get("/docs/notes/today.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"two!");
}

#[tokio::test]
async fn test_put_traversal_is_rejected() {
    let (tmp, _storage, app) = app().await;

    let (status, _) = send_json(&app, put("/docs/..%2F..%2Fescape.txt", "x")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!tmp.path().join("escape.txt").exists());
}

#[tokio::test]
async fn test_missing_object_is_not_found() {
    let (_tmp, _storage, app) = app().await;

    let (status, _) = send(&app, get("/docs/nothing/here.txt")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_body_limit_is_enforced() {
    let mut config = ApiConfig::default();
    config.server.body_limit = Some(4);
    let (_tmp, storage, app) = app_with(config).await;

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/docs/big.bin")
        .header(header::CONTENT_LENGTH, "10")
        .body(Body::from("0123456789"))
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!storage.root().join("docs/big.bin").exists());
}
