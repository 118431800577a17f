//! End-to-end HTTP tests.
//!
//! Drives the full router (logging middleware and body limit included)
//! against a temporary data directory.

use std::path::Path;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tinypaste_api::{ApiState, build_router};
use tinypaste_core::PasteConfig;
use tinypaste_store::PasteStore;
use tower::ServiceExt;

fn test_router(dir: &Path, tweak: impl FnOnce(&mut PasteConfig)) -> Router {
    let mut config = PasteConfig {
        data_dir: dir.to_path_buf(),
        ..Default::default()
    };
    tweak(&mut config);
    config.validate().unwrap();
    std::fs::write(dir.join("index.html"), "<html><body>paste here</body></html>").unwrap();
    std::fs::write(dir.join("style.css"), "body { margin: 0 }").unwrap();
    let store = PasteStore::open(&config).unwrap();
    build_router(ApiState::new(store, config))
}

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::HOST, "localhost:8000")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn post_then_get_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path(), |_| {});

    let resp = router
        .clone()
        .oneshot(post_form("text=hello+world"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let location = resp.headers()[header::LOCATION].to_str().unwrap().to_string();
    let id = location.strip_prefix('/').unwrap().to_string();
    assert_eq!(id.len(), 5);
    assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(body_string(resp).await, format!("localhost:8000/{id}\n"));

    let resp = router.oneshot(get(&location)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_string(resp).await, "hello world");
}

#[tokio::test]
async fn landing_page_and_stylesheet() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path(), |_| {});

    let resp = router.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/html");
    assert!(body_string(resp).await.contains("paste here"));

    let resp = router.clone().oneshot(get("/index.html")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/html");

    let resp = router.oneshot(get("/style.css")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/css");
    assert_eq!(body_string(resp).await, "body { margin: 0 }");
}

#[tokio::test]
async fn unknown_paste_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path(), |_| {});

    let resp = router.clone().oneshot(get("/abcde")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(resp).await, "Not Found");

    // Encoded separators must not escape the data directory.
    let resp = router.oneshot(get("/..%2Fsecret")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_submission_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path(), |_| {});

    let resp = router.clone().oneshot(post_form("text=")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = router.oneshot(post_form("other=value")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let pastes = std::fs::read_dir(dir.path())
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .ends_with(".paste")
        })
        .count();
    assert_eq!(pastes, 0);
}

#[tokio::test]
async fn bare_post_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path(), |_| {});

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(resp).await, "Bad Request");
}

#[tokio::test]
async fn multipart_submission_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path(), |_| {});

    let body = "--boundary\r\n\
                Content-Disposition: form-data; name=\"text\"\r\n\r\n\
                hello world\r\n\
                --boundary--\r\n";
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::HOST, "localhost:8000")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=boundary")
        .body(Body::from(body))
        .unwrap();
    let resp = router.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers()[header::LOCATION].to_str().unwrap().to_string();

    let resp = router.oneshot(get(&location)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "hello world");
}

#[tokio::test]
async fn unreadable_paste_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path(), |_| {});
    std::fs::create_dir(dir.path().join("abcde.paste")).unwrap();

    let resp = router.oneshot(get("/abcde")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(resp).await, "Internal Server Error");
}

#[tokio::test]
async fn custom_form_field_and_id_length() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path(), |config| {
        config.form_field = "content".to_string();
        config.id_length = 12;
    });

    let resp = router
        .clone()
        .oneshot(post_form("content=custom%20field"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert_eq!(location.len(), 13);

    let resp = router.oneshot(get(&location)).await.unwrap();
    assert_eq!(body_string(resp).await, "custom field");
}

#[tokio::test]
async fn oversized_submission_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path(), |config| config.max_paste_bytes = 64);

    let body = format!("text={}", "a".repeat(1024));
    let resp = router.oneshot(post_form(&body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn concurrent_posts_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path(), |_| {});

    let mut tasks = Vec::new();
    for i in 0..100 {
        let router = router.clone();
        tasks.push(tokio::spawn(async move {
            let resp = router
                .oneshot(post_form(&format!("text=paste+{i}")))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::SEE_OTHER);
            resp.headers()[header::LOCATION].to_str().unwrap().to_string()
        }));
    }

    let mut locations = std::collections::HashSet::new();
    for task in tasks {
        locations.insert(task.await.unwrap());
    }
    assert_eq!(locations.len(), 100);
}
