use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use picup::http::{build_router, state::AppState};

const BOUNDARY: &str = "picup-test-boundary";

fn make_app(root: &std::path::Path) -> axum::Router {
    build_router(AppState::from_root(root, false))
}

/// Build a multipart/form-data body with optional title and image parts.
fn multipart_body(title: Option<&str>, image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(title) = title {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{title}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Upload and return the redirect target path ("/picture/{id}").
async fn do_upload(root: &std::path::Path, title: &str, filename: &str, bytes: &[u8]) -> String {
    let response = make_app(root)
        .oneshot(upload_request(multipart_body(Some(title), Some((filename, bytes)))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    response
        .headers()
        .get("location")
        .expect("redirect must carry a Location header")
        .to_str()
        .unwrap()
        .to_owned()
}

// ── successful uploads ────────────────────────────────────────────────────────

#[tokio::test]
async fn valid_upload_redirects_to_picture_page() {
    let dir = tempfile::tempdir().unwrap();
    let location = do_upload(dir.path(), "Sunset", "photo.png", b"fake png bytes").await;
    let id = location
        .strip_prefix("/picture/")
        .expect("redirect should target /picture/{id}");
    Uuid::parse_str(id).expect("id should be a freshly generated UUID");
}

#[tokio::test]
async fn uploaded_file_lands_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let location = do_upload(dir.path(), "Sunset", "photo.png", b"fake png bytes").await;
    let id = location.strip_prefix("/picture/").unwrap();
    let stored = dir.path().join("site").join("uploads").join(format!("{id}.png"));
    assert_eq!(std::fs::read(stored).unwrap(), b"fake png bytes");
}

#[tokio::test]
async fn upload_appends_record_to_store() {
    let dir = tempfile::tempdir().unwrap();
    let location = do_upload(dir.path(), "Sunset", "photo.png", b"fake png bytes").await;
    let id = location.strip_prefix("/picture/").unwrap();

    let store = picup::store::ImageStore::new(dir.path().join("images.json"), false);
    let records = store.load().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].title, "Sunset");
    assert_eq!(records[0].path, format!("/uploads/{id}.png"));
}

#[tokio::test]
async fn mixed_case_extension_is_normalized_to_lowercase() {
    let dir = tempfile::tempdir().unwrap();
    let location = do_upload(dir.path(), "Sunset", "photo.PNG", b"fake png bytes").await;
    let id = location.strip_prefix("/picture/").unwrap();
    let stored = dir.path().join("site").join("uploads").join(format!("{id}.png"));
    assert!(stored.exists(), "expected lowercase .png file at {}", stored.display());
}

#[tokio::test]
async fn sequential_uploads_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let first = do_upload(dir.path(), "One", "a.jpg", b"aaaa").await;
    let second = do_upload(dir.path(), "Two", "b.gif", b"bbbb").await;
    assert_ne!(first, second);

    let store = picup::store::ImageStore::new(dir.path().join("images.json"), false);
    assert_eq!(store.load().await.unwrap().len(), 2);
}

#[tokio::test]
async fn title_surrounding_whitespace_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    // Non-blank after trimming — valid.
    let location = do_upload(dir.path(), "  Sunset  ", "photo.png", b"x").await;
    assert!(location.starts_with("/picture/"));
}

#[tokio::test]
async fn upload_then_view_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let location = do_upload(dir.path(), "Sunset", "photo.PNG", b"fake png bytes").await;
    let response = make_app(dir.path())
        .oneshot(Request::builder().uri(location.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains("<title>Sunset</title>"), "Expected title in page:\n{text}");
    assert!(text.contains(".png"), "Expected normalized extension in page:\n{text}");
}

// ── rejected uploads ──────────────────────────────────────────────────────────

/// Assert nothing was persisted: no store file, no uploaded binaries.
fn assert_nothing_written(root: &std::path::Path) {
    assert!(!root.join("images.json").exists(), "store file should not exist");
    let uploads = root.join("site").join("uploads");
    if uploads.exists() {
        assert_eq!(std::fs::read_dir(uploads).unwrap().count(), 0);
    }
}

#[tokio::test]
async fn blank_title_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let response = make_app(dir.path())
        .oneshot(upload_request(multipart_body(Some("   "), Some(("a.png", "x".as_bytes())))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Invalid input.");
    assert_nothing_written(dir.path());
}

#[tokio::test]
async fn missing_title_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let response = make_app(dir.path())
        .oneshot(upload_request(multipart_body(None, Some(("a.png", "x".as_bytes())))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Invalid input.");
    assert_nothing_written(dir.path());
}

#[tokio::test]
async fn missing_image_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let response = make_app(dir.path())
        .oneshot(upload_request(multipart_body(Some("Sunset"), None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Invalid input.");
    assert_nothing_written(dir.path());
}

#[tokio::test]
async fn empty_image_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let response = make_app(dir.path())
        .oneshot(upload_request(multipart_body(Some("Sunset"), Some(("a.png", "".as_bytes())))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Invalid input.");
    assert_nothing_written(dir.path());
}

#[tokio::test]
async fn disallowed_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let response = make_app(dir.path())
        .oneshot(upload_request(multipart_body(Some("Report"), Some(("doc.pdf", "%PDF".as_bytes())))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Only JPEG, PNG, or GIF files are allowed.");
    assert_nothing_written(dir.path());
}

#[tokio::test]
async fn filename_without_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let response = make_app(dir.path())
        .oneshot(upload_request(multipart_body(Some("Sunset"), Some(("noext", "x".as_bytes())))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_nothing_written(dir.path());
}

#[tokio::test]
async fn non_multipart_body_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let response = make_app(dir.path())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("title=Sunset"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_nothing_written(dir.path());
}
