use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::store::ImageRecord;

/// Upper bound for a multipart upload body. The default axum limit (2 MiB)
/// is too small for camera originals.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Extensions accepted for upload, matched case-insensitively, stored lowercased.
const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif"];

/// Extract the extension of an upload filename if it is on the allow-list.
/// Returns the lowercased extension without the dot; None for no extension
/// or a disallowed one.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let ext = std::path::Path::new(filename)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// POST /upload — multipart form with a `title` text field and an `image`
/// file field. On success: writes the image under the uploads directory,
/// appends a record to the store, and redirects (302) to /picture/{id}.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut title: Option<String> = None;
    let mut image: Option<(String, axum::body::Bytes)> = None;

    // Collect both fields first; validation order below is fixed regardless
    // of the order fields arrive in the body.
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::InvalidInput)?
    {
        // Take the name up front: text()/bytes() consume the field.
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "title" => {
                title = Some(field.text().await.map_err(|_| ApiError::InvalidInput)?);
            }
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await.map_err(|_| ApiError::InvalidInput)?;
                image = Some((filename, bytes));
            }
            // Unknown fields are ignored, not rejected.
            _ => {}
        }
    }

    let title = match title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_owned(),
        _ => return Err(ApiError::InvalidInput),
    };
    let (filename, bytes) = match image {
        Some((name, bytes)) if !bytes.is_empty() => (name, bytes),
        _ => return Err(ApiError::InvalidInput),
    };
    let ext = allowed_extension(&filename).ok_or(ApiError::UnsupportedFileType)?;

    let id = Uuid::new_v4().to_string();
    let stored_name = format!("{id}.{ext}");

    tokio::fs::create_dir_all(&state.uploads_dir)
        .await
        .map_err(ApiError::storage)?;
    let disk_path = state.uploads_dir.join(&stored_name);
    tokio::fs::write(&disk_path, &bytes)
        .await
        .map_err(ApiError::storage)?;

    let record = ImageRecord {
        id: id.clone(),
        title,
        path: format!("/uploads/{stored_name}"),
    };
    // If this fails the image file stays behind with no record — orphaned,
    // not rolled back.
    state.store.append(record).await?;

    tracing::info!("uploaded {} ({} bytes)", stored_name, bytes.len());

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, format!("/picture/{id}"))],
    )
        .into_response())
}
