use std::borrow::Cow;

use axum::extract::{Path, State};
use axum::response::Html;

use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::store::ImageRecord;

/// GET /picture/{id} — render the page for one uploaded image.
/// Absent store, absent record, and (non-strict policy) unparsable store all
/// read as "no such picture".
pub async fn picture_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let record = state.store.find(&id).await?.ok_or(ApiError::NotFound)?;
    Ok(Html(render_picture_page(&record)))
}

/// Thin wrapper around `quick_xml::escape::escape`.
///
/// Escapes `&`, `<`, `>`, `"`, `'` so user-provided strings can be safely
/// embedded in HTML text nodes and attribute values. Every dynamic value
/// interpolated into a page MUST pass through here.
pub fn html_escape(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Build the picture page. The title and the stored path are the only two
/// dynamic values, both escaped.
pub fn render_picture_page(record: &ImageRecord) -> String {
    let title = html_escape(&record.title);
    let path = html_escape(&record.path);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <style>
        body {{
            font-family: Arial, sans-serif;
        }}
        .header {{
            display: flex;
            justify-content: space-between;
            align-items: center;
        }}
        .upload-button {{
            padding: 10px 20px;
            font-size: 1.2em;
            background-color: #007bff;
            color: white;
            border: none;
            border-radius: 5px;
            cursor: pointer;
        }}
        .upload-button:hover {{
            background-color: #0056b3;
        }}
    </style>
</head>
<body>
    <div class="header">
        <h1>{title}</h1>
        <button class="upload-button" onclick="window.location.href='/'">Upload New Picture</button>
    </div>
    <img src="{path}" alt="{title}" />
</body>
</html>"#,
        title = title,
        path = path,
    )
}
