use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::store::StoreError;

/// Request-level error taxonomy. Display strings double as response bodies
/// for the client-error variants.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing/blank title, or missing/empty image payload.
    #[error("Invalid input.")]
    InvalidInput,
    /// Upload filename extension outside the allow-list.
    #[error("Only JPEG, PNG, or GIF files are allowed.")]
    UnsupportedFileType,
    /// Store file absent, record absent, or (non-strict policy) store unparsable.
    #[error("not found")]
    NotFound,
    /// Filesystem or store failure while persisting or reading.
    #[error("storage failure: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        ApiError::Storage(Box::new(err))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::storage(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidInput | ApiError::UnsupportedFileType => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::Storage(err) => {
                tracing::error!("storage failure: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
