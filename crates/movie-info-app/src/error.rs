use axum::response::{IntoResponse, Response};
use http::StatusCode;
use tracing::error;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Record not found")]
    NotFound,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Store error: {0}")]
    Store(#[from] movie_info_dal::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::InvalidPayload(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Store(error) => {
                error!("Store error: {error}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}
