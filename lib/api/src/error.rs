use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use crate::response::ApiResponse;

/// Failures surfaced by the REST layer, each mapped to one HTTP status.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] skulens_core::Error),

    /// The embedding service was unreachable or answered with an error.
    #[error("Embedding service error: {0}")]
    Upstream(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("File too large. Max: {max} bytes")]
    PayloadTooLarge { max: usize },

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        use skulens_core::Error as Core;
        match self {
            ApiError::Engine(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            ApiError::Engine(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Engine(Core::StorageUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) | ApiError::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        }
        HttpResponse::build(status).json(ApiResponse::<()>::failure(self.to_string()))
    }
}
