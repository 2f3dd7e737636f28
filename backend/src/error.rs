use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use draw_core::{DrawError, RingViolation};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Http { status: StatusCode, message: String },
    #[error(transparent)]
    Draw(#[from] DrawError),
    #[error("draw produced an invalid ring: {0}")]
    Ring(#[from] RingViolation),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Http { status, .. } => *status,
            ApiError::Draw(_) => StatusCode::BAD_REQUEST,
            ApiError::Ring(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Ring(violation) = &self {
            error!(%violation, "refusing to send an invalid draw");
        }
        let status = self.status();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
