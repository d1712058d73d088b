use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::occurrence::OccurrenceError;

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
        }
    }
}

impl From<OccurrenceError> for ApiError {
    fn from(value: OccurrenceError) -> Self {
        warn!(error = %value, "rejected service definition");
        ApiError::BadRequest(value.to_string())
    }
}
