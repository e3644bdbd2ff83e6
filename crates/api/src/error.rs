//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::ReservationError;
use engine::EngineError;

/// API-level error type that maps to HTTP responses.
///
/// The mutation handlers report business failures as structured
/// `success=false` bodies and never construct this type for them; this
/// mapping covers the read endpoints and transport-level failures.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Operation conflicts with the resource's current state.
    Conflict(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Business(business) => match business {
                ReservationError::ProductNotFound(_)
                | ReservationError::ReservationNotFound(_) => {
                    ApiError::NotFound(business.to_string())
                }
                ReservationError::InvalidQuantity { .. } => {
                    ApiError::BadRequest(business.to_string())
                }
                ReservationError::InsufficientStock { .. }
                | ReservationError::InvalidStateTransition { .. }
                | ReservationError::AlreadyConfirmed => ApiError::Conflict(business.to_string()),
            },
            EngineError::Store(store) => ApiError::Internal(store.to_string()),
        }
    }
}
