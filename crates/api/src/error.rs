//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, OrderError};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::InvalidReference { .. } | DomainError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        DomainError::Order(order_err) => match order_err {
            OrderError::IllegalTransition { .. } => StatusCode::CONFLICT,
            OrderError::InvalidQuantity { .. } | OrderError::AmountOverflow => {
                StatusCode::BAD_REQUEST
            }
            OrderError::UnexpectedTargetStatus { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        },
        DomainError::Store(StoreError::ConcurrencyConflict { .. }) => StatusCode::CONFLICT,
        DomainError::Configuration(_) | DomainError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "internal server error");
    }

    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
