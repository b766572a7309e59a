//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inventory::InventoryError;
use orders::OrderError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// No usable caller identity on the request.
    Unauthorized(String),
    /// The caller lacks the role required by the route.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Order domain error.
    Order(OrderError),
    /// Inventory domain error.
    Inventory(InventoryError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, error_body(&msg)),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, error_body(&msg)),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, error_body(&msg)),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, error_body(&msg)),
            ApiError::Order(err) => order_error_to_response(err),
            ApiError::Inventory(err) => inventory_error_to_response(err),
            ApiError::Internal(msg) => internal(&msg),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn error_body(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

/// Unexpected failures are reported generically, without internal detail.
fn internal(detail: &str) -> (StatusCode, serde_json::Value) {
    tracing::error!(error = %detail, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        error_body("An unexpected error occurred"),
    )
}

fn order_error_to_response(err: OrderError) -> (StatusCode, serde_json::Value) {
    match &err {
        OrderError::ProductUnavailable(_) | OrderError::Validation { .. } => {
            (StatusCode::BAD_REQUEST, error_body(&err.to_string()))
        }
        OrderError::InsufficientStock { available, .. } => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": err.to_string(),
                "type": "insufficient-stock",
                "available": available,
            }),
        ),
        OrderError::OrderNotFound(_) => (StatusCode::NOT_FOUND, error_body(&err.to_string())),
        OrderError::UnauthorizedAccess { .. } | OrderError::AdminRequired => {
            (StatusCode::FORBIDDEN, error_body(&err.to_string()))
        }
        OrderError::InvalidStateTransition { .. } => {
            (StatusCode::CONFLICT, error_body(&err.to_string()))
        }
        OrderError::UpstreamUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, error_body(&err.to_string()))
        }
        OrderError::Database(_) | OrderError::Migration(_) => internal(&err.to_string()),
    }
}

fn inventory_error_to_response(err: InventoryError) -> (StatusCode, serde_json::Value) {
    match &err {
        InventoryError::ProductNotFound(_) => {
            (StatusCode::NOT_FOUND, error_body(&err.to_string()))
        }
        InventoryError::InsufficientStock { available, .. } => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": err.to_string(),
                "type": "insufficient-stock",
                "available": available,
            }),
        ),
        InventoryError::Validation { .. } => {
            (StatusCode::BAD_REQUEST, error_body(&err.to_string()))
        }
        InventoryError::Database(_) | InventoryError::Migration(_) => internal(&err.to_string()),
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        ApiError::Inventory(err)
    }
}
