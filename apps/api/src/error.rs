//! # HTTP Errors
//!
//! Every failure leaves a handler as `{ "code": ..., "message": ... }`.
//!
//! ```text
//! DbError::Domain(CoreError)  → 400 / 404, code names the outcome
//! DbError::Conflict           → 409, safe to retry the whole request
//! storage faults              → 500, logged here, message kept generic
//! Actor checks                → 401 / 403
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tienda_core::CoreError;
use tienda_db::DbError;

/// Body of every non-2xx response.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "InsufficientStock:MUG-01" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    EmptyCart,
    InsufficientStock,
    InvalidTransition,
    /// The order was cancelled and restocked before this was returned.
    PaymentDeclined,
    Conflict,
    Unauthorized,
    Forbidden,
    DatabaseError,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError
            | ErrorCode::EmptyCart
            | ErrorCode::InsufficientStock
            | ErrorCode::InvalidTransition
            | ErrorCode::PaymentDeclined => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => ApiError::from(core),
            DbError::Conflict { entity, id } => {
                tracing::warn!(entity = %entity, id = %id, "Concurrent update conflict");
                ApiError::new(
                    ErrorCode::Conflict,
                    "The resource was modified concurrently, please retry",
                )
            }
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            fault => {
                tracing::error!(error = %fault, "Storage failure");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::OrderNotFound(id) => ApiError::not_found("Order", &id),
            CoreError::EmptyCart => ApiError::new(ErrorCode::EmptyCart, "EmptyCart"),
            CoreError::InsufficientStock { product_id, .. } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!("InsufficientStock:{}", product_id),
            ),
            err @ CoreError::InvalidTransition { .. } => {
                ApiError::new(ErrorCode::InvalidTransition, err.to_string())
            }
            err @ (CoreError::CartTooLarge { .. } | CoreError::QuantityTooLarge { .. }) => {
                ApiError::validation(err.to_string())
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
