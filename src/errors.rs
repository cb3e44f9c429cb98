use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::{DbErr, SqlErr};
use serde::Serialize;
use serde_json::json;

/// One violated rule on one submitted field. Checkout validation reports
/// every violation, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Failure taxonomy of the order-creation pipeline.
///
/// Everything before the transactional write aborts the whole operation and
/// is returned to the caller; anything after a successful commit is a side
/// effect and never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// One or more submitted fields are invalid; the caller can correct the
    /// input and resubmit. Never causes any write.
    #[error("checkout input failed validation")]
    Validation(Vec<Violation>),

    /// Referenced address or shift does not exist for this request. An
    /// address owned by another customer answers this too, so the response
    /// leaks nothing about other customers' address books.
    #[error("{0}")]
    NotFound(String),

    /// Transaction rollback, order-number exhaustion, or timeout. Safe to
    /// retry from the client because no partial state was committed.
    #[error("your order could not be placed, please try again")]
    Transient { reason: String },
}

impl From<DbErr> for CheckoutError {
    fn from(err: DbErr) -> Self {
        Self::Transient {
            reason: err.to_string(),
        }
    }
}

/// True when the database rejected a write for violating a unique
/// constraint, e.g. two orders racing to the same order number.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let (status, error, body) = match &self {
            CheckoutError::Validation(violations) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation Failed",
                json!({
                    "error": "Validation Failed",
                    "message": self.to_string(),
                    "violations": violations,
                }),
            ),
            CheckoutError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                "Not Found",
                json!({
                    "error": "Not Found",
                    "message": message,
                }),
            ),
            CheckoutError::Transient { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Temporarily Unavailable",
                json!({
                    "error": "Temporarily Unavailable",
                    "message": self.to_string(),
                    "retryable": true,
                }),
            ),
        };
        tracing::debug!(status = %status, error, "checkout request failed");
        (status, Json(body)).into_response()
    }
}
