//! Error handling for the booking engine.
//!
//! Contention outcomes (`SlotHeld`, `SlotBooked`, `HoldExpired`,
//! `AlreadyDecided`) are distinct variants so callers can choose between
//! retrying, picking other dates, or restarting the flow. Store-level
//! errors propagate unchanged; the engine never masks them as
//! "unavailable".

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An active hold overlaps the requested window. Another customer is
    /// likely mid-checkout; retry after a short delay.
    #[error("Slot is held by another checkout in progress")]
    SlotHeld,

    /// A confirmed booking overlaps the requested window. Terminal for
    /// this window; the caller should offer other dates.
    #[error("Slot is already booked")]
    SlotBooked,

    /// The hold's TTL elapsed before promotion. The caller must restart
    /// from the availability check.
    #[error("Hold has expired")]
    HoldExpired,

    /// Another staff member already moved the request to a terminal state.
    #[error("Request was already decided")]
    AlreadyDecided,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error body returned to API callers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

impl AppError {
    /// Stable identifier used by callers to branch on the outcome
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::SlotHeld => "slot_held",
            AppError::SlotBooked => "slot_booked",
            AppError::HoldExpired => "hold_expired",
            AppError::AlreadyDecided => "already_decided",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SlotHeld | AppError::SlotBooked | AppError::AlreadyDecided => {
                StatusCode::CONFLICT
            }
            AppError::HoldExpired => StatusCode::GONE,
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            // Don't leak store internals to API callers
            AppError::Database(_) => "Database error".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error_type: self.error_type().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
