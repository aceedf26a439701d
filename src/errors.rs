use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::{DbErr, SqlErr};
use serde::Serialize;
use utoipa::ToSchema;

/// Error body returned to HTTP clients
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

/// Domain error for the payment orchestration service.
///
/// The HTTP status mapping lives in `IntoResponse` so handlers stay thin and
/// every error leaves the service through a single translation point.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Driver/connection level failure. Retry-safe, surfaces as 500.
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    /// A unique or referential constraint fired outside a known idempotency
    /// path. Non-retryable as submitted.
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The cart is not in a state that can be priced (e.g. no shipping info).
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Unsupported payment provider: {0}")]
    UnsupportedProvider(String),

    /// Gateway returned non-2xx or the call failed at the transport level.
    #[error("Gateway failure: {0}")]
    GatewayFailure(String),

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// Webhook event id already recorded; the delivery is a replay.
    #[error("Duplicate event: {0}")]
    DuplicateEvent(String),

    /// Webhook references an intent this service does not know about.
    #[error("Orphan event: {0}")]
    OrphanEvent(String),

    /// Ledger transaction for this idempotency key already exists; a
    /// concurrent processor won the race.
    #[error("Ledger posting already recorded: {0}")]
    DuplicateLedgerPosting(String),

    /// Double-entry invariant broken. Never recovered from; the surrounding
    /// transaction is rolled back and the condition logged as a bug.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    /// Classify a database error: constraint failures become
    /// `IntegrityViolation`, everything else stays a transient
    /// `DatabaseError`.
    pub fn db(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                ServiceError::IntegrityViolation(format!("unique constraint: {}", msg))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                ServiceError::IntegrityViolation(format!("foreign key constraint: {}", msg))
            }
            _ => ServiceError::DatabaseError(err),
        }
    }

    /// True when the underlying cause was a unique-constraint collision.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, ServiceError::IntegrityViolation(msg) if msg.starts_with("unique constraint"))
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ServiceError::DatabaseError(e) => {
                tracing::error!(error = %e, "database error reached the HTTP boundary");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            ServiceError::IntegrityViolation(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServiceError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::PreconditionFailed(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::UnsupportedProvider(msg) => (
                StatusCode::BAD_REQUEST,
                format!("unsupported payment provider: {}", msg),
            ),
            ServiceError::GatewayFailure(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ServiceError::InvalidSignature(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // Replays and orphans are acknowledged so the gateway stops
            // retrying; they only reach here if a handler forwards them raw.
            ServiceError::DuplicateEvent(_)
            | ServiceError::OrphanEvent(_)
            | ServiceError::DuplicateLedgerPosting(_) => (StatusCode::OK, "ok".to_string()),
            ServiceError::InvariantViolation(msg) => {
                tracing::error!(error = %msg, "ledger invariant violation");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            ServiceError::SerializationError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            ServiceError::EventError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ServiceError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ServiceError::Other(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = Json(ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Unknown Error")
                .to_string(),
            message: error_message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });

        (status, body).into_response()
    }
}

/// Alias kept for call sites that predate the rename.
pub type AppError = ServiceError;
