//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in TripDesk                               │
//! │                                                                         │
//! │  Web UI                      Rust Backend                               │
//! │  ──────                      ────────────                               │
//! │                                                                         │
//! │  POST /api/v1/bookings                                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler                                                         │  │
//! │  │  Result<Json<T>, ApiError>                                       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::QueryFailed("...") ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Booking rule? ─── CoreError::FirstPaymentMismatch ── ApiError ─►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  HTTP 400 { "code": "VALIDATION_ERROR",                                 │
//! │             "message": "First payment must be 5100.00, got 5000.00" }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Codes
//! | Code               | HTTP | Raised for                                   |
//! |--------------------|------|----------------------------------------------|
//! | `NOT_FOUND`        | 404  | unknown IDs                                  |
//! | `VALIDATION_ERROR` | 400  | bad JSON, ratio mismatch, overpayment        |
//! | `CONFLICT`         | 409  | duplicates, full trips, paid-out commissions |
//! | `BUSINESS_RULE`    | 422  | forbidden status moves, inactive trips       |
//! | `DATABASE_ERROR`   | 500  | storage failures (details only in the log)   |
//! | `INTERNAL`         | 500  | anything else                                |

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tripdesk_core::CoreError;
use tripdesk_db::DbError;

/// API error returned from HTTP handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Booking not found: 6f1c..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// State conflict (409)
    Conflict,

    /// Business rule rejected the operation (422)
    BusinessRule,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::BusinessRule => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::BusinessRule, "Invalid or still-referenced record")
            }
            DbError::Core(e) => e.into(),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Malformed bodies, wrong field types and missing `content-type`.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

/// Converts booking rule violations to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::Validation(_)
            | CoreError::DiscountExceedsSubtotal { .. }
            | CoreError::FirstPaymentMismatch { .. }
            | CoreError::Overpayment { .. }
            | CoreError::InstallmentOutOfOrder { .. }
            | CoreError::SelfCompanion(_)
            | CoreError::CompanionNotOnTrip(_)
            | CoreError::NotASalesUser(_) => ErrorCode::ValidationError,

            CoreError::InstallmentAlreadyRecorded(_)
            | CoreError::NoInstallmentsLeft(_)
            | CoreError::CommissionAlreadyPaid(_)
            | CoreError::LeadAlreadyConverted(_)
            | CoreError::StillReferenced { .. }
            | CoreError::TripFull { .. }
            | CoreError::BookingClosed { .. } => ErrorCode::Conflict,

            CoreError::InvalidStatusTransition { .. }
            | CoreError::StatusRequiresFullPayment { .. }
            | CoreError::TotalBelowPaid { .. }
            | CoreError::TripInactive(_)
            | CoreError::CommissionNotPayable { .. } => ErrorCode::BusinessRule,
        };

        let message = match err {
            CoreError::Validation(v) => v.to_string(),
            other => other.to_string(),
        };
        ApiError::new(code, message)
    }
}

/// Handler result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tripdesk_core::{Money, PaymentStatus, ValidationError};

    #[test]
    fn test_core_errors_map_to_status_codes() {
        let mismatch: ApiError = CoreError::FirstPaymentMismatch {
            expected: Money::from_cents(510_000),
            provided: Money::from_cents(500_000),
        }
        .into();
        assert_eq!(mismatch.status(), StatusCode::BAD_REQUEST);

        let paid: ApiError = CoreError::CommissionAlreadyPaid("b-1".to_string()).into();
        assert_eq!(paid.status(), StatusCode::CONFLICT);

        let full: ApiError = CoreError::TripFull {
            trip_id: "t-1".to_string(),
            capacity: 30,
        }
        .into();
        assert_eq!(full.status(), StatusCode::CONFLICT);

        let transition: ApiError = CoreError::InvalidStatusTransition {
            from: PaymentStatus::Refunded,
            to: PaymentStatus::Pending,
        }
        .into();
        assert_eq!(transition.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let invalid: ApiError = CoreError::Validation(ValidationError::required("trip_id")).into();
        assert_eq!(invalid.code, ErrorCode::ValidationError);
        assert!(!invalid.message.starts_with("Validation error"));
    }

    #[test]
    fn test_db_errors_hide_internals() {
        let err: ApiError = DbError::QueryFailed("no such column: bogus".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Database operation failed");

        let err: ApiError = DbError::not_found("Trip", "t-9").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Trip not found: t-9");

        let err: ApiError = DbError::duplicate("trips.code", "CAP-26").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_value(ApiError::new(ErrorCode::BusinessRule, "no")).unwrap();
        assert_eq!(json["code"], "BUSINESS_RULE");
        assert_eq!(json["message"], "no");
    }
}
