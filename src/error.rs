//! Service error types with HTTP status code mapping.
//!
//! [`BookingError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4004,
///     "message": "slot is fully booked",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges below).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category         | HTTP Status                |
/// |-----------|------------------|----------------------------|
/// | 1000–1999 | Validation       | 400 Bad Request            |
/// | 2000–2999 | Not Found        | 404 Not Found              |
/// | 3000–3999 | Server           | 500 / 503                  |
/// | 4000–4999 | Booking-Specific | 401 / 403 / 409            |
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A token may only cover slots belonging to a single owner.
    #[error("slots belong to more than one owner")]
    CrossOwnerViolation,

    /// Slot with the given ID was not found (or is not visible to the caller).
    #[error("slot not found: {0}")]
    SlotNotFound(uuid::Uuid),

    /// Reservation with the given ID was not found (or is not visible to the
    /// caller).
    #[error("reservation not found: {0}")]
    ReservationNotFound(uuid::Uuid),

    /// Access token is missing, already used, or expired. The three
    /// conditions are deliberately collapsed so the response does not leak
    /// which one held.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Token is valid but does not cover the requested slot.
    #[error("token does not cover slot {0}")]
    SlotNotAuthorized(uuid::Uuid),

    /// Slot already has confirmed reservations and may not be changed or
    /// deleted.
    #[error("slot {0} has confirmed reservations")]
    SlotBooked(uuid::Uuid),

    /// Admission rejected: the slot is at capacity.
    #[error("slot is fully booked")]
    CapacityExceeded,

    /// Persistence layer failure outside the admission path.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Infrastructure-level fault (lock wait timeout, storage fault inside
    /// the admission transaction). Safe for the caller to retry; the service
    /// never retries on its own.
    #[error("transient failure: {0}")]
    TransientFailure(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::CrossOwnerViolation => 1002,
            Self::SlotNotFound(_) => 2001,
            Self::ReservationNotFound(_) => 2002,
            Self::InvalidToken => 4001,
            Self::SlotNotAuthorized(_) => 4002,
            Self::SlotBooked(_) => 4003,
            Self::CapacityExceeded => 4004,
            Self::PersistenceError(_) => 3001,
            Self::TransientFailure(_) => 3002,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::CrossOwnerViolation => StatusCode::BAD_REQUEST,
            Self::SlotNotFound(_) | Self::ReservationNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::SlotNotAuthorized(_) => StatusCode::FORBIDDEN,
            Self::SlotBooked(_) | Self::CapacityExceeded => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TransientFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
