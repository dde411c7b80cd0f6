//! Public booking handlers, gated by access token.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AvailabilityResponse, CreateReservationRequest, ReservationDetailResponse, TokenQuery,
};
use crate::app_state::AppState;
use crate::domain::Applicant;
use crate::error::{BookingError, ErrorResponse};

/// `GET /booking/slots` — Open slots for a booking link.
///
/// # Errors
///
/// Returns [`BookingError::InvalidToken`] for a missing, used, or
/// expired token.
#[utoipa::path(
    get,
    path = "/api/v1/booking/slots",
    tag = "Booking",
    summary = "List bookable slots",
    description = "Returns the token's open slots grouped by UTC calendar date. Advisory: seats may be taken between listing and booking; the booking call resolves that race.",
    params(TokenQuery),
    responses(
        (status = 200, description = "Availability grouped by day", body = AvailabilityResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse),
    )
)]
pub async fn list_bookable_slots(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, BookingError> {
    let overview = state.reservations.list_available(query.token).await?;
    Ok(Json(AvailabilityResponse::from(&overview)))
}

/// `POST /booking/reservations` — Book one seat.
///
/// # Errors
///
/// Returns [`BookingError`] when the token is invalid, the slot is not
/// covered, the slot is full, or the attempt hit a transient fault.
#[utoipa::path(
    post,
    path = "/api/v1/booking/reservations",
    tag = "Booking",
    summary = "Book a seat",
    description = "Admits the applicant into the requested slot and consumes the token. Capacity is enforced atomically: concurrent bookings of the last seat yield exactly one confirmation.",
    params(TokenQuery),
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation confirmed", body = ReservationDetailResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse),
        (status = 403, description = "Token does not cover the slot", body = ErrorResponse),
        (status = 404, description = "Slot not found", body = ErrorResponse),
        (status = 409, description = "Slot fully booked", body = ErrorResponse),
        (status = 503, description = "Transient failure, retry", body = ErrorResponse),
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let applicant = Applicant {
        name: req.applicant_name,
        contact: req.applicant_contact,
    };

    let admitted = state
        .reservations
        .admit(query.token, req.slot_id, &applicant)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationDetailResponse::from(&admitted)),
    ))
}

/// Public booking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/booking/slots", get(list_bookable_slots))
        .route("/booking/reservations", post(create_reservation))
}
