//! Owner-side reservation lookup handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ReservationDetailResponse, ReservationDto, SlotWindowDto};
use crate::app_state::AppState;
use crate::domain::{OwnerId, ReservationId};
use crate::error::{BookingError, ErrorResponse};

/// `GET /reservations/:id` — One reservation with its slot window.
///
/// # Errors
///
/// Returns [`BookingError::ReservationNotFound`] if the reservation is
/// absent or sits in another owner's slot.
#[utoipa::path(
    get,
    path = "/api/v1/reservations/{id}",
    tag = "Reservations",
    summary = "Get reservation details",
    description = "Returns one reservation with its slot window, scoped to the calling owner.",
    params(
        ("id" = uuid::Uuid, Path, description = "Reservation UUID"),
    ),
    responses(
        (status = 200, description = "Reservation detail", body = ReservationDetailResponse),
        (status = 404, description = "Reservation not found", body = ErrorResponse),
    )
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    owner_id: OwnerId,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    let (reservation, slot) = state
        .reservations
        .get(owner_id, ReservationId::from_uuid(id))
        .await?;

    Ok(Json(ReservationDetailResponse {
        reservation: ReservationDto::from(&reservation),
        slot: SlotWindowDto::from(&slot),
    }))
}

/// Reservation lookup routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/reservations/{id}", get(get_reservation))
}
