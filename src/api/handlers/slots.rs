//! Slot management handlers: CRUD and booking-link issuance.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateSlotRequest, IssueLinksRequest, IssuedTokenResponse, ListSlotsQuery, ReservationDto,
    SlotDetailResponse, SlotResponse, UpdateSlotRequest,
};
use crate::app_state::AppState;
use crate::domain::{OwnerId, SlotId};
use crate::error::{BookingError, ErrorResponse};
use crate::service::SlotUpdate;

/// `POST /slots` — Create a bookable slot.
///
/// # Errors
///
/// Returns [`BookingError`] on an invalid window or capacity.
#[utoipa::path(
    post,
    path = "/api/v1/slots",
    tag = "Slots",
    summary = "Create a slot",
    description = "Creates a bookable time slot for the calling owner. Capacity defaults to 3 and must stay within 1–10.",
    request_body = CreateSlotRequest,
    responses(
        (status = 201, description = "Slot created", body = SlotResponse),
        (status = 400, description = "Invalid window or capacity", body = ErrorResponse),
    )
)]
pub async fn create_slot(
    State(state): State<AppState>,
    owner_id: OwnerId,
    Json(req): Json<CreateSlotRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let slot = state
        .slots
        .create(owner_id, req.start_time, req.end_time, req.capacity)
        .await?;

    Ok((StatusCode::CREATED, Json(SlotResponse::from_unbooked(&slot))))
}

/// `GET /slots` — List the caller's slots.
///
/// # Errors
///
/// Returns [`BookingError`] on storage failures.
#[utoipa::path(
    get,
    path = "/api/v1/slots",
    tag = "Slots",
    summary = "List slots",
    description = "Returns the calling owner's slots with reservation counts, optionally bounded by start time.",
    params(ListSlotsQuery),
    responses(
        (status = 200, description = "Slot list", body = Vec<SlotResponse>),
    )
)]
pub async fn list_slots(
    State(state): State<AppState>,
    owner_id: OwnerId,
    Query(query): Query<ListSlotsQuery>,
) -> Result<impl IntoResponse, BookingError> {
    let slots = state.slots.list(owner_id, query.from, query.to).await?;
    let data: Vec<SlotResponse> = slots.iter().map(SlotResponse::from).collect();
    Ok(Json(data))
}

/// `GET /slots/:id` — Slot detail with reservations.
///
/// # Errors
///
/// Returns [`BookingError::SlotNotFound`] if the slot is absent or
/// belongs to another owner.
#[utoipa::path(
    get,
    path = "/api/v1/slots/{id}",
    tag = "Slots",
    summary = "Get slot details",
    description = "Returns one slot with seat accounting and its reservations.",
    params(
        ("id" = uuid::Uuid, Path, description = "Slot UUID"),
    ),
    responses(
        (status = 200, description = "Slot detail", body = SlotDetailResponse),
        (status = 404, description = "Slot not found", body = ErrorResponse),
    )
)]
pub async fn get_slot(
    State(state): State<AppState>,
    owner_id: OwnerId,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    let slot_id = SlotId::from_uuid(id);
    let (with_count, reservations) = state.slots.get(owner_id, slot_id).await?;

    Ok(Json(SlotDetailResponse {
        slot: SlotResponse::from(&with_count),
        reservations: reservations.iter().map(ReservationDto::from).collect(),
    }))
}

/// `PATCH /slots/:id` — Update an unbooked slot.
///
/// # Errors
///
/// Returns [`BookingError::SlotBooked`] once the slot has reservations.
#[utoipa::path(
    patch,
    path = "/api/v1/slots/{id}",
    tag = "Slots",
    summary = "Update a slot",
    description = "Changes window and/or capacity. Rejected once the slot has confirmed reservations.",
    params(
        ("id" = uuid::Uuid, Path, description = "Slot UUID"),
    ),
    request_body = UpdateSlotRequest,
    responses(
        (status = 200, description = "Slot updated", body = SlotResponse),
        (status = 404, description = "Slot not found", body = ErrorResponse),
        (status = 409, description = "Slot already booked", body = ErrorResponse),
    )
)]
pub async fn update_slot(
    State(state): State<AppState>,
    owner_id: OwnerId,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateSlotRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let slot_id = SlotId::from_uuid(id);
    let update = SlotUpdate {
        start_time: req.start_time,
        end_time: req.end_time,
        capacity: req.capacity,
    };
    let slot = state.slots.update(owner_id, slot_id, update).await?;
    Ok(Json(SlotResponse::from_unbooked(&slot)))
}

/// `DELETE /slots/:id` — Delete an unbooked slot.
///
/// # Errors
///
/// Returns [`BookingError::SlotBooked`] once the slot has reservations.
#[utoipa::path(
    delete,
    path = "/api/v1/slots/{id}",
    tag = "Slots",
    summary = "Delete a slot",
    description = "Deletes a slot. Rejected once the slot has confirmed reservations.",
    params(
        ("id" = uuid::Uuid, Path, description = "Slot UUID"),
    ),
    responses(
        (status = 204, description = "Slot deleted"),
        (status = 404, description = "Slot not found", body = ErrorResponse),
        (status = 409, description = "Slot already booked", body = ErrorResponse),
    )
)]
pub async fn delete_slot(
    State(state): State<AppState>,
    owner_id: OwnerId,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    state.slots.delete(owner_id, SlotId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /slots/links` — Issue a booking link for one or more slots.
///
/// # Errors
///
/// Returns [`BookingError`] when a slot is missing, foreign, or the set
/// spans multiple owners.
#[utoipa::path(
    post,
    path = "/api/v1/slots/links",
    tag = "Slots",
    summary = "Issue a booking link",
    description = "Generates a single-use access token covering the given slots and notifies the recipient. The notification is best-effort; issuance succeeds even if delivery fails.",
    request_body = IssueLinksRequest,
    responses(
        (status = 201, description = "Link issued", body = IssuedTokenResponse),
        (status = 400, description = "Invalid slot set", body = ErrorResponse),
        (status = 404, description = "Slot not found", body = ErrorResponse),
    )
)]
pub async fn issue_links(
    State(state): State<AppState>,
    owner_id: OwnerId,
    Json(req): Json<IssueLinksRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let issued = state
        .slots
        .issue_links(owner_id, &req.slot_ids, &req.recipient_contact)
        .await?;

    Ok((StatusCode::CREATED, Json(IssuedTokenResponse::from(issued))))
}

/// `GET /slots/:id/reservations` — Reservations of one slot.
///
/// # Errors
///
/// Returns [`BookingError::SlotNotFound`] if the slot is absent or
/// belongs to another owner.
#[utoipa::path(
    get,
    path = "/api/v1/slots/{id}/reservations",
    tag = "Slots",
    summary = "List a slot's reservations",
    description = "Returns the slot's reservations ordered oldest first.",
    params(
        ("id" = uuid::Uuid, Path, description = "Slot UUID"),
    ),
    responses(
        (status = 200, description = "Reservation list", body = Vec<ReservationDto>),
        (status = 404, description = "Slot not found", body = ErrorResponse),
    )
)]
pub async fn list_slot_reservations(
    State(state): State<AppState>,
    owner_id: OwnerId,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    let reservations = state
        .reservations
        .list_for_slot(owner_id, SlotId::from_uuid(id))
        .await?;
    let data: Vec<ReservationDto> = reservations.iter().map(ReservationDto::from).collect();
    Ok(Json(data))
}

/// Slot management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/slots", post(create_slot).get(list_slots))
        .route("/slots/links", post(issue_links))
        .route(
            "/slots/{id}",
            get(get_slot).patch(update_slot).delete(delete_slot),
        )
        .route("/slots/{id}/reservations", get(list_slot_reservations))
}
