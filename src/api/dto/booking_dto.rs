//! DTOs for the public booking surface and reservation queries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    DayAvailability, Reservation, ReservationId, Slot, SlotAvailability, SlotId, TokenValue,
};
use crate::service::{AdmittedReservation, AvailabilityOverview};

/// Query parameter carrying the access token on public endpoints.
#[derive(Debug, Deserialize, IntoParams)]
pub struct TokenQuery {
    /// Access token from the booking link.
    pub token: TokenValue,
}

/// Request body for `POST /booking/reservations`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservationRequest {
    /// Slot to book a seat in.
    pub slot_id: SlotId,
    /// Applicant display name.
    pub applicant_name: String,
    /// Applicant contact.
    pub applicant_contact: String,
}

/// One reservation row.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationDto {
    /// Reservation identifier.
    pub id: ReservationId,
    /// Slot the seat belongs to.
    pub slot_id: SlotId,
    /// Applicant display name.
    pub applicant_name: String,
    /// Applicant contact.
    pub applicant_contact: String,
    /// Reservation status.
    pub status: String,
    /// Admission timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&Reservation> for ReservationDto {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id,
            slot_id: r.slot_id,
            applicant_name: r.applicant_name.clone(),
            applicant_contact: r.applicant_contact.clone(),
            status: r.status.clone(),
            created_at: r.created_at,
        }
    }
}

/// The booked slot's window, echoed alongside a reservation.
#[derive(Debug, Serialize, ToSchema)]
pub struct SlotWindowDto {
    /// Slot identifier.
    pub id: SlotId,
    /// Inclusive start of the window.
    pub start_time: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end_time: DateTime<Utc>,
}

impl From<&Slot> for SlotWindowDto {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id,
            start_time: slot.start_time,
            end_time: slot.end_time,
        }
    }
}

/// A reservation together with its slot window.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationDetailResponse {
    /// The reservation.
    pub reservation: ReservationDto,
    /// Window of the booked slot.
    pub slot: SlotWindowDto,
}

impl From<&AdmittedReservation> for ReservationDetailResponse {
    fn from(admitted: &AdmittedReservation) -> Self {
        Self {
            reservation: ReservationDto::from(&admitted.reservation),
            slot: SlotWindowDto::from(&admitted.slot),
        }
    }
}

/// One open slot in the availability listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct AvailableSlotDto {
    /// Slot identifier.
    pub id: SlotId,
    /// Inclusive start of the window.
    pub start_time: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end_time: DateTime<Utc>,
    /// Seat capacity.
    pub capacity: i32,
    /// Confirmed reservations at snapshot time.
    pub confirmed_count: i64,
    /// Seats still open.
    pub available_seats: i64,
}

impl From<&SlotAvailability> for AvailableSlotDto {
    fn from(s: &SlotAvailability) -> Self {
        Self {
            id: s.id,
            start_time: s.start_time,
            end_time: s.end_time,
            capacity: s.capacity,
            confirmed_count: s.confirmed_count,
            available_seats: s.available_seats,
        }
    }
}

/// Open slots of one calendar day.
#[derive(Debug, Serialize, ToSchema)]
pub struct DayAvailabilityDto {
    /// UTC calendar date.
    pub date: NaiveDate,
    /// Open slots starting on that date.
    pub slots: Vec<AvailableSlotDto>,
}

impl From<&DayAvailability> for DayAvailabilityDto {
    fn from(day: &DayAvailability) -> Self {
        Self {
            date: day.date,
            slots: day.slots.iter().map(AvailableSlotDto::from).collect(),
        }
    }
}

/// Response body for `GET /booking/slots`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    /// Days with open slots, ascending.
    pub days: Vec<DayAvailabilityDto>,
    /// Contact the booking link was issued to, for form pre-fill.
    pub recipient_contact: String,
}

impl From<&AvailabilityOverview> for AvailabilityResponse {
    fn from(overview: &AvailabilityOverview) -> Self {
        Self {
            days: overview.days.iter().map(DayAvailabilityDto::from).collect(),
            recipient_contact: overview.recipient_contact.clone(),
        }
    }
}
