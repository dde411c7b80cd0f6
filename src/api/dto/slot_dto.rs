//! Slot-related DTOs for the admin surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{IssuedToken, Slot, SlotId, SlotWithCount, TokenValue};

/// Request body for `POST /slots`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSlotRequest {
    /// Inclusive start of the window.
    pub start_time: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end_time: DateTime<Utc>,
    /// Seat capacity (1–10). Defaults to 3 when omitted.
    #[serde(default)]
    pub capacity: Option<i32>,
}

/// Request body for `PATCH /slots/{id}`. All fields optional.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSlotRequest {
    /// New start time.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// New end time.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// New capacity (1–10).
    #[serde(default)]
    pub capacity: Option<i32>,
}

/// Query parameters for `GET /slots`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListSlotsQuery {
    /// Only slots starting at or after this instant.
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Only slots starting at or before this instant.
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

/// One slot with derived seat accounting.
#[derive(Debug, Serialize, ToSchema)]
pub struct SlotResponse {
    /// Slot identifier.
    pub id: SlotId,
    /// Inclusive start of the window.
    pub start_time: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end_time: DateTime<Utc>,
    /// Seat capacity.
    pub capacity: i32,
    /// Confirmed reservations at read time.
    pub confirmed_count: i64,
    /// Seats still open.
    pub available_seats: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<&SlotWithCount> for SlotResponse {
    fn from(sc: &SlotWithCount) -> Self {
        Self {
            id: sc.slot.id,
            start_time: sc.slot.start_time,
            end_time: sc.slot.end_time,
            capacity: sc.slot.capacity,
            confirmed_count: sc.confirmed_count,
            available_seats: sc.available_seats(),
            created_at: sc.slot.created_at,
            updated_at: sc.slot.updated_at,
        }
    }
}

impl SlotResponse {
    /// Builds a response for a slot known to have no reservations yet
    /// (just created or just updated — updates are only allowed on
    /// unbooked slots).
    #[must_use]
    pub fn from_unbooked(slot: &Slot) -> Self {
        Self::from(&SlotWithCount {
            slot: slot.clone(),
            confirmed_count: 0,
        })
    }
}

/// Slot detail including its reservations, for `GET /slots/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SlotDetailResponse {
    /// The slot with seat accounting.
    pub slot: SlotResponse,
    /// Reservations, oldest first.
    pub reservations: Vec<super::booking_dto::ReservationDto>,
}

/// Request body for `POST /slots/links`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueLinksRequest {
    /// Slots the link should cover (all owned by the caller).
    pub slot_ids: Vec<SlotId>,
    /// Recipient contact the link is sent to.
    pub recipient_contact: String,
}

/// Response body for `POST /slots/links` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct IssuedTokenResponse {
    /// Generated token value.
    pub token: TokenValue,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// Booking URL for the recipient.
    pub booking_url: String,
    /// Number of slots the token covers.
    pub slot_count: usize,
}

impl From<IssuedToken> for IssuedTokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
            booking_url: issued.booking_url,
            slot_count: issued.slot_count,
        }
    }
}
