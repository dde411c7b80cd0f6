//! Confirmed reservation model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ReservationId, SlotId};

/// Status value of every persisted reservation. There is no cancellation
/// or refund flow, so no other status exists.
pub const STATUS_CONFIRMED: &str = "confirmed";

/// Identity of the person booking a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    /// Applicant display name.
    pub name: String,
    /// Applicant contact (typically an email address).
    pub contact: String,
}

/// One confirmed booking of one seat in a slot.
///
/// Created exclusively inside the admission transaction and immutable
/// afterwards. Reservation rows are the source of truth for a slot's
/// confirmed count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique reservation identifier.
    pub id: ReservationId,
    /// Slot this reservation occupies a seat in.
    pub slot_id: SlotId,
    /// Applicant display name.
    pub applicant_name: String,
    /// Applicant contact.
    pub applicant_contact: String,
    /// Always [`STATUS_CONFIRMED`].
    pub status: String,
    /// Admission timestamp.
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Creates a confirmed reservation for the given slot and applicant.
    #[must_use]
    pub fn confirmed(slot_id: SlotId, applicant: &Applicant) -> Self {
        Self {
            id: ReservationId::new(),
            slot_id,
            applicant_name: applicant.name.clone(),
            applicant_contact: applicant.contact.clone(),
            status: STATUS_CONFIRMED.to_string(),
            created_at: Utc::now(),
        }
    }
}
