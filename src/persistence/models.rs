//! Database row models and their domain conversions.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{AccessToken, Reservation, Slot, SlotWithCount};

/// A row from the `slots` table.
#[derive(Debug, Clone, FromRow)]
pub struct SlotRow {
    /// Slot identifier.
    pub id: Uuid,
    /// Owning counselor.
    pub owner_id: Uuid,
    /// Inclusive start of the window.
    pub start_time: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end_time: DateTime<Utc>,
    /// Seat capacity.
    pub capacity: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<SlotRow> for Slot {
    fn from(row: SlotRow) -> Self {
        Self {
            id: row.id.into(),
            owner_id: row.owner_id.into(),
            start_time: row.start_time,
            end_time: row.end_time,
            capacity: row.capacity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A slot row joined with its reservation count.
#[derive(Debug, Clone, FromRow)]
pub struct SlotCountRow {
    /// Slot identifier.
    pub id: Uuid,
    /// Owning counselor.
    pub owner_id: Uuid,
    /// Inclusive start of the window.
    pub start_time: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end_time: DateTime<Utc>,
    /// Seat capacity.
    pub capacity: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// `COUNT(*)` over the slot's reservations.
    pub confirmed_count: i64,
}

impl From<SlotCountRow> for SlotWithCount {
    fn from(row: SlotCountRow) -> Self {
        Self {
            slot: Slot {
                id: row.id.into(),
                owner_id: row.owner_id.into(),
                start_time: row.start_time,
                end_time: row.end_time,
                capacity: row.capacity,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            confirmed_count: row.confirmed_count,
        }
    }
}

/// A row from the `access_tokens` table.
#[derive(Debug, Clone, FromRow)]
pub struct TokenRow {
    /// Token value (primary key).
    pub token: Uuid,
    /// Recipient contact.
    pub recipient_contact: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Whether the token has been consumed.
    pub used: bool,
    /// Issuance timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<TokenRow> for AccessToken {
    fn from(row: TokenRow) -> Self {
        Self {
            token: row.token.into(),
            recipient_contact: row.recipient_contact,
            expires_at: row.expires_at,
            used: row.used,
            created_at: row.created_at,
        }
    }
}

/// A row from the `reservations` table.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationRow {
    /// Reservation identifier.
    pub id: Uuid,
    /// Slot the seat belongs to.
    pub slot_id: Uuid,
    /// Applicant display name.
    pub applicant_name: String,
    /// Applicant contact.
    pub applicant_contact: String,
    /// Reservation status.
    pub status: String,
    /// Admission timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Self {
            id: row.id.into(),
            slot_id: row.slot_id.into(),
            applicant_name: row.applicant_name,
            applicant_contact: row.applicant_contact,
            status: row.status,
            created_at: row.created_at,
        }
    }
}
