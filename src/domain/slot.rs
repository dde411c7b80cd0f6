//! Bookable slot model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{OwnerId, SlotId};

/// Smallest allowed seat capacity.
pub const CAPACITY_MIN: i32 = 1;

/// Largest allowed seat capacity.
pub const CAPACITY_MAX: i32 = 10;

/// Capacity used when a create request does not specify one.
pub const DEFAULT_CAPACITY: i32 = 3;

/// A bookable time window with finite seat capacity.
///
/// The window is half-open: `[start_time, end_time)`. The confirmed
/// reservation count is never stored on the slot itself — it is derived
/// by counting reservation rows, so there is no second counter that could
/// drift from the ledger. See [`SlotWithCount`] for the read-side pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Unique slot identifier.
    pub id: SlotId,
    /// Counselor who owns the slot.
    pub owner_id: OwnerId,
    /// Inclusive start of the window.
    pub start_time: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end_time: DateTime<Utc>,
    /// Maximum number of confirmed reservations.
    pub capacity: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    /// Creates a new slot with a fresh identifier and `now` timestamps.
    #[must_use]
    pub fn new(
        owner_id: OwnerId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        capacity: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SlotId::new(),
            owner_id,
            start_time,
            end_time,
            capacity,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A slot paired with its confirmed reservation count, read in one
/// consistent per-slot snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWithCount {
    /// The slot itself.
    pub slot: Slot,
    /// Number of confirmed reservations at read time.
    pub confirmed_count: i64,
}

impl SlotWithCount {
    /// Seats still open for booking. Never negative.
    #[must_use]
    pub fn available_seats(&self) -> i64 {
        (i64::from(self.slot.capacity) - self.confirmed_count).max(0)
    }

    /// Whether at least one seat is open.
    #[must_use]
    pub fn has_availability(&self) -> bool {
        self.available_seats() > 0
    }
}
