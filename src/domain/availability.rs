//! Availability grouping for the public listing endpoint.
//!
//! Pure functions over [`SlotWithCount`] snapshots: slots with open seats
//! are grouped by the UTC calendar date of their start time. The listing
//! is advisory — capacity is enforced by the admission path, so staleness
//! between listing and booking is expected and handled there.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::ids::SlotId;
use super::slot::SlotWithCount;

/// One open slot as presented to an applicant.
#[derive(Debug, Clone, Serialize)]
pub struct SlotAvailability {
    /// Slot identifier.
    pub id: SlotId,
    /// Inclusive start of the window.
    pub start_time: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end_time: DateTime<Utc>,
    /// Configured seat capacity.
    pub capacity: i32,
    /// Confirmed reservations at snapshot time.
    pub confirmed_count: i64,
    /// Seats still open.
    pub available_seats: i64,
}

impl From<&SlotWithCount> for SlotAvailability {
    fn from(sc: &SlotWithCount) -> Self {
        Self {
            id: sc.slot.id,
            start_time: sc.slot.start_time,
            end_time: sc.slot.end_time,
            capacity: sc.slot.capacity,
            confirmed_count: sc.confirmed_count,
            available_seats: sc.available_seats(),
        }
    }
}

/// Open slots of one calendar day, ordered by start time.
#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    /// UTC calendar date of the slots' start times.
    pub date: NaiveDate,
    /// Open slots starting on that date.
    pub slots: Vec<SlotAvailability>,
}

/// Groups slots with open seats by the UTC date of their start time.
///
/// Full slots are excluded. Days are returned in ascending date order and
/// slots within a day in ascending start-time order.
#[must_use]
pub fn group_by_date(slots: &[SlotWithCount]) -> Vec<DayAvailability> {
    let mut days: Vec<DayAvailability> = Vec::new();

    let mut open: Vec<&SlotWithCount> = slots.iter().filter(|s| s.has_availability()).collect();
    open.sort_by_key(|s| s.slot.start_time);

    for sc in open {
        let date = sc.slot.start_time.date_naive();
        match days.last_mut() {
            Some(day) if day.date == date => day.slots.push(SlotAvailability::from(sc)),
            _ => days.push(DayAvailability {
                date,
                slots: vec![SlotAvailability::from(sc)],
            }),
        }
    }

    days
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{OwnerId, Slot};
    use chrono::{TimeDelta, TimeZone, Utc};

    fn slot_at(day: u32, hour: u32, capacity: i32, confirmed: i64) -> SlotWithCount {
        let Some(start) = Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).single() else {
            panic!("valid timestamp");
        };
        let slot = Slot::new(
            OwnerId::from_uuid(uuid::Uuid::new_v4()),
            start,
            start + TimeDelta::minutes(30),
            capacity,
        );
        SlotWithCount {
            slot,
            confirmed_count: confirmed,
        }
    }

    #[test]
    fn groups_by_utc_date_in_order() {
        let slots = vec![
            slot_at(12, 14, 3, 0),
            slot_at(11, 9, 3, 1),
            slot_at(12, 10, 3, 0),
        ];
        let days = group_by_date(&slots);
        assert_eq!(days.len(), 2);

        let Some(first) = days.first() else {
            panic!("expected two days");
        };
        assert_eq!(first.date.to_string(), "2025-03-11");
        assert_eq!(first.slots.len(), 1);

        let Some(second) = days.get(1) else {
            panic!("expected two days");
        };
        assert_eq!(second.date.to_string(), "2025-03-12");
        // Within a day, ascending start time.
        let hours: Vec<u32> = second
            .slots
            .iter()
            .map(|s| {
                use chrono::Timelike;
                s.start_time.hour()
            })
            .collect();
        assert_eq!(hours, vec![10, 14]);
    }

    #[test]
    fn excludes_full_slots() {
        let slots = vec![slot_at(11, 9, 2, 2), slot_at(11, 10, 2, 1)];
        let days = group_by_date(&slots);
        assert_eq!(days.len(), 1);
        let Some(day) = days.first() else {
            panic!("expected one day");
        };
        assert_eq!(day.slots.len(), 1);
        assert_eq!(day.slots.first().map(|s| s.available_seats), Some(1));
    }

    #[test]
    fn empty_input_yields_no_days() {
        assert!(group_by_date(&[]).is_empty());
    }
}
