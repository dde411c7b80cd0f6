//! Notification payload.

use chrono::{DateTime, Utc};

/// What the recipient of a booking link needs to know: where to book and
/// which time windows are on offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingNotice {
    /// Recipient contact (typically an email address).
    pub recipient_contact: String,
    /// Booking URL carrying the access token.
    pub booking_url: String,
    /// Time windows of the covered slots, ordered by start time.
    pub slot_windows: Vec<(DateTime<Utc>, DateTime<Utc>)>,
}
