//! Domain layer: identifiers, slots, access tokens, and reservations.
//!
//! This module contains the service-side domain model: typed identifiers,
//! the bookable slot with its derived reservation count, the single-use
//! access token, the confirmed reservation, and the availability grouping
//! used by the public listing endpoint.

pub mod access_token;
pub mod availability;
pub mod ids;
pub mod reservation;
pub mod slot;
pub mod token_value;

pub use access_token::{AccessToken, IssuedToken, ValidatedToken};
pub use availability::{DayAvailability, SlotAvailability, group_by_date};
pub use ids::{OwnerId, ReservationId, SlotId};
pub use reservation::{Applicant, Reservation};
pub use slot::{CAPACITY_MAX, CAPACITY_MIN, DEFAULT_CAPACITY, Slot, SlotWithCount};
pub use token_value::TokenValue;
