//! Service layer: business logic orchestration.
//!
//! [`SlotService`] manages a counselor's slots and link issuance,
//! [`TokenService`] issues and validates access tokens, and
//! [`ReservationService`] owns the admission path and the public
//! availability listing. All three are generic over the
//! [`BookingStore`](crate::persistence::BookingStore) backend.

pub mod reservation_service;
pub mod slot_service;
pub mod token_service;

pub use reservation_service::{AdmittedReservation, AvailabilityOverview, ReservationService};
pub use slot_service::{SlotService, SlotUpdate};
pub use token_service::TokenService;
