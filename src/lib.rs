//! # slotbook
//!
//! Booking service for counselor time slots. Owners publish capacity-bounded
//! slots and issue single-use access links; link holders reserve a seat
//! without an account. The admission path guarantees that confirmed
//! reservations for a slot never exceed its capacity, even under concurrent
//! booking attempts, by serializing the capacity check and the reservation
//! insert per slot inside one atomic unit.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── SlotService / TokenService / ReservationService (service/)
//!     ├── NotificationDispatcher (notify/)
//!     │
//!     ├── BookingStore (persistence/)
//!     │     ├── PostgresStore (sqlx, row-level locking)
//!     │     └── MemoryStore (per-slot async mutex)
//!     │
//!     └── Domain model (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod service;
