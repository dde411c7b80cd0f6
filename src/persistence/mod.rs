//! Persistence layer: durable storage of slots, tokens, and reservations.
//!
//! [`BookingStore`] is the storage contract the service layer is generic
//! over. Two backends implement it: [`postgres::PostgresStore`] (sqlx,
//! row-level locking) for production and [`memory::MemoryStore`] (per-slot
//! async mutex) for tests and local development.

pub mod memory;
pub mod models;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use chrono::{DateTime, Utc};

use crate::domain::{
    AccessToken, Applicant, OwnerId, Reservation, ReservationId, Slot, SlotId, SlotWithCount,
    TokenValue,
};
use crate::error::BookingError;

/// Storage contract for slots, access tokens, and the reservation ledger.
///
/// # Atomicity
///
/// Two operations are atomic units by contract, not convention:
///
/// - [`insert_token`](Self::insert_token) writes the token row and all of
///   its slot associations together — a reader never observes a token
///   with zero associations, and a failed insert leaves no partial rows.
/// - [`admit`](Self::admit) is the capacity-safe booking transaction: it
///   serializes per slot, re-reads capacity and count inside the locked
///   view, and commits the reservation insert together with the token
///   redemption — or nothing at all. Faults inside the unit surface as
///   [`BookingError::TransientFailure`] with zero residue.
///
/// # Locking
///
/// The lock taken by `admit` is scoped to one slot: admissions against
/// different slots must not serialize against each other. Waiting is
/// bounded by the backend's configured lock wait; exceeding it is a
/// transient failure, never a capacity rejection.
#[allow(async_fn_in_trait)]
pub trait BookingStore: Send + Sync + 'static {
    /// Persists a new slot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PersistenceError`] on storage failure.
    async fn insert_slot(&self, slot: &Slot) -> Result<(), BookingError>;

    /// Lists an owner's slots with reservation counts, optionally bounded
    /// by start time, ordered by start time ascending.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PersistenceError`] on storage failure.
    async fn list_slots(
        &self,
        owner_id: OwnerId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<SlotWithCount>, BookingError>;

    /// Fetches one slot with its reservation count, read as a consistent
    /// per-slot snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PersistenceError`] on storage failure.
    async fn get_slot(&self, slot_id: SlotId) -> Result<Option<SlotWithCount>, BookingError>;

    /// Fetches the given slots (no counts), ordered by start time
    /// ascending. Missing ids are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PersistenceError`] on storage failure.
    async fn fetch_slots(&self, slot_ids: &[SlotId]) -> Result<Vec<Slot>, BookingError>;

    /// Replaces a slot's window and capacity.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SlotNotFound`] if the slot does not exist,
    /// [`BookingError::PersistenceError`] on storage failure.
    async fn update_slot(
        &self,
        slot_id: SlotId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        capacity: i32,
    ) -> Result<Slot, BookingError>;

    /// Deletes a slot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SlotNotFound`] if the slot does not exist,
    /// [`BookingError::PersistenceError`] on storage failure.
    async fn delete_slot(&self, slot_id: SlotId) -> Result<(), BookingError>;

    /// Persists a token and its slot associations as one atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PersistenceError`] on storage failure; on
    /// failure no token row and no association rows survive.
    async fn insert_token(
        &self,
        token: &AccessToken,
        slot_ids: &[SlotId],
    ) -> Result<(), BookingError>;

    /// Fetches a token with its live associated slots and their counts.
    ///
    /// Associations are resolved at read time; a slot deleted since
    /// issuance is absent from the result.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PersistenceError`] on storage failure.
    async fn fetch_token(
        &self,
        value: TokenValue,
    ) -> Result<Option<(AccessToken, Vec<SlotWithCount>)>, BookingError>;

    /// The capacity-safe booking transaction.
    ///
    /// Inside one atomic, per-slot-serialized unit: locks the slot row,
    /// re-reads capacity and confirmed count, rejects when full, inserts
    /// the reservation, and flips the token to used (failing if another
    /// admission consumed it first). Returns the persisted reservation
    /// with the slot as read inside the locked view.
    ///
    /// # Errors
    ///
    /// - [`BookingError::SlotNotFound`] — slot absent.
    /// - [`BookingError::CapacityExceeded`] — count reached capacity.
    /// - [`BookingError::InvalidToken`] — token consumed concurrently.
    /// - [`BookingError::TransientFailure`] — lock wait exceeded or
    ///   storage fault; nothing was persisted and the caller may retry.
    async fn admit(
        &self,
        value: TokenValue,
        slot_id: SlotId,
        applicant: &Applicant,
    ) -> Result<(Reservation, Slot), BookingError>;

    /// Lists a slot's reservations ordered by creation time ascending.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PersistenceError`] on storage failure.
    async fn list_reservations(&self, slot_id: SlotId) -> Result<Vec<Reservation>, BookingError>;

    /// Fetches one reservation together with its slot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PersistenceError`] on storage failure.
    async fn get_reservation(
        &self,
        id: ReservationId,
    ) -> Result<Option<(Reservation, Slot)>, BookingError>;
}
