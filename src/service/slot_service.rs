//! Slot management: create, list, update, delete, and link issuance.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::token_service::TokenService;
use crate::domain::{
    CAPACITY_MAX, CAPACITY_MIN, DEFAULT_CAPACITY, IssuedToken, OwnerId, Reservation, Slot, SlotId,
    SlotWithCount,
};
use crate::error::BookingError;
use crate::persistence::BookingStore;

/// Partial update of a slot's window and capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotUpdate {
    /// New start time, if changing.
    pub start_time: Option<DateTime<Utc>>,
    /// New end time, if changing.
    pub end_time: Option<DateTime<Utc>>,
    /// New capacity, if changing.
    pub capacity: Option<i32>,
}

/// Owner-facing slot management.
///
/// Every operation is scoped to the calling owner: a slot belonging to
/// someone else behaves exactly like a missing one. A slot that has
/// confirmed reservations is frozen — neither its window nor its
/// capacity may change, and it cannot be deleted.
#[derive(Debug)]
pub struct SlotService<S> {
    store: Arc<S>,
    tokens: Arc<TokenService<S>>,
}

// Manual impl: the derive would demand `S: Clone`, but only the `Arc`
// handles are cloned.
impl<S> Clone for SlotService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<S: BookingStore> SlotService<S> {
    /// Creates a new `SlotService`.
    #[must_use]
    pub fn new(store: Arc<S>, tokens: Arc<TokenService<S>>) -> Self {
        Self { store, tokens }
    }

    /// Creates a slot for the owner.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidRequest`] on an inverted window or
    /// out-of-range capacity, [`BookingError::PersistenceError`] on
    /// storage failure.
    pub async fn create(
        &self,
        owner_id: OwnerId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        capacity: Option<i32>,
    ) -> Result<Slot, BookingError> {
        let capacity = capacity.unwrap_or(DEFAULT_CAPACITY);
        validate_window(start_time, end_time)?;
        validate_capacity(capacity)?;

        let slot = Slot::new(owner_id, start_time, end_time, capacity);
        self.store.insert_slot(&slot).await?;

        tracing::info!(slot_id = %slot.id, "slot created");
        Ok(slot)
    }

    /// Lists the owner's slots with reservation counts, optionally
    /// bounded by start time.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PersistenceError`] on storage failure.
    pub async fn list(
        &self,
        owner_id: OwnerId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<SlotWithCount>, BookingError> {
        self.store.list_slots(owner_id, from, to).await
    }

    /// Fetches one slot with its reservations.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SlotNotFound`] when the slot is absent or
    /// owned by someone else, [`BookingError::PersistenceError`] on
    /// storage failure.
    pub async fn get(
        &self,
        owner_id: OwnerId,
        slot_id: SlotId,
    ) -> Result<(SlotWithCount, Vec<Reservation>), BookingError> {
        let with_count = self.owned_slot(owner_id, slot_id).await?;
        let reservations = self.store.list_reservations(slot_id).await?;
        Ok((with_count, reservations))
    }

    /// Applies a partial update to an unbooked slot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SlotBooked`] when the slot already has
    /// confirmed reservations, [`BookingError::SlotNotFound`] when it is
    /// absent or foreign, [`BookingError::InvalidRequest`] when the
    /// merged window or capacity is invalid.
    pub async fn update(
        &self,
        owner_id: OwnerId,
        slot_id: SlotId,
        update: SlotUpdate,
    ) -> Result<Slot, BookingError> {
        let current = self.owned_slot(owner_id, slot_id).await?;
        if current.confirmed_count > 0 {
            return Err(BookingError::SlotBooked(*slot_id.as_uuid()));
        }

        let start_time = update.start_time.unwrap_or(current.slot.start_time);
        let end_time = update.end_time.unwrap_or(current.slot.end_time);
        let capacity = update.capacity.unwrap_or(current.slot.capacity);
        validate_window(start_time, end_time)?;
        validate_capacity(capacity)?;

        let slot = self
            .store
            .update_slot(slot_id, start_time, end_time, capacity)
            .await?;

        tracing::info!(slot_id = %slot.id, "slot updated");
        Ok(slot)
    }

    /// Deletes an unbooked slot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SlotBooked`] when the slot already has
    /// confirmed reservations, [`BookingError::SlotNotFound`] when it is
    /// absent or foreign.
    pub async fn delete(&self, owner_id: OwnerId, slot_id: SlotId) -> Result<(), BookingError> {
        let current = self.owned_slot(owner_id, slot_id).await?;
        if current.confirmed_count > 0 {
            return Err(BookingError::SlotBooked(*slot_id.as_uuid()));
        }

        self.store.delete_slot(slot_id).await?;
        tracing::info!(%slot_id, "slot deleted");
        Ok(())
    }

    /// Issues a booking link covering the owner's given slots.
    ///
    /// Each slot is checked against the calling owner before delegation,
    /// so a foreign slot id fails as not-found rather than leaking
    /// another owner's schedule.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SlotNotFound`] for absent or foreign
    /// slots, plus any issuance error from
    /// [`TokenService::issue`].
    pub async fn issue_links(
        &self,
        owner_id: OwnerId,
        slot_ids: &[SlotId],
        recipient_contact: &str,
    ) -> Result<IssuedToken, BookingError> {
        for slot_id in slot_ids {
            self.owned_slot(owner_id, *slot_id).await?;
        }
        self.tokens.issue(slot_ids, recipient_contact).await
    }

    async fn owned_slot(
        &self,
        owner_id: OwnerId,
        slot_id: SlotId,
    ) -> Result<SlotWithCount, BookingError> {
        match self.store.get_slot(slot_id).await? {
            Some(with_count) if with_count.slot.owner_id == owner_id => Ok(with_count),
            _ => Err(BookingError::SlotNotFound(*slot_id.as_uuid())),
        }
    }
}

fn validate_window(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<(), BookingError> {
    if start_time >= end_time {
        return Err(BookingError::InvalidRequest(
            "start time must be before end time".to_string(),
        ));
    }
    Ok(())
}

fn validate_capacity(capacity: i32) -> Result<(), BookingError> {
    if !(CAPACITY_MIN..=CAPACITY_MAX).contains(&capacity) {
        return Err(BookingError::InvalidRequest(format!(
            "capacity must be between {CAPACITY_MIN} and {CAPACITY_MAX}"
        )));
    }
    Ok(())
}
