//! In-memory implementation of the persistence layer.
//!
//! Backend for tests and local development. Mirrors the locking shape of
//! the PostgreSQL store: each slot lives behind its own async mutex, so
//! admissions serialize per slot and never across slots, and the lock
//! wait is bounded by `tokio::time::timeout`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use super::BookingStore;
use crate::domain::{
    AccessToken, Applicant, OwnerId, Reservation, ReservationId, Slot, SlotId, SlotWithCount,
    TokenValue,
};
use crate::error::BookingError;

/// A slot together with its reservation ledger, guarded as one unit.
#[derive(Debug)]
struct SlotCell {
    slot: Slot,
    reservations: Vec<Reservation>,
}

#[derive(Debug, Clone)]
struct TokenCell {
    token: AccessToken,
    slot_ids: Vec<SlotId>,
}

/// In-memory store with per-slot locking.
///
/// # Concurrency
///
/// - The outer map is only held long enough to clone a cell handle.
/// - Admissions against the same slot serialize on that slot's mutex.
/// - Admissions against different slots proceed concurrently.
/// - Lock order is always slot cell first, then the token map; no other
///   path holds both, so the pair cannot deadlock.
#[derive(Debug)]
pub struct MemoryStore {
    slots: RwLock<HashMap<SlotId, Arc<Mutex<SlotCell>>>>,
    tokens: RwLock<HashMap<TokenValue, TokenCell>>,
    lock_wait: Duration,
}

impl MemoryStore {
    /// Creates an empty store with a 5 second admission lock wait.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lock_wait(Duration::from_secs(5))
    }

    /// Creates an empty store with the given admission lock wait bound.
    #[must_use]
    pub fn with_lock_wait(lock_wait: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
            lock_wait,
        }
    }

    async fn cell(&self, slot_id: SlotId) -> Option<Arc<Mutex<SlotCell>>> {
        self.slots.read().await.get(&slot_id).map(Arc::clone)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingStore for MemoryStore {
    async fn insert_slot(&self, slot: &Slot) -> Result<(), BookingError> {
        let mut map = self.slots.write().await;
        map.insert(
            slot.id,
            Arc::new(Mutex::new(SlotCell {
                slot: slot.clone(),
                reservations: Vec::new(),
            })),
        );
        Ok(())
    }

    async fn list_slots(
        &self,
        owner_id: OwnerId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<SlotWithCount>, BookingError> {
        let cells: Vec<Arc<Mutex<SlotCell>>> =
            self.slots.read().await.values().map(Arc::clone).collect();

        let mut result = Vec::new();
        for cell in cells {
            let guard = cell.lock().await;
            if guard.slot.owner_id != owner_id {
                continue;
            }
            if from.is_some_and(|f| guard.slot.start_time < f) {
                continue;
            }
            if to.is_some_and(|t| guard.slot.start_time > t) {
                continue;
            }
            result.push(SlotWithCount {
                slot: guard.slot.clone(),
                confirmed_count: guard.reservations.len() as i64,
            });
        }
        result.sort_by_key(|s| s.slot.start_time);
        Ok(result)
    }

    async fn get_slot(&self, slot_id: SlotId) -> Result<Option<SlotWithCount>, BookingError> {
        let Some(cell) = self.cell(slot_id).await else {
            return Ok(None);
        };
        let guard = cell.lock().await;
        Ok(Some(SlotWithCount {
            slot: guard.slot.clone(),
            confirmed_count: guard.reservations.len() as i64,
        }))
    }

    async fn fetch_slots(&self, slot_ids: &[SlotId]) -> Result<Vec<Slot>, BookingError> {
        let mut result = Vec::new();
        for slot_id in slot_ids {
            if let Some(cell) = self.cell(*slot_id).await {
                result.push(cell.lock().await.slot.clone());
            }
        }
        result.sort_by_key(|s| s.start_time);
        Ok(result)
    }

    async fn update_slot(
        &self,
        slot_id: SlotId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        capacity: i32,
    ) -> Result<Slot, BookingError> {
        let Some(cell) = self.cell(slot_id).await else {
            return Err(BookingError::SlotNotFound(*slot_id.as_uuid()));
        };
        let mut guard = cell.lock().await;
        guard.slot.start_time = start_time;
        guard.slot.end_time = end_time;
        guard.slot.capacity = capacity;
        guard.slot.updated_at = Utc::now();
        Ok(guard.slot.clone())
    }

    async fn delete_slot(&self, slot_id: SlotId) -> Result<(), BookingError> {
        let mut map = self.slots.write().await;
        if map.remove(&slot_id).is_none() {
            return Err(BookingError::SlotNotFound(*slot_id.as_uuid()));
        }
        Ok(())
    }

    async fn insert_token(
        &self,
        token: &AccessToken,
        slot_ids: &[SlotId],
    ) -> Result<(), BookingError> {
        let mut tokens = self.tokens.write().await;
        tokens.insert(
            token.token,
            TokenCell {
                token: token.clone(),
                slot_ids: slot_ids.to_vec(),
            },
        );
        Ok(())
    }

    async fn fetch_token(
        &self,
        value: TokenValue,
    ) -> Result<Option<(AccessToken, Vec<SlotWithCount>)>, BookingError> {
        // Clone the cell before resolving slots so no path holds the
        // token map while waiting on a slot mutex.
        let cell = { self.tokens.read().await.get(&value).cloned() };
        let Some(cell) = cell else {
            return Ok(None);
        };

        let mut slots = Vec::new();
        for slot_id in &cell.slot_ids {
            if let Some(slot_cell) = self.cell(*slot_id).await {
                let guard = slot_cell.lock().await;
                slots.push(SlotWithCount {
                    slot: guard.slot.clone(),
                    confirmed_count: guard.reservations.len() as i64,
                });
            }
        }
        slots.sort_by_key(|s| s.slot.start_time);
        Ok(Some((cell.token, slots)))
    }

    async fn admit(
        &self,
        value: TokenValue,
        slot_id: SlotId,
        applicant: &Applicant,
    ) -> Result<(Reservation, Slot), BookingError> {
        let Some(cell) = self.cell(slot_id).await else {
            return Err(BookingError::SlotNotFound(*slot_id.as_uuid()));
        };

        // Bounded wait for the per-slot lock; a timeout is transient,
        // never a capacity rejection.
        let Ok(mut guard) = tokio::time::timeout(self.lock_wait, cell.lock()).await else {
            return Err(BookingError::TransientFailure(
                "slot lock wait timed out".to_string(),
            ));
        };

        if guard.reservations.len() as i64 >= i64::from(guard.slot.capacity) {
            return Err(BookingError::CapacityExceeded);
        }

        // Redeem before inserting: if the token was consumed by a
        // concurrent admission, this one leaves no trace.
        {
            let mut tokens = self.tokens.write().await;
            let Some(token_cell) = tokens.get_mut(&value) else {
                return Err(BookingError::InvalidToken);
            };
            if token_cell.token.used {
                return Err(BookingError::InvalidToken);
            }
            token_cell.token.used = true;
        }

        let reservation = Reservation::confirmed(slot_id, applicant);
        guard.reservations.push(reservation.clone());
        Ok((reservation, guard.slot.clone()))
    }

    async fn list_reservations(&self, slot_id: SlotId) -> Result<Vec<Reservation>, BookingError> {
        let Some(cell) = self.cell(slot_id).await else {
            return Ok(Vec::new());
        };
        let guard = cell.lock().await;
        let mut reservations = guard.reservations.clone();
        reservations.sort_by_key(|r| r.created_at);
        Ok(reservations)
    }

    async fn get_reservation(
        &self,
        id: ReservationId,
    ) -> Result<Option<(Reservation, Slot)>, BookingError> {
        let cells: Vec<Arc<Mutex<SlotCell>>> =
            self.slots.read().await.values().map(Arc::clone).collect();

        for cell in cells {
            let guard = cell.lock().await;
            if let Some(reservation) = guard.reservations.iter().find(|r| r.id == id) {
                return Ok(Some((reservation.clone(), guard.slot.clone())));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn make_slot(capacity: i32) -> Slot {
        let start = Utc::now() + TimeDelta::days(1);
        Slot::new(
            OwnerId::from_uuid(uuid::Uuid::new_v4()),
            start,
            start + TimeDelta::minutes(30),
            capacity,
        )
    }

    fn make_applicant(n: usize) -> Applicant {
        Applicant {
            name: format!("applicant {n}"),
            contact: format!("applicant{n}@example.com"),
        }
    }

    async fn seed_token(store: &MemoryStore, slot_ids: &[SlotId]) -> TokenValue {
        let token = AccessToken::issue("pat@example.com".to_string(), 7);
        let value = token.token;
        let Ok(()) = store.insert_token(&token, slot_ids).await else {
            panic!("token insert failed");
        };
        value
    }

    #[tokio::test]
    async fn admit_fills_seats_up_to_capacity() {
        let store = MemoryStore::new();
        let slot = make_slot(2);
        let Ok(()) = store.insert_slot(&slot).await else {
            panic!("slot insert failed");
        };

        for n in 0..2 {
            let value = seed_token(&store, &[slot.id]).await;
            let result = store.admit(value, slot.id, &make_applicant(n)).await;
            assert!(result.is_ok());
        }

        let value = seed_token(&store, &[slot.id]).await;
        let result = store.admit(value, slot.id, &make_applicant(9)).await;
        assert!(matches!(result, Err(BookingError::CapacityExceeded)));

        let Ok(Some(with_count)) = store.get_slot(slot.id).await else {
            panic!("slot vanished");
        };
        assert_eq!(with_count.confirmed_count, 2);
    }

    #[tokio::test]
    async fn admit_rejects_consumed_token_without_residue() {
        let store = MemoryStore::new();
        let slot = make_slot(5);
        let Ok(()) = store.insert_slot(&slot).await else {
            panic!("slot insert failed");
        };

        let value = seed_token(&store, &[slot.id]).await;
        let first = store.admit(value, slot.id, &make_applicant(0)).await;
        assert!(first.is_ok());

        let second = store.admit(value, slot.id, &make_applicant(1)).await;
        assert!(matches!(second, Err(BookingError::InvalidToken)));

        let Ok(Some(with_count)) = store.get_slot(slot.id).await else {
            panic!("slot vanished");
        };
        assert_eq!(with_count.confirmed_count, 1);
    }

    #[tokio::test]
    async fn admit_missing_slot_is_not_found() {
        let store = MemoryStore::new();
        let value = seed_token(&store, &[]).await;
        let result = store.admit(value, SlotId::new(), &make_applicant(0)).await;
        assert!(matches!(result, Err(BookingError::SlotNotFound(_))));
    }

    #[tokio::test]
    async fn slot_lock_is_scoped_to_one_slot() {
        let store = MemoryStore::with_lock_wait(Duration::from_millis(50));
        let slot_a = make_slot(3);
        let slot_b = make_slot(3);
        for slot in [&slot_a, &slot_b] {
            let Ok(()) = store.insert_slot(slot).await else {
                panic!("slot insert failed");
            };
        }
        let token_a = seed_token(&store, &[slot_a.id]).await;
        let token_b = seed_token(&store, &[slot_b.id]).await;

        // Hold slot A's lock the way an in-flight admission would.
        let Some(cell_a) = store.cell(slot_a.id).await else {
            panic!("slot A vanished");
        };
        let guard = cell_a.lock().await;

        // Slot B admits while A is locked.
        let result = store.admit(token_b, slot_b.id, &make_applicant(0)).await;
        assert!(result.is_ok());

        // Slot A hits the bounded wait and fails transiently, never as a
        // capacity rejection.
        let result = store.admit(token_a, slot_a.id, &make_applicant(1)).await;
        assert!(matches!(result, Err(BookingError::TransientFailure(_))));

        drop(guard);

        // Once the holder releases, the same token admits cleanly.
        let result = store.admit(token_a, slot_a.id, &make_applicant(1)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn fetch_token_resolves_live_slots_only() {
        let store = MemoryStore::new();
        let slot_a = make_slot(3);
        let slot_b = make_slot(3);
        for slot in [&slot_a, &slot_b] {
            let Ok(()) = store.insert_slot(slot).await else {
                panic!("slot insert failed");
            };
        }

        let value = seed_token(&store, &[slot_a.id, slot_b.id]).await;
        let Ok(()) = store.delete_slot(slot_b.id).await else {
            panic!("delete failed");
        };

        let Ok(Some((_, slots))) = store.fetch_token(value).await else {
            panic!("token vanished");
        };
        assert_eq!(slots.len(), 1);
        assert_eq!(slots.first().map(|s| s.slot.id), Some(slot_a.id));
    }
}
