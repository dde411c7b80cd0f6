//! Reservation admission and queries.
//!
//! [`ReservationService::admit`] is the capacity-safe booking path: it
//! validates the access token, checks that the token covers the target
//! slot, and delegates the atomic seat claim to the store. The service
//! never retries — every failure is surfaced as a typed outcome and
//! retry policy stays with the caller.

use std::sync::Arc;

use serde::Serialize;

use super::token_service::TokenService;
use crate::domain::{
    Applicant, DayAvailability, OwnerId, Reservation, ReservationId, Slot, SlotId, TokenValue,
    group_by_date,
};
use crate::error::BookingError;
use crate::persistence::BookingStore;

/// A successful admission: the persisted reservation and the slot window
/// it occupies, as read inside the admission transaction.
#[derive(Debug, Clone, Serialize)]
pub struct AdmittedReservation {
    /// The persisted reservation.
    pub reservation: Reservation,
    /// The slot the seat belongs to.
    pub slot: Slot,
}

/// Availability listing for one token: open slots grouped by day, plus
/// the recipient contact for UI pre-fill.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityOverview {
    /// Days with at least one open slot, ascending.
    pub days: Vec<DayAvailability>,
    /// Contact the booking link was issued to.
    pub recipient_contact: String,
}

/// Public booking path and owner-side reservation queries.
#[derive(Debug)]
pub struct ReservationService<S> {
    store: Arc<S>,
    tokens: Arc<TokenService<S>>,
}

// Manual impl: the derive would demand `S: Clone`, but only the `Arc`
// handles are cloned.
impl<S> Clone for ReservationService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<S: BookingStore> ReservationService<S> {
    /// Creates a new `ReservationService`.
    #[must_use]
    pub fn new(store: Arc<S>, tokens: Arc<TokenService<S>>) -> Self {
        Self { store, tokens }
    }

    /// Admits one applicant into one slot, consuming the token.
    ///
    /// The capacity check and the reservation insert happen inside one
    /// per-slot-serialized atomic unit in the store, together with the
    /// token redemption; see
    /// [`BookingStore::admit`](crate::persistence::BookingStore::admit).
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidToken`] — token missing, used, expired,
    ///   or consumed by a concurrent admission.
    /// - [`BookingError::SlotNotAuthorized`] — token does not cover the
    ///   requested slot.
    /// - [`BookingError::SlotNotFound`] — slot deleted since validation.
    /// - [`BookingError::CapacityExceeded`] — no seat left.
    /// - [`BookingError::TransientFailure`] — lock wait or storage fault;
    ///   nothing was persisted, safe to retry.
    pub async fn admit(
        &self,
        value: TokenValue,
        slot_id: SlotId,
        applicant: &Applicant,
    ) -> Result<AdmittedReservation, BookingError> {
        let validated = self
            .tokens
            .validate(value)
            .await?
            .ok_or(BookingError::InvalidToken)?;

        if !validated.covers(slot_id) {
            return Err(BookingError::SlotNotAuthorized(*slot_id.as_uuid()));
        }

        let (reservation, slot) = self.store.admit(value, slot_id, applicant).await?;

        tracing::info!(
            reservation_id = %reservation.id,
            %slot_id,
            "reservation admitted"
        );

        Ok(AdmittedReservation { reservation, slot })
    }

    /// Lists open slots for a token, grouped by UTC calendar date.
    ///
    /// Advisory only: the listing may be stale by the time the applicant
    /// books, and the admission path resolves that with
    /// [`BookingError::CapacityExceeded`].
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidToken`] — token missing, used, expired.
    /// - [`BookingError::InvalidRequest`] — token has no live slots.
    pub async fn list_available(
        &self,
        value: TokenValue,
    ) -> Result<AvailabilityOverview, BookingError> {
        let validated = self
            .tokens
            .validate(value)
            .await?
            .ok_or(BookingError::InvalidToken)?;

        if validated.slots.is_empty() {
            return Err(BookingError::InvalidRequest(
                "no slots are linked to this token".to_string(),
            ));
        }

        Ok(AvailabilityOverview {
            days: group_by_date(&validated.slots),
            recipient_contact: validated.token.recipient_contact,
        })
    }

    /// Lists a slot's reservations for its owner, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SlotNotFound`] when the slot is absent or
    /// foreign, [`BookingError::PersistenceError`] on storage failure.
    pub async fn list_for_slot(
        &self,
        owner_id: OwnerId,
        slot_id: SlotId,
    ) -> Result<Vec<Reservation>, BookingError> {
        match self.store.get_slot(slot_id).await? {
            Some(with_count) if with_count.slot.owner_id == owner_id => {}
            _ => return Err(BookingError::SlotNotFound(*slot_id.as_uuid())),
        }
        self.store.list_reservations(slot_id).await
    }

    /// Fetches one reservation with its slot, scoped to the owner.
    ///
    /// A reservation in someone else's slot reads as missing rather than
    /// as a distinct authorization failure.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::ReservationNotFound`] when absent or
    /// foreign, [`BookingError::PersistenceError`] on storage failure.
    pub async fn get(
        &self,
        owner_id: OwnerId,
        id: ReservationId,
    ) -> Result<(Reservation, Slot), BookingError> {
        match self.store.get_reservation(id).await? {
            Some((reservation, slot)) if slot.owner_id == owner_id => Ok((reservation, slot)),
            _ => Err(BookingError::ReservationNotFound(*id.as_uuid())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AccessToken, Slot};
    use crate::notify::{LogNotifier, NotificationDispatcher};
    use crate::persistence::MemoryStore;
    use chrono::{TimeDelta, Utc};

    struct Fixture {
        store: Arc<MemoryStore>,
        tokens: Arc<TokenService<MemoryStore>>,
        service: ReservationService<MemoryStore>,
    }

    fn make_fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = NotificationDispatcher::spawn(LogNotifier::new(), 64);
        let tokens = Arc::new(TokenService::new(
            Arc::clone(&store),
            dispatcher,
            7,
            "http://localhost:5173".to_string(),
        ));
        let service = ReservationService::new(Arc::clone(&store), Arc::clone(&tokens));
        Fixture {
            store,
            tokens,
            service,
        }
    }

    fn make_owner() -> OwnerId {
        OwnerId::from_uuid(uuid::Uuid::new_v4())
    }

    async fn seed_slot(store: &MemoryStore, owner: OwnerId, capacity: i32) -> Slot {
        let start = Utc::now() + TimeDelta::days(1);
        let slot = Slot::new(owner, start, start + TimeDelta::minutes(30), capacity);
        let Ok(()) = store.insert_slot(&slot).await else {
            panic!("slot insert failed");
        };
        slot
    }

    fn applicant(n: usize) -> Applicant {
        Applicant {
            name: format!("applicant {n}"),
            contact: format!("applicant{n}@example.com"),
        }
    }

    #[tokio::test]
    async fn admit_persists_one_reservation() {
        let fx = make_fixture();
        let owner = make_owner();
        let slot = seed_slot(&fx.store, owner, 3).await;
        let Ok(issued) = fx.tokens.issue(&[slot.id], "pat@example.com").await else {
            panic!("issuance failed");
        };

        let Ok(admitted) = fx.service.admit(issued.token, slot.id, &applicant(0)).await else {
            panic!("admission failed");
        };
        assert_eq!(admitted.reservation.slot_id, slot.id);
        assert_eq!(admitted.reservation.status, "confirmed");
        assert_eq!(admitted.slot.id, slot.id);

        let Ok(reservations) = fx.service.list_for_slot(owner, slot.id).await else {
            panic!("listing failed");
        };
        assert_eq!(reservations.len(), 1);
    }

    #[tokio::test]
    async fn admit_rejects_uncovered_slot() {
        let fx = make_fixture();
        let owner = make_owner();
        let covered = seed_slot(&fx.store, owner, 3).await;
        let uncovered = seed_slot(&fx.store, owner, 3).await;
        let Ok(issued) = fx.tokens.issue(&[covered.id], "pat@example.com").await else {
            panic!("issuance failed");
        };

        let result = fx.service.admit(issued.token, uncovered.id, &applicant(0)).await;
        assert!(matches!(result, Err(BookingError::SlotNotAuthorized(_))));
    }

    #[tokio::test]
    async fn admit_rejects_unknown_token() {
        let fx = make_fixture();
        let owner = make_owner();
        let slot = seed_slot(&fx.store, owner, 3).await;

        let result = fx
            .service
            .admit(TokenValue::generate(), slot.id, &applicant(0))
            .await;
        assert!(matches!(result, Err(BookingError::InvalidToken)));
    }

    #[tokio::test]
    async fn token_is_single_use() {
        let fx = make_fixture();
        let owner = make_owner();
        let slot = seed_slot(&fx.store, owner, 3).await;
        let Ok(issued) = fx.tokens.issue(&[slot.id], "pat@example.com").await else {
            panic!("issuance failed");
        };

        let Ok(_) = fx.service.admit(issued.token, slot.id, &applicant(0)).await else {
            panic!("first admission failed");
        };

        // The redeemed token no longer validates, so a second booking
        // attempt through the same link is rejected.
        let Ok(validated) = fx.tokens.validate(issued.token).await else {
            panic!("validate errored");
        };
        assert!(validated.is_none());

        let result = fx.service.admit(issued.token, slot.id, &applicant(1)).await;
        assert!(matches!(result, Err(BookingError::InvalidToken)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_admissions_never_exceed_capacity() {
        let fx = make_fixture();
        let owner = make_owner();
        let slot = seed_slot(&fx.store, owner, 3).await;

        // Ten applicants, each holding their own link to the same slot,
        // race for three seats.
        let mut values = Vec::new();
        for _ in 0..10 {
            let Ok(issued) = fx.tokens.issue(&[slot.id], "pat@example.com").await else {
                panic!("issuance failed");
            };
            values.push(issued.token);
        }

        let mut handles = Vec::new();
        for (n, value) in values.into_iter().enumerate() {
            let service = fx.service.clone();
            let slot_id = slot.id;
            handles.push(tokio::spawn(async move {
                service.admit(value, slot_id, &applicant(n)).await
            }));
        }

        let mut admitted = 0;
        let mut capacity_rejections = 0;
        for handle in handles {
            let Ok(result) = handle.await else {
                panic!("admission task panicked");
            };
            match result {
                Ok(_) => admitted += 1,
                Err(BookingError::CapacityExceeded) => capacity_rejections += 1,
                Err(other) => panic!("unexpected admission outcome: {other}"),
            }
        }

        assert_eq!(admitted, 3);
        assert_eq!(capacity_rejections, 7);

        let Ok(reservations) = fx.service.list_for_slot(owner, slot.id).await else {
            panic!("listing failed");
        };
        assert_eq!(reservations.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_redemptions_of_one_token_admit_once() {
        let fx = make_fixture();
        let owner = make_owner();
        let slot = seed_slot(&fx.store, owner, 10).await;
        let Ok(issued) = fx.tokens.issue(&[slot.id], "pat@example.com").await else {
            panic!("issuance failed");
        };

        let mut handles = Vec::new();
        for n in 0..8 {
            let service = fx.service.clone();
            let slot_id = slot.id;
            let value = issued.token;
            handles.push(tokio::spawn(async move {
                service.admit(value, slot_id, &applicant(n)).await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            let Ok(result) = handle.await else {
                panic!("admission task panicked");
            };
            match result {
                Ok(_) => admitted += 1,
                Err(BookingError::InvalidToken) => {}
                Err(other) => panic!("unexpected admission outcome: {other}"),
            }
        }

        // Exactly one racer redeemed the token; the seat count matches.
        assert_eq!(admitted, 1);
        let Ok(reservations) = fx.service.list_for_slot(owner, slot.id).await else {
            panic!("listing failed");
        };
        assert_eq!(reservations.len(), 1);
    }

    #[tokio::test]
    async fn admissions_on_different_slots_are_independent() {
        let fx = make_fixture();
        let owner = make_owner();
        let slot_a = seed_slot(&fx.store, owner, 1).await;
        let slot_b = seed_slot(&fx.store, owner, 1).await;

        let Ok(token_a) = fx.tokens.issue(&[slot_a.id], "a@example.com").await else {
            panic!("issuance failed");
        };
        let Ok(token_b) = fx.tokens.issue(&[slot_b.id], "b@example.com").await else {
            panic!("issuance failed");
        };

        let service_a = fx.service.clone();
        let service_b = fx.service.clone();
        let applicant_a = applicant(0);
        let applicant_b = applicant(1);
        let (res_a, res_b) = tokio::join!(
            service_a.admit(token_a.token, slot_a.id, &applicant_a),
            service_b.admit(token_b.token, slot_b.id, &applicant_b),
        );
        assert!(res_a.is_ok());
        assert!(res_b.is_ok());
    }

    #[tokio::test]
    async fn list_available_groups_open_slots() {
        let fx = make_fixture();
        let owner = make_owner();
        let open = seed_slot(&fx.store, owner, 2).await;
        let full = seed_slot(&fx.store, owner, 1).await;

        // Fill the second slot.
        let filler = AccessToken::issue("x@example.com".to_string(), 7);
        let Ok(()) = fx.store.insert_token(&filler, &[full.id]).await else {
            panic!("token insert failed");
        };
        let Ok(_) = fx.store.admit(filler.token, full.id, &applicant(9)).await else {
            panic!("fill admission failed");
        };

        let Ok(issued) = fx
            .tokens
            .issue(&[open.id, full.id], "pat@example.com")
            .await
        else {
            panic!("issuance failed");
        };

        let Ok(overview) = fx.service.list_available(issued.token).await else {
            panic!("listing failed");
        };
        assert_eq!(overview.recipient_contact, "pat@example.com");
        let slot_ids: Vec<SlotId> = overview
            .days
            .iter()
            .flat_map(|d| d.slots.iter().map(|s| s.id))
            .collect();
        assert_eq!(slot_ids, vec![open.id]);
    }

    #[tokio::test]
    async fn list_available_rejects_used_token() {
        let fx = make_fixture();
        let owner = make_owner();
        let slot = seed_slot(&fx.store, owner, 3).await;
        let Ok(issued) = fx.tokens.issue(&[slot.id], "pat@example.com").await else {
            panic!("issuance failed");
        };
        let Ok(_) = fx.service.admit(issued.token, slot.id, &applicant(0)).await else {
            panic!("admission failed");
        };

        let result = fx.service.list_available(issued.token).await;
        assert!(matches!(result, Err(BookingError::InvalidToken)));
    }

    #[tokio::test]
    async fn reservation_lookup_is_owner_scoped() {
        let fx = make_fixture();
        let owner = make_owner();
        let slot = seed_slot(&fx.store, owner, 3).await;
        let Ok(issued) = fx.tokens.issue(&[slot.id], "pat@example.com").await else {
            panic!("issuance failed");
        };
        let Ok(admitted) = fx.service.admit(issued.token, slot.id, &applicant(0)).await else {
            panic!("admission failed");
        };

        let Ok((reservation, fetched_slot)) =
            fx.service.get(owner, admitted.reservation.id).await
        else {
            panic!("owner lookup failed");
        };
        assert_eq!(reservation.id, admitted.reservation.id);
        assert_eq!(fetched_slot.id, slot.id);

        let result = fx.service.get(make_owner(), admitted.reservation.id).await;
        assert!(matches!(result, Err(BookingError::ReservationNotFound(_))));
    }
}
