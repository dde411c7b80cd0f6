//! Access-token issuance and validation.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{AccessToken, IssuedToken, SlotId, TokenValue, ValidatedToken};
use crate::error::BookingError;
use crate::notify::{BookingNotice, NotificationDispatcher};
use crate::persistence::BookingStore;

/// Issues and validates single-use booking tokens.
///
/// Issuance validates that all requested slots exist and share one owner,
/// persists the token with its associations atomically, and enqueues a
/// best-effort notification. Validation fails closed: a missing, used, or
/// expired token all yield `None` without distinguishing the reason.
#[derive(Debug)]
pub struct TokenService<S> {
    store: Arc<S>,
    dispatcher: NotificationDispatcher,
    ttl_days: i64,
    booking_base_url: String,
}

// Manual impl: the derive would demand `S: Clone`, but only the `Arc`
// handle is cloned.
impl<S> Clone for TokenService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            dispatcher: self.dispatcher.clone(),
            ttl_days: self.ttl_days,
            booking_base_url: self.booking_base_url.clone(),
        }
    }
}

impl<S: BookingStore> TokenService<S> {
    /// Creates a new `TokenService`.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        dispatcher: NotificationDispatcher,
        ttl_days: i64,
        booking_base_url: String,
    ) -> Self {
        Self {
            store,
            dispatcher,
            ttl_days,
            booking_base_url,
        }
    }

    /// Issues a token covering the given slots for one recipient.
    ///
    /// Nothing is persisted unless every check passes: the token row and
    /// its association rows are written in one atomic unit by the store.
    /// The notification is fire-and-forget — a full queue or failed
    /// delivery never fails the issuance.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidRequest`] — empty slot list.
    /// - [`BookingError::SlotNotFound`] — a requested slot is absent.
    /// - [`BookingError::CrossOwnerViolation`] — slots span owners.
    /// - [`BookingError::PersistenceError`] — storage failure.
    pub async fn issue(
        &self,
        slot_ids: &[SlotId],
        recipient_contact: &str,
    ) -> Result<IssuedToken, BookingError> {
        if slot_ids.is_empty() {
            return Err(BookingError::InvalidRequest(
                "at least one slot is required".to_string(),
            ));
        }

        let mut unique: Vec<SlotId> = Vec::with_capacity(slot_ids.len());
        for id in slot_ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }

        let slots = self.store.fetch_slots(&unique).await?;
        if slots.len() != unique.len() {
            let missing = unique
                .iter()
                .find(|id| !slots.iter().any(|s| s.id == **id))
                .copied()
                .unwrap_or_else(SlotId::new);
            return Err(BookingError::SlotNotFound(*missing.as_uuid()));
        }

        let mut owners = slots.iter().map(|s| s.owner_id);
        if let Some(first) = owners.next() {
            if owners.any(|o| o != first) {
                return Err(BookingError::CrossOwnerViolation);
            }
        }

        let token = AccessToken::issue(recipient_contact.to_string(), self.ttl_days);
        self.store.insert_token(&token, &unique).await?;

        let booking_url = format!("{}/booking?token={}", self.booking_base_url, token.token);

        self.dispatcher.dispatch(BookingNotice {
            recipient_contact: recipient_contact.to_string(),
            booking_url: booking_url.clone(),
            slot_windows: slots.iter().map(|s| (s.start_time, s.end_time)).collect(),
        });

        tracing::info!(slot_count = unique.len(), "access token issued");

        Ok(IssuedToken {
            token: token.token,
            expires_at: token.expires_at,
            booking_url,
            slot_count: unique.len(),
        })
    }

    /// Validates a token value.
    ///
    /// Returns `None` — not an error — when the token does not exist, has
    /// been used, or has expired. On success the token's slot
    /// associations are resolved live, with current reservation counts.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PersistenceError`] on storage failure.
    pub async fn validate(
        &self,
        value: TokenValue,
    ) -> Result<Option<ValidatedToken>, BookingError> {
        let Some((token, slots)) = self.store.fetch_token(value).await? else {
            return Ok(None);
        };

        if token.used {
            return Ok(None);
        }

        if token.is_expired(Utc::now()) {
            return Ok(None);
        }

        Ok(Some(ValidatedToken { token, slots }))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{OwnerId, Slot};
    use crate::notify::LogNotifier;
    use crate::persistence::MemoryStore;
    use chrono::TimeDelta;

    fn make_service(store: Arc<MemoryStore>) -> TokenService<MemoryStore> {
        let dispatcher = NotificationDispatcher::spawn(LogNotifier::new(), 16);
        TokenService::new(
            store,
            dispatcher,
            7,
            "http://localhost:5173".to_string(),
        )
    }

    async fn seed_slot(store: &MemoryStore, owner: OwnerId) -> Slot {
        let start = Utc::now() + TimeDelta::days(1);
        let slot = Slot::new(owner, start, start + TimeDelta::minutes(30), 3);
        let Ok(()) = store.insert_slot(&slot).await else {
            panic!("slot insert failed");
        };
        slot
    }

    #[tokio::test]
    async fn issue_and_validate_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let owner = OwnerId::from_uuid(uuid::Uuid::new_v4());
        let slot = seed_slot(&store, owner).await;

        let Ok(issued) = service.issue(&[slot.id], "pat@example.com").await else {
            panic!("issuance failed");
        };
        assert_eq!(issued.slot_count, 1);
        assert!(issued.booking_url.contains(&issued.token.to_string()));

        let Ok(Some(validated)) = service.validate(issued.token).await else {
            panic!("expected valid token");
        };
        assert!(validated.covers(slot.id));
        assert_eq!(validated.token.recipient_contact, "pat@example.com");
    }

    #[tokio::test]
    async fn issue_rejects_empty_slot_list() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(store);
        let result = service.issue(&[], "pat@example.com").await;
        assert!(matches!(result, Err(BookingError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn issue_rejects_missing_slot_without_persisting() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let owner = OwnerId::from_uuid(uuid::Uuid::new_v4());
        let slot = seed_slot(&store, owner).await;
        let missing = SlotId::new();

        let result = service.issue(&[slot.id, missing], "pat@example.com").await;
        let Err(BookingError::SlotNotFound(id)) = result else {
            panic!("expected SlotNotFound");
        };
        assert_eq!(id, *missing.as_uuid());
    }

    #[tokio::test]
    async fn issue_rejects_cross_owner_slots() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let slot_a = seed_slot(&store, OwnerId::from_uuid(uuid::Uuid::new_v4())).await;
        let slot_b = seed_slot(&store, OwnerId::from_uuid(uuid::Uuid::new_v4())).await;

        let result = service.issue(&[slot_a.id, slot_b.id], "pat@example.com").await;
        assert!(matches!(result, Err(BookingError::CrossOwnerViolation)));
    }

    #[tokio::test]
    async fn validate_fails_closed_on_unknown_token() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(store);
        let Ok(result) = service.validate(TokenValue::generate()).await else {
            panic!("validate errored");
        };
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn validate_expiry_boundary() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let owner = OwnerId::from_uuid(uuid::Uuid::new_v4());
        let slot = seed_slot(&store, owner).await;

        let mut expired = AccessToken::issue("pat@example.com".to_string(), 7);
        expired.expires_at = Utc::now() - TimeDelta::seconds(1);
        let Ok(()) = store.insert_token(&expired, &[slot.id]).await else {
            panic!("token insert failed");
        };
        let Ok(result) = service.validate(expired.token).await else {
            panic!("validate errored");
        };
        assert!(result.is_none());

        let mut fresh = AccessToken::issue("pat@example.com".to_string(), 7);
        fresh.expires_at = Utc::now() + TimeDelta::seconds(1);
        let Ok(()) = store.insert_token(&fresh, &[slot.id]).await else {
            panic!("token insert failed");
        };
        let Ok(result) = service.validate(fresh.token).await else {
            panic!("validate errored");
        };
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn duplicate_slot_ids_collapse() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(Arc::clone(&store));
        let owner = OwnerId::from_uuid(uuid::Uuid::new_v4());
        let slot = seed_slot(&store, owner).await;

        let Ok(issued) = service
            .issue(&[slot.id, slot.id, slot.id], "pat@example.com")
            .await
        else {
            panic!("issuance failed");
        };
        assert_eq!(issued.slot_count, 1);
    }
}
