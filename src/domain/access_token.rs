//! Single-use booking access token.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::ids::SlotId;
use super::slot::SlotWithCount;
use super::token_value::TokenValue;

/// A time-bounded, single-use capability granting booking rights over one
/// or more slots of a single owner.
///
/// `used` is monotonic: it flips from `false` to `true` exactly once, and
/// only inside the same atomic unit as the admission that consumes the
/// token. Tokens are never physically deleted by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Opaque token value; also the token's identity.
    pub token: TokenValue,
    /// Free-form contact of the link recipient (typically an email address).
    pub recipient_contact: String,
    /// Instant after which the token stops validating.
    pub expires_at: DateTime<Utc>,
    /// Whether the token has been consumed by a successful admission.
    pub used: bool,
    /// Issuance timestamp.
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    /// Creates a fresh unused token expiring `ttl_days` from now.
    #[must_use]
    pub fn issue(recipient_contact: String, ttl_days: i64) -> Self {
        let now = Utc::now();
        Self {
            token: TokenValue::generate(),
            recipient_contact,
            expires_at: now + TimeDelta::days(ttl_days),
            used: false,
            created_at: now,
        }
    }

    /// Whether the token has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A token that passed validation, together with its live associated slots.
///
/// Slot associations are resolved at validation time, not cached from
/// issuance: a slot changed by management operations since the link was
/// issued is reflected here with its current window and count.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    /// The validated token.
    pub token: AccessToken,
    /// Currently-existing slots the token covers, with reservation counts.
    pub slots: Vec<SlotWithCount>,
}

impl ValidatedToken {
    /// Whether the token covers the given slot.
    #[must_use]
    pub fn covers(&self, slot_id: SlotId) -> bool {
        self.slots.iter().any(|s| s.slot.id == slot_id)
    }
}

/// Result of link issuance, returned to the admin caller.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// The generated token value.
    pub token: TokenValue,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// Booking URL constructed for the recipient.
    pub booking_url: String,
    /// Number of slots the token covers.
    pub slot_count: usize,
}
