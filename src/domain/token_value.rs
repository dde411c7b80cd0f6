//! Opaque access-token value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The unguessable value of a booking access link.
///
/// Backed by a UUID v4, which carries 122 bits of randomness — enough that
/// token values cannot be enumerated or guessed. The value is the token's
/// identity: there is no separate surrogate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TokenValue(uuid::Uuid);

impl TokenValue {
    /// Generates a fresh random token value.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `TokenValue` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for TokenValue {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for TokenValue {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn generated_values_are_unique() {
        assert_ne!(TokenValue::generate(), TokenValue::generate());
    }

    #[test]
    fn parses_from_display_form() {
        let value = TokenValue::generate();
        let parsed: Result<TokenValue, _> = value.to_string().parse();
        let Ok(parsed) = parsed else {
            panic!("round-trip parse failed");
        };
        assert_eq!(value, parsed);
    }

    #[test]
    fn rejects_garbage() {
        let parsed: Result<TokenValue, _> = "not-a-token".parse();
        assert!(parsed.is_err());
    }
}
