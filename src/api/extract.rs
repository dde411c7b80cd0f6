//! Request extractors for the admin surface.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::OwnerId;
use crate::error::BookingError;

/// Header carrying the authenticated owner identity.
///
/// Authentication itself is out of scope: an upstream auth layer is
/// expected to verify the counselor and inject this header. The service
/// only parses and scopes by it.
pub const OWNER_HEADER: &str = "x-owner-id";

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = BookingError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| uuid::Uuid::parse_str(value).ok())
            .map(OwnerId::from_uuid)
            .ok_or_else(|| {
                BookingError::InvalidRequest(format!("missing or invalid {OWNER_HEADER} header"))
            })
    }
}
