//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::persistence::PostgresStore;
use crate::service::{ReservationService, SlotService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Slot management and link issuance.
    pub slots: Arc<SlotService<PostgresStore>>,
    /// Public booking path and reservation queries.
    pub reservations: Arc<ReservationService<PostgresStore>>,
}
