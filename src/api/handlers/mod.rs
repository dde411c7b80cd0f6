//! REST endpoint handlers organized by resource.

pub mod booking;
pub mod reservations;
pub mod slots;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(slots::routes())
        .merge(booking::routes())
        .merge(reservations::routes())
}
