//! Route definitions.

pub mod health;
pub mod outbox;

use axum::Router;

use crate::state::AppState;

/// All internal trigger routes, mounted under `/internal`.
pub fn internal_routes() -> Router<AppState> {
    Router::new().nest("/outbox", outbox::router())
}
