use axum::{routing::post, Router};

use crate::handlers::outbox;
use crate::state::AppState;

/// Outbox trigger routes, mounted under `/internal/outbox`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/process", post(outbox::process))
        .route("/prune", post(outbox::prune))
        .route("/dead-letter", post(outbox::migrate_to_dead_letter))
}
