//! Trust-boundary sanitizer for outgoing events.
//!
//! Deny-by-default: [`PublicEvent`] enumerates the only fields allowed
//! past the boundary. The raw `event_data` payload and `last_error`
//! diagnostics stay inside — they may carry internal or
//! business-sensitive content.

use relay_core::types::{DbId, Timestamp};
use relay_db::models::OutboxEvent;
use serde::{Deserialize, Serialize};

/// The restricted projection of an outbox event that subscribers see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicEvent {
    /// Outbox event identifier; subscribers use it to deduplicate,
    /// since delivery is at-least-once.
    pub id: DbId,
    /// Symbolic tag, e.g. `"job_completed"`.
    pub event_type: String,
    /// Optional pointer to the business record that changed.
    pub entity_type: Option<String>,
    pub entity_id: Option<uuid::Uuid>,
    /// When the event was recorded.
    pub created_at: Timestamp,
}

/// Project an outbox event onto its public shape.
pub fn sanitize(event: &OutboxEvent) -> PublicEvent {
    PublicEvent {
        id: event.id,
        event_type: event.event_type.clone(),
        entity_type: event.entity_type.clone(),
        entity_id: event.entity_id,
        created_at: event.created_at,
    }
}
