//! Outbox event entity model.

use relay_core::types::{DbId, OrgId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `outbox_event` table.
///
/// One row per state change requiring downstream notification. Rows are
/// written by upstream mutation logic; the processor only mutates the
/// delivery bookkeeping fields (`delivered_at`, `delivery_attempts`,
/// `last_error`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutboxEvent {
    pub id: DbId,
    pub organization_id: OrgId,
    pub event_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<uuid::Uuid>,
    /// Opaque payload; may contain internal-only fields and must not
    /// leave the trust boundary unsanitized.
    pub event_data: serde_json::Value,
    pub created_at: Timestamp,
    pub delivered_at: Option<Timestamp>,
    pub delivery_attempts: i32,
    pub last_error: Option<String>,
}

impl OutboxEvent {
    /// Whether this event has been successfully broadcast at least once.
    pub fn is_delivered(&self) -> bool {
        self.delivered_at.is_some()
    }
}

/// Insert DTO for new outbox events (upstream writers and tests).
#[derive(Debug, Clone)]
pub struct CreateOutboxEvent {
    pub organization_id: OrgId,
    pub event_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<uuid::Uuid>,
    pub event_data: serde_json::Value,
}
