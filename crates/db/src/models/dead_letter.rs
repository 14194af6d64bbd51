//! Dead-letter entity model.

use relay_core::types::{DbId, OrgId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `dead_letter_entry` table.
///
/// Terminal record of an event that exhausted its delivery budget.
/// Created by the migrator together with the deletion of the original
/// outbox row; an event is never present in both tables.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeadLetterEntry {
    pub original_event_id: DbId,
    pub organization_id: OrgId,
    pub event_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<uuid::Uuid>,
    pub event_data: serde_json::Value,
    pub delivery_attempts: i32,
    pub last_error: String,
    pub failed_at: Timestamp,
}
