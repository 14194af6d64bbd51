//! Processor cursor entity model.

use relay_core::types::{DbId, OrgId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `processor_cursor` table.
///
/// High-water mark per (processor name, organization): the id of the
/// most recently confirmed event. Starts at the sentinel `0` and only
/// ever moves forward.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProcessorCursor {
    pub processor_name: String,
    pub organization_id: OrgId,
    pub last_processed_event_id: DbId,
    pub last_processed_at: Timestamp,
    pub updated_at: Timestamp,
}
