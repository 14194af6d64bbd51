//! Repository for the `processor_cursor` table.

use relay_core::types::{DbId, OrgId};
use sqlx::PgPool;

use crate::models::processor_cursor::ProcessorCursor;

/// Column list for `processor_cursor` queries.
const COLUMNS: &str =
    "processor_name, organization_id, last_processed_event_id, last_processed_at, updated_at";

/// Provides cursor persistence for batch processors.
pub struct CursorRepo;

impl CursorRepo {
    /// Load the cursor for a (processor, organization) pair, creating it
    /// lazily at the sentinel position `0` on first use.
    pub async fn get_or_create(
        pool: &PgPool,
        processor_name: &str,
        organization_id: OrgId,
    ) -> Result<ProcessorCursor, sqlx::Error> {
        sqlx::query(
            "INSERT INTO processor_cursor (processor_name, organization_id) \
             VALUES ($1, $2) \
             ON CONFLICT (processor_name, organization_id) DO NOTHING",
        )
        .bind(processor_name)
        .bind(organization_id)
        .execute(pool)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM processor_cursor \
             WHERE processor_name = $1 AND organization_id = $2"
        );
        sqlx::query_as::<_, ProcessorCursor>(&query)
            .bind(processor_name)
            .bind(organization_id)
            .fetch_one(pool)
            .await
    }

    /// Advance the cursor to `event_id`.
    ///
    /// `GREATEST` keeps `last_processed_event_id` monotonically
    /// non-decreasing even if invocations race or replay.
    pub async fn advance(
        pool: &PgPool,
        processor_name: &str,
        organization_id: OrgId,
        event_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE processor_cursor \
             SET last_processed_event_id = GREATEST(last_processed_event_id, $3), \
                 last_processed_at = NOW(), \
                 updated_at = NOW() \
             WHERE processor_name = $1 AND organization_id = $2",
        )
        .bind(processor_name)
        .bind(organization_id)
        .bind(event_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
