//! Repository for the `dead_letter_entry` table.

use relay_core::types::OrgId;
use sqlx::PgPool;

use crate::models::dead_letter::DeadLetterEntry;

/// Default diagnostic when an exhausted event never recorded an error.
const DEFAULT_LAST_ERROR: &str = "max delivery attempts exceeded";

/// Column list for `dead_letter_entry` queries.
const COLUMNS: &str = "original_event_id, organization_id, event_type, entity_type, entity_id, \
     event_data, delivery_attempts, last_error, failed_at";

/// Provides dead-letter migration and inspection.
pub struct DeadLetterRepo;

impl DeadLetterRepo {
    /// Move one capped batch of exhausted events into the dead-letter
    /// table, returning the organization id of each moved row.
    ///
    /// A single data-modifying CTE deletes the outbox rows and inserts
    /// the dead-letter rows, so both happen atomically: an event is
    /// never present in both tables, nor lost from both. Events created
    /// within the last `grace_minutes` are skipped to avoid racing an
    /// in-flight retry.
    pub async fn migrate_batch(
        pool: &PgPool,
        max_delivery_attempts: i32,
        grace_minutes: i64,
        limit: i64,
    ) -> Result<Vec<OrgId>, sqlx::Error> {
        let moved: Vec<OrgId> = sqlx::query_scalar(
            "WITH eligible AS ( \
                 SELECT id FROM outbox_event \
                 WHERE delivery_attempts >= $1 \
                   AND delivered_at IS NULL \
                   AND created_at < NOW() - ($2 * INTERVAL '1 minute') \
                 ORDER BY id \
                 LIMIT $3 \
             ), \
             moved AS ( \
                 DELETE FROM outbox_event o \
                 USING eligible e \
                 WHERE o.id = e.id \
                 RETURNING o.* \
             ) \
             INSERT INTO dead_letter_entry \
                 (original_event_id, organization_id, event_type, entity_type, \
                  entity_id, event_data, delivery_attempts, last_error) \
             SELECT id, organization_id, event_type, entity_type, \
                    entity_id, event_data, delivery_attempts, \
                    COALESCE(last_error, $4) \
             FROM moved \
             RETURNING organization_id",
        )
        .bind(max_delivery_attempts)
        .bind(grace_minutes)
        .bind(limit)
        .bind(DEFAULT_LAST_ERROR)
        .fetch_all(pool)
        .await?;

        if !moved.is_empty() {
            tracing::debug!(moved = moved.len(), "Dead-letter batch migrated");
        }
        Ok(moved)
    }

    /// List dead-letter entries for a tenant, newest failures first.
    pub async fn list_for_org(
        pool: &PgPool,
        organization_id: OrgId,
        limit: i64,
    ) -> Result<Vec<DeadLetterEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dead_letter_entry \
             WHERE organization_id = $1 \
             ORDER BY failed_at DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, DeadLetterEntry>(&query)
            .bind(organization_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Count dead-letter entries for a tenant.
    pub async fn count_for_org(
        pool: &PgPool,
        organization_id: OrgId,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM dead_letter_entry WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }
}
