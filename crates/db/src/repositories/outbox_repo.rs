//! Repository for the `outbox_event` table.

use relay_core::types::{DbId, OrgId};
use sqlx::PgPool;

use crate::models::outbox_event::{CreateOutboxEvent, OutboxEvent};

/// Column list for `outbox_event` queries.
const COLUMNS: &str = "id, organization_id, event_type, entity_type, entity_id, \
     event_data, created_at, delivered_at, delivery_attempts, last_error";

/// Provides read/write operations for outbox events.
pub struct OutboxRepo;

impl OutboxRepo {
    /// Insert a new pending event, returning the generated ID.
    ///
    /// In production rows arrive from upstream mutation logic; this is
    /// the equivalent application-level writer.
    pub async fn insert(pool: &PgPool, event: &CreateOutboxEvent) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO outbox_event \
                (organization_id, event_type, entity_type, entity_id, event_data) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(event.organization_id)
        .bind(&event.event_type)
        .bind(event.entity_type.as_deref())
        .bind(event.entity_id)
        .bind(&event.event_data)
        .fetch_one(pool)
        .await
    }

    /// Fetch the next batch of deliverable events for a tenant.
    ///
    /// Returns undelivered events with id strictly greater than
    /// `after_id` and fewer than `max_attempts` delivery attempts,
    /// ordered ascending by id.
    pub async fn fetch_batch(
        pool: &PgPool,
        organization_id: OrgId,
        after_id: DbId,
        limit: i64,
        max_attempts: i32,
    ) -> Result<Vec<OutboxEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM outbox_event \
             WHERE organization_id = $1 \
               AND id > $2 \
               AND delivered_at IS NULL \
               AND delivery_attempts < $3 \
             ORDER BY id ASC \
             LIMIT $4"
        );
        sqlx::query_as::<_, OutboxEvent>(&query)
            .bind(organization_id)
            .bind(after_id)
            .bind(max_attempts)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Mark an event as delivered after a successful broadcast.
    ///
    /// Conditional on `delivered_at IS NULL` so `delivered_at` is set
    /// exactly once. Also counts the attempt. Returns `true` if the row
    /// was updated, `false` if it was missing or already delivered.
    pub async fn mark_delivered(
        pool: &PgPool,
        organization_id: OrgId,
        event_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE outbox_event \
             SET delivered_at = NOW(), \
                 delivery_attempts = delivery_attempts + 1, \
                 last_error = NULL \
             WHERE id = $1 AND organization_id = $2 AND delivered_at IS NULL",
        )
        .bind(event_id)
        .bind(organization_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a failed delivery attempt.
    ///
    /// Increments `delivery_attempts` and stores the diagnostic message.
    pub async fn mark_failed(
        pool: &PgPool,
        organization_id: OrgId,
        event_id: DbId,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE outbox_event \
             SET delivery_attempts = delivery_attempts + 1, \
                 last_error = $3 \
             WHERE id = $1 AND organization_id = $2 AND delivered_at IS NULL",
        )
        .bind(event_id)
        .bind(organization_id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Count undelivered events for a tenant (backlog depth).
    pub async fn pending_count(
        pool: &PgPool,
        organization_id: OrgId,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM outbox_event \
             WHERE organization_id = $1 AND delivered_at IS NULL",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Fetch a single event by id within a tenant.
    pub async fn get(
        pool: &PgPool,
        organization_id: OrgId,
        event_id: DbId,
    ) -> Result<Option<OutboxEvent>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM outbox_event WHERE id = $1 AND organization_id = $2");
        sqlx::query_as::<_, OutboxEvent>(&query)
            .bind(event_id)
            .bind(organization_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete delivered events older than the retention cutoff, in one
    /// capped chunk. Returns the number of rows removed.
    ///
    /// The `delivered_at IS NOT NULL` predicate means undelivered rows
    /// are never touched, regardless of age.
    pub async fn delete_delivered_chunk(
        pool: &PgPool,
        retention_hours: i64,
        chunk_size: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM outbox_event \
             WHERE id IN ( \
                 SELECT id FROM outbox_event \
                 WHERE delivered_at IS NOT NULL \
                   AND delivered_at < NOW() - ($1 * INTERVAL '1 hour') \
                 ORDER BY id \
                 LIMIT $2 \
             )",
        )
        .bind(retention_hours)
        .bind(chunk_size)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Age in hours of the oldest delivered event still in the table,
    /// or `None` when no delivered events remain.
    pub async fn oldest_delivered_age_hours(pool: &PgPool) -> Result<Option<f64>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXTRACT(EPOCH FROM (NOW() - MIN(delivered_at)))::float8 / 3600.0 \
             FROM outbox_event WHERE delivered_at IS NOT NULL",
        )
        .fetch_one(pool)
        .await
    }
}
