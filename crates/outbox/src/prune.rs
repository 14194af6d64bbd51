//! Storage reclamation for delivered events past their retention
//! window.
//!
//! Deletes in capped chunks with a brief pause between them so a large
//! backlog never holds long row locks or saturates the store. Only
//! rows with `delivered_at` set are ever considered; undelivered
//! events are retained regardless of age.

use std::time::{Duration, Instant};

use relay_db::repositories::OutboxRepo;
use relay_db::DbPool;
use serde::Serialize;

use crate::error::OutboxError;

/// Default retention for delivered events.
pub const DEFAULT_RETENTION_HOURS: i64 = 48;

/// Default cap on rows removed per invocation.
pub const DEFAULT_MAX_BATCH_SIZE: i64 = 1000;

/// Rows deleted per chunk within an invocation.
const CHUNK_SIZE: i64 = 500;

/// Pause between chunks.
const CHUNK_PAUSE: Duration = Duration::from_millis(100);

/// Result of one pruning invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    pub deleted_count: u64,
    pub execution_time_ms: u64,
    /// Age of the oldest delivered event still retained, if any.
    pub oldest_remaining_delivered_age_hours: Option<f64>,
}

/// Reclaims storage for delivered events.
pub struct OutboxPruner {
    pool: DbPool,
}

impl OutboxPruner {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Delete delivered events older than `retention_hours`, up to
    /// `max_batch_size` rows, in paced chunks.
    ///
    /// Idempotent: with no newly eligible rows a second run is a no-op.
    pub async fn prune(
        &self,
        retention_hours: i64,
        max_batch_size: i64,
    ) -> Result<PruneReport, OutboxError> {
        let started = Instant::now();
        let mut deleted_count: u64 = 0;

        loop {
            let remaining = max_batch_size - deleted_count as i64;
            if remaining <= 0 {
                break;
            }
            let take = remaining.min(CHUNK_SIZE);
            let chunk = OutboxRepo::delete_delivered_chunk(&self.pool, retention_hours, take).await?;
            deleted_count += chunk;
            // A short chunk means the backlog is drained; pause only
            // between chunks, never after the last one.
            if (chunk as i64) < take || deleted_count as i64 >= max_batch_size {
                break;
            }
            tokio::time::sleep(CHUNK_PAUSE).await;
        }

        let oldest_remaining_delivered_age_hours =
            OutboxRepo::oldest_delivered_age_hours(&self.pool).await?;

        if deleted_count > 0 {
            tracing::info!(deleted_count, retention_hours, "Pruned delivered outbox events");
        } else {
            tracing::debug!(retention_hours, "No delivered outbox events eligible for pruning");
        }

        Ok(PruneReport {
            deleted_count,
            execution_time_ms: started.elapsed().as_millis() as u64,
            oldest_remaining_delivered_age_hours,
        })
    }
}
