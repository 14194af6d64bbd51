//! Dead-letter migration for events that exhausted their retry budget.
//!
//! Moves undelivered events with `delivery_attempts >= max` into the
//! dead-letter table, atomically per batch, skipping events younger
//! than a grace period so an in-flight retry is never raced. Returns
//! the distinct affected tenants for downstream alerting.

use std::collections::BTreeSet;

use relay_core::types::OrgId;
use relay_db::repositories::DeadLetterRepo;
use relay_db::DbPool;
use serde::Serialize;

use crate::error::OutboxError;

/// Default retry budget before an event is dead-lettered.
pub const DEFAULT_MAX_DELIVERY_ATTEMPTS: i32 = 5;

/// Events created within this window are never migrated, even when
/// exhausted, to avoid racing an in-flight retry.
const GRACE_MINUTES: i64 = 5;

/// Rows migrated per batch statement.
const BATCH_SIZE: i64 = 100;

/// Result of one migration invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub moved_count: u64,
    /// Distinct tenants with newly dead-lettered events.
    pub affected_tenants: Vec<OrgId>,
}

/// Moves exhausted events into the dead-letter store.
pub struct DeadLetterMigrator {
    pool: DbPool,
}

impl DeadLetterMigrator {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Migrate every eligible event, batch by batch.
    ///
    /// Each batch is a single atomic delete-and-insert, so an event is
    /// never present in both stores, nor lost from both. Safe to run
    /// concurrently with the processor: the predicates are disjoint
    /// (undelivered-exhausted vs. deliverable).
    pub async fn migrate(
        &self,
        max_delivery_attempts: i32,
    ) -> Result<MigrationReport, OutboxError> {
        let mut moved_count: u64 = 0;
        let mut affected: BTreeSet<OrgId> = BTreeSet::new();

        loop {
            let moved = DeadLetterRepo::migrate_batch(
                &self.pool,
                max_delivery_attempts,
                GRACE_MINUTES,
                BATCH_SIZE,
            )
            .await?;
            if moved.is_empty() {
                break;
            }
            moved_count += moved.len() as u64;
            affected.extend(moved);
        }

        if moved_count > 0 {
            tracing::warn!(
                moved_count,
                affected_tenants = affected.len(),
                max_delivery_attempts,
                "Moved exhausted events to the dead-letter store"
            );
        }

        Ok(MigrationReport {
            moved_count,
            affected_tenants: affected.into_iter().collect(),
        })
    }
}
