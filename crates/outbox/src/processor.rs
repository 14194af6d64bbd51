//! The batch processor: the control loop that drains one tenant's
//! outbox within a bounded execution window.
//!
//! Per invocation: acquire the tenant lock, load (or lazily create) the
//! cursor, then pull bounded batches of undelivered events, sanitize
//! and broadcast each in id order, and advance the cursor past the last
//! success. The loop self-terminates before the invocation's hard
//! deadline so the cursor is always left pointing at a fully committed
//! event and the next invocation resumes cleanly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use relay_core::types::{DbId, OrgId};
use relay_db::models::OutboxEvent;
use relay_db::repositories::{CursorRepo, OutboxRepo};
use relay_db::DbPool;
use serde::Serialize;

use crate::broadcast::Broadcaster;
use crate::error::OutboxError;
use crate::lock::TenantLock;
use crate::rate_limit::RateLimiter;
use crate::sanitize::sanitize;

/// Default number of events fetched per batch.
const DEFAULT_BATCH_SIZE: i64 = 100;

/// Default retry budget before an event is eligible for dead-lettering.
const DEFAULT_MAX_ATTEMPTS: i32 = 5;

/// Default wall-clock budget for one invocation.
const DEFAULT_INVOCATION_BUDGET_SECS: u64 = 60;

/// Buffer reserved before the hard timeout for graceful wind-down.
const DEFAULT_DEADLINE_BUFFER_SECS: u64 = 5;

/// Default processor name used as the cursor/lock scope.
const DEFAULT_PROCESSOR_NAME: &str = "outbox-broadcaster";

/// Tunables for the batch processor.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Cursor and lock scope; two processors with different names work
    /// the same outbox independently.
    pub processor_name: String,
    /// Events fetched per batch.
    pub batch_size: i64,
    /// Events with this many attempts are left for the DLQ migrator.
    pub max_attempts: i32,
    /// Wall-clock budget for one invocation.
    pub invocation_budget: Duration,
    /// Reserved wind-down time subtracted from the budget.
    pub deadline_buffer: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            processor_name: DEFAULT_PROCESSOR_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            invocation_budget: Duration::from_secs(DEFAULT_INVOCATION_BUDGET_SECS),
            deadline_buffer: Duration::from_secs(DEFAULT_DEADLINE_BUFFER_SECS),
        }
    }
}

impl ProcessorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default              |
    /// |--------------------------------|----------------------|
    /// | `OUTBOX_PROCESSOR_NAME`        | `outbox-broadcaster` |
    /// | `OUTBOX_BATCH_SIZE`            | `100`                |
    /// | `OUTBOX_MAX_ATTEMPTS`          | `5`                  |
    /// | `OUTBOX_INVOCATION_BUDGET_SECS`| `60`                 |
    /// | `OUTBOX_DEADLINE_BUFFER_SECS`  | `5`                  |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            processor_name: std::env::var("OUTBOX_PROCESSOR_NAME")
                .unwrap_or(defaults.processor_name),
            batch_size: env_parse("OUTBOX_BATCH_SIZE", defaults.batch_size),
            max_attempts: env_parse("OUTBOX_MAX_ATTEMPTS", defaults.max_attempts),
            invocation_budget: Duration::from_secs(env_parse(
                "OUTBOX_INVOCATION_BUDGET_SECS",
                DEFAULT_INVOCATION_BUDGET_SECS,
            )),
            deadline_buffer: Duration::from_secs(env_parse(
                "OUTBOX_DEADLINE_BUFFER_SECS",
                DEFAULT_DEADLINE_BUFFER_SECS,
            )),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Result of one processing invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub organization_id: OrgId,
    /// Events successfully broadcast and marked delivered.
    pub processed: u64,
    /// Whether the tenant's queue was fully drained (caught up).
    pub completed: bool,
    /// Whether the invocation was skipped because another processor
    /// holds the tenant lock. A normal outcome, not an error.
    pub skipped: bool,
    #[serde(skip)]
    pub duration: Duration,
}

impl ProcessOutcome {
    fn skipped(organization_id: OrgId, duration: Duration) -> Self {
        Self {
            organization_id,
            processed: 0,
            completed: false,
            skipped: true,
            duration,
        }
    }
}

/// Outcome of delivering one batch in order.
struct BatchOutcome {
    /// Events broadcast and marked delivered.
    succeeded: u32,
    /// Id of the last successful event, if any.
    last_success: Option<DbId>,
    /// Whether a delivery failed (the batch remainder was left alone).
    failed: bool,
}

/// Drains tenant outboxes: fetch, sanitize, broadcast, record, advance.
pub struct OutboxProcessor {
    pool: DbPool,
    broadcaster: Arc<dyn Broadcaster>,
    rate_limiter: Arc<dyn RateLimiter>,
    config: ProcessorConfig,
}

impl OutboxProcessor {
    pub fn new(
        pool: DbPool,
        broadcaster: Arc<dyn Broadcaster>,
        rate_limiter: Arc<dyn RateLimiter>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            pool,
            broadcaster,
            rate_limiter,
            config,
        }
    }

    /// Run one processing invocation for a tenant.
    ///
    /// Returns immediately with a skipped outcome when another
    /// invocation holds the tenant lock. Store-level errors abort the
    /// invocation; the cursor only ever points at committed events, so
    /// an abort means at-worst reprocessing, never loss.
    pub async fn process_tenant(
        &self,
        organization_id: OrgId,
    ) -> Result<ProcessOutcome, OutboxError> {
        let started = Instant::now();

        let lock = TenantLock::try_acquire(
            &self.pool,
            &self.config.processor_name,
            organization_id,
        )
        .await?;
        let Some(lock) = lock else {
            tracing::info!(
                %organization_id,
                "Another processor is active for this tenant, skipping"
            );
            return Ok(ProcessOutcome::skipped(organization_id, started.elapsed()));
        };

        let result = self.drain(organization_id, started).await;

        if let Err(e) = lock.release().await {
            tracing::warn!(error = %e, %organization_id, "Tenant lock release failed");
        }
        result
    }

    async fn drain(
        &self,
        organization_id: OrgId,
        started: Instant,
    ) -> Result<ProcessOutcome, OutboxError> {
        let cursor = CursorRepo::get_or_create(
            &self.pool,
            &self.config.processor_name,
            organization_id,
        )
        .await?;
        let mut after_id = cursor.last_processed_event_id;

        let deadline = self
            .config
            .invocation_budget
            .saturating_sub(self.config.deadline_buffer);

        let mut processed: u64 = 0;
        let mut completed = false;

        loop {
            if started.elapsed() >= deadline {
                tracing::info!(%organization_id, processed, "Deadline reached, deferring rest");
                break;
            }
            if !self.rate_limiter.allow(organization_id) {
                tracing::info!(%organization_id, processed, "Rate limit reached, deferring rest");
                break;
            }

            let batch = OutboxRepo::fetch_batch(
                &self.pool,
                organization_id,
                after_id,
                self.config.batch_size,
                self.config.max_attempts,
            )
            .await?;
            if batch.is_empty() {
                completed = true;
                break;
            }

            let outcome = self.deliver_batch(organization_id, &batch).await?;

            if let Some(last) = outcome.last_success {
                // Cursor only ever advances to the last success, so a
                // failed event is re-fetched on the next invocation.
                CursorRepo::advance(
                    &self.pool,
                    &self.config.processor_name,
                    organization_id,
                    last,
                )
                .await?;
                after_id = last;
                self.rate_limiter.record(organization_id, outcome.succeeded);
                processed += u64::from(outcome.succeeded);
            }

            // A delivery failure ends the invocation rather than
            // retrying in a tight loop; apparent partial progress must
            // not mask a systemic broadcast outage.
            if outcome.failed || outcome.succeeded == 0 {
                break;
            }
        }

        Ok(ProcessOutcome {
            organization_id,
            processed,
            completed,
            skipped: false,
            duration: started.elapsed(),
        })
    }

    /// Deliver one batch in id order, fail-fast on the first error.
    async fn deliver_batch(
        &self,
        organization_id: OrgId,
        batch: &[OutboxEvent],
    ) -> Result<BatchOutcome, OutboxError> {
        let mut succeeded: u32 = 0;
        let mut last_success: Option<DbId> = None;

        for event in batch {
            let public = sanitize(event);
            match self.broadcaster.broadcast(organization_id, &public).await {
                Ok(()) => {
                    OutboxRepo::mark_delivered(&self.pool, organization_id, event.id).await?;
                    succeeded += 1;
                    last_success = Some(event.id);
                }
                Err(e) => {
                    tracing::warn!(
                        %organization_id,
                        event_id = event.id,
                        error = %e,
                        "Broadcast failed, leaving batch remainder for next invocation"
                    );
                    OutboxRepo::mark_failed(&self.pool, organization_id, event.id, &e.to_string())
                        .await?;
                    return Ok(BatchOutcome {
                        succeeded,
                        last_success,
                        failed: true,
                    });
                }
            }
        }

        Ok(BatchOutcome {
            succeeded,
            last_success,
            failed: false,
        })
    }
}
