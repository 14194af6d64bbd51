//! Periodic outbox maintenance: pruning delivered events and migrating
//! exhausted ones to the dead-letter store.
//!
//! Both loops run on fixed intervals using `tokio::time::interval` and
//! call the same idempotent jobs the HTTP triggers expose, so an
//! external scheduler and these loops can coexist safely.

use std::sync::Arc;
use std::time::Duration;

use relay_outbox::{DeadLetterMigrator, OutboxPruner};
use tokio_util::sync::CancellationToken;

/// How often the pruner runs.
const PRUNE_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// How often the dead-letter migrator runs.
const MIGRATE_INTERVAL: Duration = Duration::from_secs(600); // 10 minutes

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Run the pruning loop until `cancel` is triggered.
///
/// Retention and cap can be overridden with `OUTBOX_RETENTION_HOURS`
/// and `OUTBOX_PRUNE_MAX_BATCH`.
pub async fn run_pruner(pruner: Arc<OutboxPruner>, cancel: CancellationToken) {
    let retention_hours: i64 = env_parse(
        "OUTBOX_RETENTION_HOURS",
        relay_outbox::prune::DEFAULT_RETENTION_HOURS,
    );
    let max_batch_size: i64 = env_parse(
        "OUTBOX_PRUNE_MAX_BATCH",
        relay_outbox::prune::DEFAULT_MAX_BATCH_SIZE,
    );

    tracing::info!(
        retention_hours,
        max_batch_size,
        interval_secs = PRUNE_INTERVAL.as_secs(),
        "Outbox pruner started"
    );

    let mut interval = tokio::time::interval(PRUNE_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Outbox pruner stopping");
                break;
            }
            _ = interval.tick() => {
                match pruner.prune(retention_hours, max_batch_size).await {
                    Ok(report) if report.deleted_count > 0 => {
                        tracing::info!(
                            deleted = report.deleted_count,
                            execution_time_ms = report.execution_time_ms,
                            "Outbox pruning pass finished"
                        );
                    }
                    Ok(_) => {
                        tracing::debug!("Outbox pruning pass: nothing to delete");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Outbox pruning pass failed");
                    }
                }
            }
        }
    }
}

/// Run the dead-letter migration loop until `cancel` is triggered.
///
/// The attempt threshold can be overridden with `OUTBOX_MAX_ATTEMPTS`.
pub async fn run_dead_letter_migrator(migrator: Arc<DeadLetterMigrator>, cancel: CancellationToken) {
    let max_attempts: i32 = env_parse(
        "OUTBOX_MAX_ATTEMPTS",
        relay_outbox::dead_letter::DEFAULT_MAX_DELIVERY_ATTEMPTS,
    );

    tracing::info!(
        max_attempts,
        interval_secs = MIGRATE_INTERVAL.as_secs(),
        "Dead-letter migrator started"
    );

    let mut interval = tokio::time::interval(MIGRATE_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Dead-letter migrator stopping");
                break;
            }
            _ = interval.tick() => {
                match migrator.migrate(max_attempts).await {
                    Ok(report) if report.moved_count > 0 => {
                        tracing::warn!(
                            moved = report.moved_count,
                            affected_tenants = report.affected_tenants.len(),
                            "Dead-letter migration pass moved events"
                        );
                    }
                    Ok(_) => {
                        tracing::debug!("Dead-letter migration pass: nothing to move");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Dead-letter migration pass failed");
                    }
                }
            }
        }
    }
}
