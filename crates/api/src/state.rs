use std::sync::Arc;

use relay_outbox::{ChannelBroadcaster, DeadLetterMigrator, OutboxProcessor, OutboxPruner};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: relay_db::DbPool,
    /// Server configuration (read by the auth extractor).
    pub config: Arc<ServerConfig>,
    /// The batch processor driving tenant outbox delivery.
    pub processor: Arc<OutboxProcessor>,
    /// Tenant-scoped delivery hub; in-process subscribers attach here.
    pub broadcaster: Arc<ChannelBroadcaster>,
    /// Storage reclamation job.
    pub pruner: Arc<OutboxPruner>,
    /// Dead-letter migration job.
    pub migrator: Arc<DeadLetterMigrator>,
}
