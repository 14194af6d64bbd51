//! Handlers for the outbox trigger endpoints: process one tenant,
//! prune delivered events, migrate exhausted ones.

use axum::extract::State;
use axum::Json;
use relay_core::error::CoreError;
use relay_core::types::OrgId;
use relay_outbox::{MigrationReport, PruneReport};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::ProcessorAuth;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for a processing invocation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    /// Tenant identifier as an opaque UUID-shaped string.
    pub organization_id: String,
}

/// Request body for a pruning invocation. `{}` uses the defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneRequest {
    #[serde(default = "default_retention_hours")]
    pub retention_hours: i64,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: i64,
}

fn default_retention_hours() -> i64 {
    relay_outbox::prune::DEFAULT_RETENTION_HOURS
}

fn default_max_batch_size() -> i64 {
    relay_outbox::prune::DEFAULT_MAX_BATCH_SIZE
}

/// Request body for a dead-letter migration. `{}` uses the default.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateRequest {
    #[serde(default = "default_max_delivery_attempts")]
    pub max_delivery_attempts: i32,
}

fn default_max_delivery_attempts() -> i32 {
    relay_outbox::dead_letter::DEFAULT_MAX_DELIVERY_ATTEMPTS
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response for a processing invocation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub processed: u64,
    pub completed: bool,
    pub skipped: bool,
    pub duration_ms: u64,
    pub organization_id: OrgId,
}

/// Envelope for maintenance-job reports.
#[derive(Debug, Serialize)]
pub struct MaintenanceResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub report: T,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /internal/outbox/process
///
/// Run one bounded processing invocation for a tenant. Lock contention
/// is reported as a successful skipped invocation, not an error.
pub async fn process(
    State(state): State<AppState>,
    _auth: ProcessorAuth,
    Json(body): Json<ProcessRequest>,
) -> AppResult<Json<ProcessResponse>> {
    let organization_id = parse_org_id(&body.organization_id)?;

    let outcome = state.processor.process_tenant(organization_id).await?;

    Ok(Json(ProcessResponse {
        success: true,
        processed: outcome.processed,
        completed: outcome.completed,
        skipped: outcome.skipped,
        duration_ms: outcome.duration.as_millis() as u64,
        organization_id: outcome.organization_id,
    }))
}

/// POST /internal/outbox/prune
///
/// Reclaim storage for delivered events past the retention window.
pub async fn prune(
    State(state): State<AppState>,
    _auth: ProcessorAuth,
    Json(body): Json<PruneRequest>,
) -> AppResult<Json<MaintenanceResponse<PruneReport>>> {
    if body.retention_hours <= 0 {
        return Err(CoreError::Validation("retentionHours must be positive".into()).into());
    }
    if body.max_batch_size <= 0 {
        return Err(CoreError::Validation("maxBatchSize must be positive".into()).into());
    }

    let report = state
        .pruner
        .prune(body.retention_hours, body.max_batch_size)
        .await?;

    Ok(Json(MaintenanceResponse {
        success: true,
        report,
    }))
}

/// POST /internal/outbox/dead-letter
///
/// Move events that exhausted their retry budget into the dead-letter
/// store and report the affected tenants.
pub async fn migrate_to_dead_letter(
    State(state): State<AppState>,
    _auth: ProcessorAuth,
    Json(body): Json<MigrateRequest>,
) -> AppResult<Json<MaintenanceResponse<MigrationReport>>> {
    if body.max_delivery_attempts <= 0 {
        return Err(CoreError::Validation("maxDeliveryAttempts must be positive".into()).into());
    }

    let report = state.migrator.migrate(body.max_delivery_attempts).await?;

    Ok(Json(MaintenanceResponse {
        success: true,
        report,
    }))
}

/// Validate the tenant identifier from the invocation body.
///
/// Must be a well-formed UUID; anything else is rejected before any
/// store access.
fn parse_org_id(raw: &str) -> Result<OrgId, CoreError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| CoreError::Validation(format!("organizationId is not a valid UUID: {raw:?}")))
}
