//! Integration tests for the internal outbox trigger endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, post_json, post_json_auth};
use relay_db::models::CreateOutboxEvent;
use relay_db::repositories::OutboxRepo;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

/// Insert a pending event for a tenant and return its id.
async fn seed_event(pool: &PgPool, org: Uuid, event_type: &str) -> i64 {
    OutboxRepo::insert(
        pool,
        &CreateOutboxEvent {
            organization_id: org,
            event_type: event_type.to_string(),
            entity_type: Some("project".to_string()),
            entity_id: Some(Uuid::new_v4()),
            event_data: json!({"name": "Test", "api_key": "secret"}),
        },
    )
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn process_without_auth_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/internal/outbox/process",
        json!({"organizationId": Uuid::new_v4().to_string()}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn process_with_wrong_secret_returns_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/internal/outbox/process")
                .header("content-type", "application/json")
                .header("authorization", "Bearer wrong-secret")
                .body(axum::body::Body::from(
                    json!({"organizationId": Uuid::new_v4().to_string()}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn maintenance_endpoints_require_auth(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app.clone(), "/internal/outbox/prune", json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(app, "/internal/outbox/dead-letter", json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn process_rejects_malformed_organization_id(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/internal/outbox/process",
        json!({"organizationId": "not-a-uuid; DROP TABLE outbox_event"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn prune_rejects_non_positive_parameters(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/internal/outbox/prune",
        json!({"retentionHours": -1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app,
        "/internal/outbox/prune",
        json!({"maxBatchSize": 0}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dead_letter_rejects_non_positive_threshold(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/internal/outbox/dead-letter",
        json!({"maxDeliveryAttempts": 0}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// POST /internal/outbox/process
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn process_drains_pending_events(pool: PgPool) {
    let org = Uuid::new_v4();
    let e1 = seed_event(&pool, org, "project.created").await;
    let e2 = seed_event(&pool, org, "project.updated").await;
    let e3 = seed_event(&pool, org, "segment.created").await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/internal/outbox/process",
        json!({"organizationId": org.to_string()}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["processed"], 3);
    assert_eq!(body["completed"], true);
    assert_eq!(body["skipped"], false);
    assert_eq!(body["organizationId"], org.to_string());
    assert!(body["durationMs"].is_u64());

    // All three events are now delivered.
    for id in [e1, e2, e3] {
        let event = OutboxRepo::get(&pool, org, id).await.unwrap().unwrap();
        assert!(event.is_delivered());
    }
    assert_eq!(OutboxRepo::pending_count(&pool, org).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn process_empty_tenant_completes_immediately(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/internal/outbox/process",
        json!({"organizationId": Uuid::new_v4().to_string()}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["processed"], 0);
    assert_eq!(body["completed"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn process_does_not_touch_other_tenants(pool: PgPool) {
    let org_a = Uuid::new_v4();
    let org_b = Uuid::new_v4();
    seed_event(&pool, org_a, "project.created").await;
    seed_event(&pool, org_b, "project.created").await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/internal/outbox/process",
        json!({"organizationId": org_a.to_string()}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(OutboxRepo::pending_count(&pool, org_a).await.unwrap(), 0);
    assert_eq!(OutboxRepo::pending_count(&pool, org_b).await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// POST /internal/outbox/prune
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn prune_with_defaults_reports_zero_on_empty_table(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json_auth(app, "/internal/outbox/prune", json!({})).await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["deletedCount"], 0);
    assert!(body["executionTimeMs"].is_u64());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn prune_deletes_old_delivered_events_only(pool: PgPool) {
    let org = Uuid::new_v4();
    let old_delivered = seed_event(&pool, org, "project.created").await;
    let pending = seed_event(&pool, org, "project.updated").await;

    // Backdate one event and mark it delivered 50 hours ago.
    sqlx::query(
        "UPDATE outbox_event \
         SET delivered_at = NOW() - INTERVAL '50 hours', \
             created_at = NOW() - INTERVAL '51 hours' \
         WHERE id = $1",
    )
    .bind(old_delivered)
    .execute(&pool)
    .await
    .unwrap();

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/internal/outbox/prune",
        json!({"retentionHours": 24}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["deletedCount"], 1);

    // The delivered row is gone, the pending one survives.
    assert!(OutboxRepo::get(&pool, org, old_delivered)
        .await
        .unwrap()
        .is_none());
    assert!(OutboxRepo::get(&pool, org, pending).await.unwrap().is_some());
}

// ---------------------------------------------------------------------------
// POST /internal/outbox/dead-letter
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn dead_letter_moves_exhausted_events(pool: PgPool) {
    let org = Uuid::new_v4();
    let exhausted = seed_event(&pool, org, "project.created").await;
    let healthy = seed_event(&pool, org, "project.updated").await;

    // Exhaust the retry budget and age the event past the grace period.
    sqlx::query(
        "UPDATE outbox_event \
         SET delivery_attempts = 5, \
             last_error = 'connection refused', \
             created_at = NOW() - INTERVAL '1 hour' \
         WHERE id = $1",
    )
    .bind(exhausted)
    .execute(&pool)
    .await
    .unwrap();

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(app, "/internal/outbox/dead-letter", json!({})).await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["movedCount"], 1);
    assert_eq!(body["affectedTenants"][0], org.to_string());

    // Moved out of the outbox, into the dead-letter store.
    assert!(OutboxRepo::get(&pool, org, exhausted)
        .await
        .unwrap()
        .is_none());
    assert!(OutboxRepo::get(&pool, org, healthy).await.unwrap().is_some());

    let dlq_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM dead_letter_entry WHERE original_event_id = $1")
            .bind(exhausted)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(dlq_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dead_letter_reports_nothing_to_move(pool: PgPool) {
    let org = Uuid::new_v4();
    seed_event(&pool, org, "project.created").await;

    let app = common::build_test_app(pool);
    let response = post_json_auth(app, "/internal/outbox/dead-letter", json!({})).await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["movedCount"], 0);
    assert_eq!(body["affectedTenants"], json!([]));
}
