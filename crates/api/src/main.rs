use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_api::config::ServerConfig;
use relay_api::{background, routes, state};
use relay_outbox::{
    Broadcaster, ChannelBroadcaster, DeadLetterMigrator, InMemoryRateLimiter, OutboxProcessor,
    OutboxPruner, ProcessorConfig, WebhookBroadcaster,
};

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_api=debug,relay_outbox=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = relay_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    relay_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    relay_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Outbox subsystem ---
    let broadcaster = Arc::new(ChannelBroadcaster::new());

    // Deliveries go to a webhook endpoint when one is configured,
    // otherwise to the in-process channel hub.
    let delivery: Arc<dyn Broadcaster> = match std::env::var("OUTBOX_WEBHOOK_URL") {
        Ok(url) => {
            tracing::info!(endpoint = %url, "Broadcasting events via webhook");
            Arc::new(WebhookBroadcaster::new(url))
        }
        Err(_) => Arc::clone(&broadcaster) as Arc<dyn Broadcaster>,
    };

    let processor = Arc::new(OutboxProcessor::new(
        pool.clone(),
        delivery,
        Arc::new(InMemoryRateLimiter::from_env()),
        ProcessorConfig::from_env(),
    ));
    let pruner = Arc::new(OutboxPruner::new(pool.clone()));
    let migrator = Arc::new(DeadLetterMigrator::new(pool.clone()));
    tracing::info!("Outbox processor initialized");

    // --- Background maintenance ---
    let maintenance_cancel = tokio_util::sync::CancellationToken::new();
    let pruner_handle = tokio::spawn(background::maintenance::run_pruner(
        Arc::clone(&pruner),
        maintenance_cancel.clone(),
    ));
    let migrator_handle = tokio::spawn(background::maintenance::run_dead_letter_migrator(
        Arc::clone(&migrator),
        maintenance_cancel.clone(),
    ));
    tracing::info!("Background maintenance jobs started (pruner, dead-letter migrator)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        processor,
        broadcaster,
        pruner,
        migrator,
    };

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = Router::new()
        // Health check at root level.
        .merge(routes::health::router())
        // Internal trigger routes.
        .nest("/internal", routes::internal_routes())
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout (above the processor's invocation budget).
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // Shared state.
        .with_state(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    maintenance_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), pruner_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), migrator_handle).await;
    tracing::info!("Background maintenance jobs stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
