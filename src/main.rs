use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Json, Router};
use serde_json::json;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::instrument;

use payments_api::{
    config, db,
    events::{process_events, EventSender},
    gateways::GatewayRegistry,
    health_check, metrics, openapi, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration, then initialize tracing with its log level
    let config = config::load_config()?;
    config::init_tracing(&config.log_level);

    tracing::info!("Starting payments API server...");

    // Initialize database connection
    let db_arc = Arc::new(db::establish_connection_from_app_config(&config).await?);
    tracing::info!("Database connection established");

    // Run database migrations if enabled
    if config.auto_migrate {
        db::run_migrations(&db_arc).await?;
    }

    // Initialize event system
    let (tx, rx) = tokio::sync::mpsc::channel(1000);
    let event_sender = EventSender::new(tx);
    let event_processor_handle = tokio::spawn(process_events(rx));

    // Register prometheus collectors
    metrics::register_metrics();

    // Gateway adapters come from config; the registry is read-only from here
    let gateways = GatewayRegistry::from_config(&config);
    tracing::info!(providers = ?gateways.codes(), "Gateway registry initialized");

    let state = AppState::new(db_arc.clone(), config.clone(), event_sender, gateways);

    let app = Router::new()
        .route("/health", axum::routing::get(health_check))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .nest("/api-docs", openapi::docs_routes())
        .nest("/api/v1", payments_api::api_v1_routes())
        .fallback(fallback_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new()),
        )
        .with_state(state);

    let http_addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("Payments API server listening on http://{}", http_addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // In-flight requests have drained; stop background work and close the pool
    event_processor_handle.abort();
    let _ = event_processor_handle.await;
    if let Ok(pool) = Arc::try_unwrap(db_arc) {
        let _ = db::close_pool(pool).await;
    }
    tracing::info!("Payments API server shutdown complete");

    result.map_err(anyhow::Error::from)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
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

#[instrument]
async fn metrics_endpoint() -> Result<String, (StatusCode, String)> {
    metrics::metrics_handler().await.map_err(|e| {
        tracing::error!("Metrics handler error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Metrics export failed: {}", e),
        )
    })
}

#[instrument]
async fn fallback_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "not_found",
            "message": "The requested resource was not found",
            "status": 404,
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
