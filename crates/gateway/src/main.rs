//! LexRank API Gateway
//!
//! HTTP entry point of the authority core.
//! Handles:
//! - PageRank runs (on demand and scheduled)
//! - Authority lookups and run history
//! - Citation validation
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use axum::{
    routing::{delete, get, post},
    Router,
};
use lexrank_authority::{AuthorityEngine, CitationValidator, DbAuthorityStore};
use lexrank_common::{
    config::{AppConfig, ObservabilityConfig},
    db::{DbPool, Repository},
    metrics,
};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<AuthorityEngine>,
    pub validator: Arc<CitationValidator>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration; APP_CONFIG_FILE pins a single file
    let config = match std::env::var("APP_CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path),
        Err(_) => AppConfig::load(),
    }
    .map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(&config.observability);

    info!(
        service = %config.observability.service_name,
        "Starting LexRank API Gateway v{}",
        lexrank_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        prometheus_builder()?
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }
    metrics::register_metrics();

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    if config.database.run_migrations {
        db.migrate().await?;
    }

    let store = Arc::new(DbAuthorityStore::new(Repository::new(db)));
    let engine = Arc::new(AuthorityEngine::from_settings(
        store.clone(),
        store,
        &config.pagerank,
    )?);
    let validator = Arc::new(CitationValidator::with_ttl(config.validity_ttl()));

    if let Some(every) = config.schedule_interval() {
        info!(interval_secs = every.as_secs(), "Scheduled PageRank runs enabled");
        tokio::spawn(engine.clone().run_scheduled(every));
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create app state
    let state = AppState {
        config: Arc::new(config),
        engine,
        validator,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing; `RUST_LOG` wins over the configured level
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Prometheus exporter with the request and run histogram buckets
fn prometheus_builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_request_duration_seconds", metrics::METRICS_PREFIX)),
            metrics::LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_pagerank_run_duration_seconds", metrics::METRICS_PREFIX)),
            metrics::RUN_BUCKETS,
        )
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Runs carry their own deadline (`pagerank.run_timeout_secs`)
    let timeout = TimeoutLayer::new(request_timeout(&state.config));

    // Request/response routes, bounded by the request timeout
    let bounded_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Authority endpoints
        .route("/authority/top", get(handlers::authority::top_documents))
        .route("/authority/documents/{id}", get(handlers::authority::get_document))
        .route("/authority/runs", get(handlers::authority::recent_runs))

        // Citation endpoints
        .route("/citations/validate", post(handlers::citations::validate))
        .route("/citations/validity", post(handlers::citations::check_validity))
        .route("/citations/validity-cache", delete(handlers::citations::clear_cache))
        .route_layer(timeout);

    // API routes
    let api_routes = Router::new()
        .route("/authority/calculate", post(handlers::authority::calculate))
        .merge(bounded_routes)
        .route_layer(axum::middleware::from_fn(middleware::metrics::track_requests));

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

fn request_timeout(config: &AppConfig) -> Duration {
    // A zero timeout would reject every request
    config.request_timeout().max(Duration::from_secs(1))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
