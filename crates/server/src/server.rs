//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with the OCR and health endpoints
//! - Middleware stack (rate limiting, logging, request ids, CORS)
//! - Prometheus recorder installation
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{log_requests, rate_limit, request_id};
use crate::routes::{extract, health, not_found};
use crate::state::{RouteClass, ServerState};
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// The global recorder can only be installed once per process.
static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder, or return the one already installed.
pub fn prometheus_handle() -> anyhow::Result<PrometheusHandle> {
    PROMETHEUS
        .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
        .cloned()
        .map_err(Into::into)
}

/// Build the Axum router with all routes and middleware
///
/// - `GET /` and `GET /metrics` are never rate limited
/// - `POST /extract-text` and `POST /extract-text/batch` each have their own
///   per-client budget
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let public_routes = Router::new()
        .route("/", get(health::health_check))
        .route("/metrics", get(health::metrics));

    let single_routes = Router::new()
        .route("/extract-text", post(extract::extract_text))
        .route_layer(from_fn_with_state(
            (state.clone(), RouteClass::Single),
            rate_limit,
        ));

    let batch_routes = Router::new()
        .route("/extract-text/batch", post(extract::extract_text_batch))
        .route_layer(from_fn_with_state(
            (state.clone(), RouteClass::Batch),
            rate_limit,
        ));

    Router::new()
        .merge(public_routes)
        .merge(single_routes)
        .merge(batch_routes)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the ocrgate HTTP server
///
/// Blocks until the server is shut down via SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    let mut state = ServerState::new(config.clone())?;
    if config.metrics_enabled {
        state = state.with_metrics(prometheus_handle()?);
    }
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        "Starting ocrgate server on {} with {:?} engine",
        addr,
        config.recognizer.mode
    );
    tracing::info!(
        "Timeout: {}s, Max body: {}MB, Batch concurrency: {}",
        config.timeout_secs,
        config.max_body_size_mb,
        config.batch_concurrency
    );
    tracing::info!(
        "Rate limits: {}/min single, {}/min batch",
        config.single_rate_limit_per_minute,
        config.batch_rate_limit_per_minute
    );
    tracing::info!(
        "CORS: {}, Metrics: {}",
        config.enable_cors,
        config.metrics_enabled
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
