//! ocrgate server: HTTP API for the image-to-text gateway
//!
//! Wraps [`ocrgate::Pipeline`] in an Axum router with per-client rate
//! limiting, structured JSON logging, request ids and Prometheus metrics.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - Health check
//! - `GET /metrics` - Prometheus metrics
//! - `POST /extract-text` - Extract text from one image (30 requests/minute)
//! - `POST /extract-text/batch` - Extract text from up to 10 images (10 requests/minute)
//!
//! Errors share one envelope: `{"success": false, "error": "...", "status_code": 415}`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, prometheus_handle, start_server};
pub use state::{RouteClass, ServerState};
