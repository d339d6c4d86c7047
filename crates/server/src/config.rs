use recognizer::RecognizerConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB. Must leave room for a full batch of
    /// maximum-size images plus multipart framing.
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Requests per minute per client on `POST /extract-text`
    #[serde(default = "default_single_rate_limit")]
    pub single_rate_limit_per_minute: u32,

    /// Requests per minute per client on `POST /extract-text/batch`
    #[serde(default = "default_batch_rate_limit")]
    pub batch_rate_limit_per_minute: u32,

    /// Batch items processed concurrently
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// OCR collaborator settings
    #[serde(default)]
    pub recognizer: RecognizerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            single_rate_limit_per_minute: default_single_rate_limit(),
            batch_rate_limit_per_minute: default_batch_rate_limit(),
            batch_concurrency: default_batch_concurrency(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            recognizer: RecognizerConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `ocrgate.toml` and
    /// `OCRGATE__*` environment variables, later sources winning.
    ///
    /// Nested keys use the same separator, e.g.
    /// `OCRGATE__RECOGNIZER__API_KEY`.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }

        let builder = config::Config::builder()
            .add_source(config::File::with_name("ocrgate").required(false))
            .add_source(config::Environment::with_prefix("OCRGATE").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.recognizer.validate()?;
        Ok(config)
    }

    /// A configuration for tests and offline runs: stub engine, no metrics.
    pub fn offline() -> Self {
        Self {
            metrics_enabled: false,
            recognizer: RecognizerConfig::stub(),
            ..Default::default()
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_body_size_mb() -> usize {
    ingest::MAX_BATCH_SIZE * ingest::MAX_FILE_SIZE / (1024 * 1024) + 10
}

fn default_single_rate_limit() -> u32 {
    30
}

fn default_batch_rate_limit() -> u32 {
    10
}

fn default_batch_concurrency() -> usize {
    ocrgate::DEFAULT_BATCH_CONCURRENCY
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
