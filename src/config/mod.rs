use garde::Validate;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;

const ENV_PREFIX: &str = "RECRUITAIR_";

/// PostgreSQL connection settings (`RECRUITAIR_DB_*`).
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub username: String,

    pub password: String,

    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    /// Database name
    pub database: String,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::prefixed(format!("{ENV_PREFIX}DB_")).from_env()?)
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
    }
}

/// Polling and dispatch settings shared by both workers.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WorkerConfig {
    /// Maximum number of items claimed per cycle
    #[serde(default = "default_batch_size")]
    #[garde(range(min = 1))]
    pub batch_size: usize,

    /// Sleep between cycles, in seconds
    #[serde(default = "default_interval_seconds")]
    #[garde(range(min = 1))]
    pub interval_seconds: u64,

    /// Per-call timeout for the remote API, in seconds
    #[serde(default = "default_http_timeout")]
    #[garde(range(min = 1))]
    pub http_timeout: u64,

    /// Candidates fetched per round trip when walking for advisory-lock claims
    #[serde(default = "default_claim_window")]
    #[garde(range(min = 1))]
    pub claim_window: usize,

    #[serde(default = "default_metrics_server_port")]
    #[garde(skip)]
    pub metrics_server_port: u16,

    #[serde(default)]
    #[garde(skip)]
    pub expose_metrics: bool,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            interval_seconds: default_interval_seconds(),
            http_timeout: default_http_timeout(),
            claim_window: default_claim_window(),
            metrics_server_port: default_metrics_server_port(),
            expose_metrics: false,
        }
    }
}

/// Endpoint of the remote extraction or evaluation service.
///
/// Loaded from `RECRUITAIR_EXTRACTOR_API_*` or `RECRUITAIR_EVALUATOR_API_*`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RemoteApiConfig {
    /// Base URL; requests go to `{base_url}/eval`
    #[garde(url)]
    pub base_url: String,

    #[garde(length(min = 1))]
    pub bearer_token: String,
}

impl RemoteApiConfig {
    pub fn extractor_from_env() -> Result<Self, ConfigError> {
        Self::from_env_prefixed("EXTRACTOR_API_")
    }

    pub fn evaluator_from_env() -> Result<Self, ConfigError> {
        Self::from_env_prefixed("EVALUATOR_API_")
    }

    fn from_env_prefixed(prefix: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::prefixed(format!("{ENV_PREFIX}{prefix}")).from_env()?;
        config.validate()?;
        Ok(config)
    }
}

/// API server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0:8080")
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::prefixed(ENV_PREFIX).from_env()?)
    }
}

fn default_db_port() -> u16 {
    5432
}

fn default_batch_size() -> usize {
    100
}

fn default_interval_seconds() -> u64 {
    10
}

fn default_http_timeout() -> u64 {
    30
}

fn default_claim_window() -> usize {
    1
}

fn default_metrics_server_port() -> u16 {
    8000
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] garde::Report),
}
