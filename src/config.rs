//! Process configuration from environment variables
//!
//! - CI_TRACER_HOST: Bind address (default: 127.0.0.1)
//! - CI_TRACER_PORT: Port number (default: 3000)
//! - CI_TRACER_REQUEST_TIMEOUT_SECS: Per-request timeout (default: 15)
//! - CI_TRACER_MAX_BODY_BYTES: Largest accepted hook body (default: 64 MiB)
//! - CI_TRACER_INSTANCES: Known instances, `name` or `name:token`, comma-separated
//! - CI_TRACER_BACKEND: `otlp` or `log` (default: otlp)
//! - CI_TRACER_SERVICE_NAME: Service name reported to the backend (default: ci-tracer)
//! - CI_TRACER_OTLP_ENDPOINT: Collector base URL (default: http://127.0.0.1:4318)
//! - CI_TRACER_OTLP_BATCH_SIZE: Spans per export request (default: 512)
//! - CI_TRACER_OTLP_FLUSH_INTERVAL_MS: Max delay before export (default: 1000)

use std::str::FromStr;

use crate::instances::InstanceRegistry;
use crate::trace::{BackendKind, OtlpConfig, TracerConfig};

/// Largest accepted webhook body
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
    pub instances: InstanceRegistry,
    pub tracer: TracerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: 15,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            instances: InstanceRegistry::new(),
            tracer: TracerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let otlp_defaults = OtlpConfig::default();

        let backend = match std::env::var("CI_TRACER_BACKEND") {
            Ok(value) => BackendKind::from_str(&value).map_err(|msg| ConfigError::Invalid {
                var: "CI_TRACER_BACKEND",
                msg,
            })?,
            Err(_) => defaults.tracer.backend,
        };

        let otlp = OtlpConfig {
            endpoint: std::env::var("CI_TRACER_OTLP_ENDPOINT").unwrap_or(otlp_defaults.endpoint),
            service_name: std::env::var("CI_TRACER_SERVICE_NAME")
                .unwrap_or(otlp_defaults.service_name),
            batch_size: env_parse("CI_TRACER_OTLP_BATCH_SIZE")?.unwrap_or(otlp_defaults.batch_size),
            flush_interval_ms: env_parse("CI_TRACER_OTLP_FLUSH_INTERVAL_MS")?
                .unwrap_or(otlp_defaults.flush_interval_ms),
            timeout_secs: otlp_defaults.timeout_secs,
        };

        Ok(Self {
            host: std::env::var("CI_TRACER_HOST").unwrap_or(defaults.host),
            port: env_parse("CI_TRACER_PORT")?.unwrap_or(defaults.port),
            request_timeout_secs: env_parse("CI_TRACER_REQUEST_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout_secs),
            max_body_bytes: env_parse("CI_TRACER_MAX_BODY_BYTES")?
                .unwrap_or(defaults.max_body_bytes),
            instances: InstanceRegistry::from_env(),
            tracer: TracerConfig { backend, otlp },
        })
    }
}

/// Read and parse an optional variable
fn env_parse<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var,
                msg: format!("cannot parse '{}'", value),
            }),
        Err(_) => Ok(None),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {var}: {msg}")]
    Invalid { var: &'static str, msg: String },
}
