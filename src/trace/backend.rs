//! Tracer backend selection and lifecycle

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use super::log::LogTracer;
use super::otlp::{OtlpConfig, OtlpTracer};
use super::tracer::{Tracer, TracerError};

/// Which backend receives the reconstructed spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Otlp,
    Log,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Otlp => "otlp",
            BackendKind::Log => "log",
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "otlp" => Ok(BackendKind::Otlp),
            "log" => Ok(BackendKind::Log),
            other => Err(format!("unknown tracer backend '{}'", other)),
        }
    }
}

/// Tracer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracerConfig {
    pub backend: BackendKind,
    pub otlp: OtlpConfig,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Otlp,
            otlp: OtlpConfig::default(),
        }
    }
}

/// A running tracer backend, selected once at startup
pub enum TracerBackend {
    Log(Arc<LogTracer>),
    Otlp(Arc<OtlpTracer>),
}

impl TracerBackend {
    /// Build the configured backend. Must be called within a tokio runtime.
    pub fn build(config: &TracerConfig) -> Result<Self, TracerError> {
        match config.backend {
            BackendKind::Log => Ok(TracerBackend::Log(Arc::new(LogTracer::new()))),
            BackendKind::Otlp => {
                let tracer = OtlpTracer::start(config.otlp.clone())?;
                Ok(TracerBackend::Otlp(Arc::new(tracer)))
            }
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            TracerBackend::Log(_) => BackendKind::Log,
            TracerBackend::Otlp(_) => BackendKind::Otlp,
        }
    }

    /// The span capability handed to the ingester
    pub fn tracer(&self) -> Arc<dyn Tracer> {
        match self {
            TracerBackend::Log(tracer) => Arc::clone(tracer) as Arc<dyn Tracer>,
            TracerBackend::Otlp(tracer) => Arc::clone(tracer) as Arc<dyn Tracer>,
        }
    }

    /// Flush and stop the backend
    pub async fn shutdown(&self) {
        match self {
            TracerBackend::Log(_) => {}
            TracerBackend::Otlp(tracer) => tracer.shutdown().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("otlp".parse::<BackendKind>(), Ok(BackendKind::Otlp));
        assert_eq!(" LOG ".parse::<BackendKind>(), Ok(BackendKind::Log));
        assert!("jaeger".parse::<BackendKind>().is_err());
    }

    #[tokio::test]
    async fn test_build_log_backend() {
        let config = TracerConfig {
            backend: BackendKind::Log,
            ..Default::default()
        };
        let backend = TracerBackend::build(&config).unwrap();
        assert_eq!(backend.kind(), BackendKind::Log);

        let _tracer = backend.tracer();
        backend.shutdown().await;
    }
}
