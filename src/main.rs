//! ci-tracer server
//!
//! Run with: cargo run
//!
//! Environment variables (see `ci_tracer::config` for the full list):
//! - CI_TRACER_HOST / CI_TRACER_PORT: Listen address (default: 127.0.0.1:3000)
//! - CI_TRACER_MAX_BODY_BYTES: Largest accepted hook body (default: 64 MiB)
//! - CI_TRACER_INSTANCES: Known instances, e.g. "gitlab-com,internal:s3cret"
//! - CI_TRACER_BACKEND: otlp or log (default: otlp)
//! - CI_TRACER_OTLP_ENDPOINT: Collector URL (default: http://127.0.0.1:4318)
//! - RUST_LOG: Log level (default: info)
//!
//! Point a GitLab webhook with pipeline events at `/gitlab/<instance>`.

use ci_tracer::api::run_server;
use ci_tracer::config::ServerConfig;
use ci_tracer::trace::BackendKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ci_tracer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    tracing::info!("ci-tracer {} configuration:", env!("CARGO_PKG_VERSION"));
    tracing::info!("  Listen: {}:{}", config.host, config.port);
    tracing::info!("  Request timeout: {} seconds", config.request_timeout_secs);
    tracing::info!("  Max body size: {} bytes", config.max_body_bytes);
    tracing::info!("  Instances: {}", config.instances.len());
    for name in config.instances.names() {
        tracing::info!("    - {}", name);
    }
    tracing::info!("  Backend: {}", config.tracer.backend.as_str());
    if config.tracer.backend == BackendKind::Otlp {
        tracing::info!("  OTLP endpoint: {}", config.tracer.otlp.traces_url());
        tracing::info!("  Service name: {}", config.tracer.otlp.service_name);
    }

    run_server(config).await
}
