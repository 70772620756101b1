use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{health_check, ingest_gitlab, AppState};
use crate::config::ServerConfig;
use crate::ingest::PipelineIngester;
use crate::trace::TracerBackend;

/// Build the application router
///
/// `max_body_bytes` replaces axum's 2 MB default body limit; larger hooks get 413.
pub fn build_router(
    state: Arc<AppState>,
    request_timeout: Duration,
    max_body_bytes: usize,
) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Webhooks
        .route("/gitlab/:instance", post(ingest_gitlab))
        // Middleware
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.instances.is_empty() {
        tracing::warn!("No instances configured, every hook will be answered with 404");
    }

    // Select the tracer backend once for the whole process
    let backend = TracerBackend::build(&config.tracer)?;
    tracing::info!("Tracer backend: {}", backend.kind().as_str());

    let state = Arc::new(AppState {
        instances: Arc::new(config.instances.clone()),
        ingester: Arc::new(PipelineIngester::new(backend.tracer())),
    });

    let app = build_router(
        state,
        Duration::from_secs(config.request_timeout_secs),
        config.max_body_bytes,
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting ci-tracer on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Flushing tracer...");
    backend.shutdown().await;

    tracing::info!("ci-tracer stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_BODY_BYTES;
    use crate::instances::{Instance, InstanceRegistry};
    use crate::trace::{RecordingTracer, TagValue, Tracer};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    const HOOK: &str = r#"{
        "object_kind": "pipeline",
        "object_attributes": {
            "id": 31,
            "ref": "master",
            "status": "success",
            "created_at": "2020-02-15 15:23:28 UTC",
            "finished_at": "2020-02-15 15:30:00 UTC"
        },
        "merge_request": null,
        "project": {"name": "gitlab-test", "web_url": "https://gitlab.example.com/org/gitlab-test"},
        "builds": [
            {
                "id": 1,
                "stage": "build",
                "name": "build",
                "status": "success",
                "created_at": "2020-02-15 15:23:28 UTC",
                "started_at": "2020-02-15 15:26:12 UTC",
                "finished_at": "2020-02-15 15:26:29 UTC",
                "runner": {"id": 1, "description": "runner.gitlab.com", "active": true, "is_shared": false}
            },
            {
                "id": 2,
                "stage": "deploy",
                "name": "deploy",
                "status": "manual",
                "created_at": "2020-02-15 15:23:28 UTC",
                "started_at": null,
                "finished_at": null
            }
        ]
    }"#;

    fn create_test_app() -> (Router, Arc<RecordingTracer>) {
        create_test_app_with_limit(DEFAULT_MAX_BODY_BYTES)
    }

    fn create_test_app_with_limit(max_body_bytes: usize) -> (Router, Arc<RecordingTracer>) {
        let tracer = Arc::new(RecordingTracer::new());
        let instances = InstanceRegistry::new()
            .with_instance(Instance::new("test"))
            .with_instance(Instance::new("guarded").with_token("s3cret"));

        let state = Arc::new(AppState {
            instances: Arc::new(instances),
            ingester: Arc::new(PipelineIngester::new(
                Arc::clone(&tracer) as Arc<dyn Tracer>
            )),
        });
        (
            build_router(state, Duration::from_secs(15), max_body_bytes),
            tracer,
        )
    }

    fn hook_request(instance: &str, event: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/gitlab/{}", instance))
            .header("content-type", "application/json")
            .header("X-Gitlab-Event", event)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_pipeline_hook() {
        let (app, tracer) = create_test_app();

        let response = app
            .oneshot(hook_request("test", "Pipeline Hook", HOOK))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let summary: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(summary["pipeline_id"], 31);
        assert_eq!(summary["jobs_traced"], 1);
        assert_eq!(summary["jobs_skipped"], 1);

        let spans = tracer.finished_spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "gitlab-job");
        assert_eq!(spans[0].tags["instance"], TagValue::from("test"));
        assert_eq!(spans[1].name, "gitlab-pipeline");
        assert_eq!(
            spans[1].tags["project.path"],
            TagValue::from("https://gitlab.example.com/org/gitlab-test")
        );
    }

    #[tokio::test]
    async fn test_unknown_instance_skips_decoding() {
        let (app, tracer) = create_test_app();

        let response = app
            .oneshot(hook_request("nope", "Pipeline Hook", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(tracer.events().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_event() {
        let (app, tracer) = create_test_app();

        let response = app
            .oneshot(hook_request("test", "Push Hook", HOOK))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(tracer.events().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(hook_request("test", "Pipeline Hook", "{\"builds\": [}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_pipeline_timestamp() {
        let (app, tracer) = create_test_app();
        let body = HOOK.replace("2020-02-15 15:30:00 UTC", "soon");

        let response = app
            .oneshot(hook_request("test", "Pipeline Hook", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(tracer.events().is_empty());
    }

    #[tokio::test]
    async fn test_token_checked() {
        let (app, tracer) = create_test_app();

        let response = app
            .clone()
            .oneshot(hook_request("guarded", "Pipeline Hook", HOOK))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut request = hook_request("guarded", "Pipeline Hook", HOOK);
        request
            .headers_mut()
            .insert("X-Gitlab-Token", "s3cret".parse().unwrap());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(tracer.finished_spans().len(), 2);
    }

    #[tokio::test]
    async fn test_body_over_axum_default_limit_accepted() {
        let (app, tracer) = create_test_app();
        let body = format!("{}{}", HOOK, " ".repeat(3 * 1024 * 1024));

        let response = app
            .oneshot(hook_request("test", "Pipeline Hook", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(tracer.finished_spans().len(), 2);
    }

    #[tokio::test]
    async fn test_body_over_configured_limit_rejected() {
        let (app, tracer) = create_test_app_with_limit(1024);
        let body = format!("{}{}", HOOK, " ".repeat(2048));

        let response = app
            .oneshot(hook_request("test", "Pipeline Hook", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(tracer.events().is_empty());
    }
}
