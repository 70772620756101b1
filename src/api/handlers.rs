use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::gitlab::{decode_pipeline_hook, EVENT_HEADER, PIPELINE_HOOK, TOKEN_HEADER};
use crate::ingest::{IngestSummary, PipelineIngester};
use crate::instances::InstanceRegistry;

/// Application state shared across handlers
pub struct AppState {
    pub instances: Arc<InstanceRegistry>,
    pub ingester: Arc<PipelineIngester>,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// GitLab Webhook
// ============================================================================

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Trace a GitLab pipeline hook.
///
/// Endpoint: POST /gitlab/:instance
pub async fn ingest_gitlab(
    State(state): State<Arc<AppState>>,
    Path(instance_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestSummary>, ApiError> {
    let instance = state
        .instances
        .get(&instance_name)
        .ok_or_else(|| ApiError::NotFound(format!("Instance '{}' not found", instance_name)))?;

    if !instance.accepts_token(header(&headers, TOKEN_HEADER)) {
        tracing::warn!(instance = %instance.name, "Rejected hook with invalid token");
        return Err(ApiError::Unauthorized("Invalid webhook token".to_string()));
    }

    match header(&headers, EVENT_HEADER) {
        Some(PIPELINE_HOOK) => {}
        other => {
            tracing::debug!(instance = %instance.name, event = ?other, "Ignoring unsupported event");
            return Err(ApiError::BadRequest(format!(
                "Unsupported event '{}'",
                other.unwrap_or_default()
            )));
        }
    }

    let event = decode_pipeline_hook(&body).map_err(|e| {
        tracing::warn!(instance = %instance.name, error = %e, "Could not decode hook");
        ApiError::BadRequest(e.to_string())
    })?;

    let summary = state
        .ingester
        .ingest_pipeline(&event, instance)
        .map_err(|e| {
            tracing::error!(instance = %instance.name, error = %e, "Could not process hook");
            ApiError::Internal(e.to_string())
        })?;

    Ok(Json(summary))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
