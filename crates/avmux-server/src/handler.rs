use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;

use avmux_protocol::{HealthResponse, MergeRequest, MergeResponse, ServiceInfo};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Service descriptor handler.
pub async fn root_handler(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo::running(state.tool_version.clone()))
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::now())
}

/// Merge handler: runs the whole pipeline before responding.
///
/// The pipeline runs on its own task so a dropped connection does not
/// cancel the media tool midway or skip working area cleanup.
pub async fn merge_handler(
    State(state): State<AppState>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> ServerResult<Json<MergeResponse>> {
    let Json(request) = payload.map_err(|e| ServerError::InvalidBody(e.body_text()))?;
    let merger = state.merger.clone();
    let outcome = tokio::spawn(async move { merger.merge(&request).await })
        .await
        .map_err(|e| ServerError::Internal(format!("merge task failed: {e}")))??;
    Ok(Json(outcome.into()))
}
