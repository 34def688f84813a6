//! GET /health

use axum::Json;
use axum::extract::State;
use std::sync::Arc;

use crate::types::HealthResponse;

/// Health check: store backend and whether the org pipeline is on.
pub async fn health(State(state): State<Arc<crate::AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        store: state.store.backend_name().into(),
        pipeline: state.pipeline.load().use_external_org_pipeline,
    })
}
