//! GET /api/documents/{id}/access and POST /api/documents/access

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use std::sync::Arc;

use super::context::Authenticated;
use crate::access::decision::AccessDecisions;
use crate::access::validation::{validate_uuid, validate_uuid_array};
use crate::error::AppError;
use crate::types::{BatchDocumentAccessRequest, BatchDocumentAccessResponse, DocumentAccessResponse};

pub async fn document_access(
    State(state): State<Arc<crate::AppState>>,
    Path(document_id): Path<String>,
    auth: Authenticated,
) -> Result<Json<DocumentAccessResponse>, AppError> {
    validate_uuid(&document_id)?;

    let allowed = AccessDecisions::new(&state.provider, &state.store, &state.pipeline)
        .can_access_document(&auth.scope, auth.user_id(), &document_id)
        .await;
    Ok(Json(DocumentAccessResponse {
        document_id,
        allowed,
    }))
}

/// Check several documents at once. Every id is validated before the
/// first store call.
pub async fn batch_document_access(
    State(state): State<Arc<crate::AppState>>,
    auth: Authenticated,
    payload: Result<Json<BatchDocumentAccessRequest>, JsonRejection>,
) -> Result<Json<BatchDocumentAccessResponse>, AppError> {
    let Json(req) = payload?;
    validate_uuid_array(&req.document_ids)?;

    let decisions = AccessDecisions::new(&state.provider, &state.store, &state.pipeline);
    let mut results = Vec::with_capacity(req.document_ids.len());
    for document_id in req.document_ids {
        let allowed = decisions
            .can_access_document(&auth.scope, auth.user_id(), &document_id)
            .await;
        results.push(DocumentAccessResponse {
            document_id,
            allowed,
        });
    }
    Ok(Json(BatchDocumentAccessResponse { results }))
}
