//! Document handlers

use axum::{extract::State, http::StatusCode, Json};

use core_kernel::{DocumentId, TenantId};
use domain_ledger::{Document, DocumentView};

use crate::dto::documents::*;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;

/// Records a document; journals, credit notes and payments post immediately
pub async fn create_document(
    State(state): State<AppState>,
    ApiPath(tenant_id): ApiPath<TenantId>,
    ApiJson(request): ApiJson<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<PostingResponse>), ApiError> {
    let receipt = state.ledger.record(request.into_request(tenant_id)).await?;
    Ok((StatusCode::CREATED, Json(receipt.into())))
}

/// Gets a document with its ledger lines
pub async fn get_document(
    State(state): State<AppState>,
    ApiPath((tenant_id, id)): ApiPath<(TenantId, DocumentId)>,
) -> Result<Json<DocumentView>, ApiError> {
    Ok(Json(state.ledger.document(tenant_id, id).await?))
}

/// Replaces a draft's content
pub async fn update_draft(
    State(state): State<AppState>,
    ApiPath((tenant_id, id)): ApiPath<(TenantId, DocumentId)>,
    ApiJson(request): ApiJson<CreateDocumentRequest>,
) -> Result<Json<PostingResponse>, ApiError> {
    let receipt = state
        .ledger
        .update_draft(id, request.into_request(tenant_id))
        .await?;
    Ok(Json(receipt.into()))
}

pub async fn delete_draft(
    State(state): State<AppState>,
    ApiPath((tenant_id, id)): ApiPath<(TenantId, DocumentId)>,
) -> Result<StatusCode, ApiError> {
    state.ledger.delete_draft(tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Posts a draft to the ledger
pub async fn post_document(
    State(state): State<AppState>,
    ApiPath((tenant_id, id)): ApiPath<(TenantId, DocumentId)>,
) -> Result<Json<PostingResponse>, ApiError> {
    Ok(Json(state.ledger.post(tenant_id, id).await?.into()))
}

/// Posts the mirror image of a posted document
pub async fn reverse_document(
    State(state): State<AppState>,
    ApiPath((tenant_id, id)): ApiPath<(TenantId, DocumentId)>,
    ApiJson(request): ApiJson<ReverseDocumentRequest>,
) -> Result<(StatusCode, Json<PostingResponse>), ApiError> {
    let receipt = state
        .ledger
        .reverse(tenant_id, id, request.user_id, request.entry_date)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt.into())))
}

pub async fn cancel_draft(
    State(state): State<AppState>,
    ApiPath((tenant_id, id)): ApiPath<(TenantId, DocumentId)>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.ledger.cancel(tenant_id, id).await?))
}
