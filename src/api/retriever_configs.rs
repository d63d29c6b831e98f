//! Retriever descriptor management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::{json, Value};
use tracing::debug;

use super::state::AppState;
use crate::api::types::{ApiError, Json, PaginationParams};
use crate::domain::retrieval::StoredRetriever;
use crate::domain::RetrieverDescriptor;

/// GET /retriever_config
pub async fn list_retrievers(
    State(state): State<AppState>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<Vec<StoredRetriever>>, ApiError> {
    let page = page.validate()?;
    Ok(Json(state.retrievers.list(page.skip, page.limit).await?))
}

/// POST /retriever_config
///
/// Descriptors are validated while deserializing; invalid ones never reach
/// the store.
pub async fn create_retriever(
    State(state): State<AppState>,
    Json(descriptor): Json<RetrieverDescriptor>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    debug!(name = descriptor.name(), kind = %descriptor.kind(), "Creating retriever");

    let id = state.retrievers.create(descriptor).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// GET /retriever_config/{config_id}
pub async fn get_retriever(
    State(state): State<AppState>,
    Path(config_id): Path<String>,
) -> Result<Json<StoredRetriever>, ApiError> {
    state
        .retrievers
        .get(&config_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Retriever '{}' not found", config_id)))
}

/// PUT /retriever_config/{config_id}
pub async fn update_retriever(
    State(state): State<AppState>,
    Path(config_id): Path<String>,
    Json(descriptor): Json<RetrieverDescriptor>,
) -> Result<Json<Value>, ApiError> {
    let stored = state.retrievers.update(&config_id, descriptor).await?;
    Ok(Json(json!({ "id": stored.id })))
}

/// DELETE /retriever_config/{config_id}
pub async fn delete_retriever(
    State(state): State<AppState>,
    Path(config_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.retrievers.delete(&config_id).await?;
    Ok(Json(json!({ "count": u8::from(deleted) })))
}
