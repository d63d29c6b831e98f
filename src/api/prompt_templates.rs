//! Prompt template management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::{json, Value};
use tracing::debug;

use super::state::AppState;
use crate::api::types::{ApiError, Json, PaginationParams};
use crate::domain::prompt::StoredTemplate;
use crate::domain::PromptTemplate;

/// GET /prompt_template
pub async fn list_templates(
    State(state): State<AppState>,
    Query(page): Query<PaginationParams>,
) -> Result<Json<Vec<StoredTemplate>>, ApiError> {
    let page = page.validate()?;
    let templates = state.templates.list(page.skip, page.limit).await?;
    Ok(Json(templates))
}

/// POST /prompt_template
pub async fn create_template(
    State(state): State<AppState>,
    Json(template): Json<PromptTemplate>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    debug!(name = %template.name, "Creating prompt template");

    let id = state.templates.create(template).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// GET /prompt_template/{template} - by id or name
pub async fn get_template(
    State(state): State<AppState>,
    Path(template): Path<String>,
) -> Result<Json<StoredTemplate>, ApiError> {
    state
        .templates
        .get(&template)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Prompt template '{}' not found", template)))
}

/// PUT /prompt_template/{template} - by id or name
pub async fn update_template(
    State(state): State<AppState>,
    Path(template): Path<String>,
    Json(new_template): Json<PromptTemplate>,
) -> Result<Json<Value>, ApiError> {
    debug!(template = %template, "Updating prompt template");

    let stored = state.templates.update(&template, new_template).await?;
    Ok(Json(json!({ "id": stored.id })))
}

/// DELETE /prompt_template/{template} - by id or name
pub async fn delete_template(
    State(state): State<AppState>,
    Path(template): Path<String>,
) -> Result<Json<Value>, ApiError> {
    debug!(template = %template, "Deleting prompt template");

    let deleted = state.templates.delete(&template).await?;
    Ok(Json(json!({ "count": u8::from(deleted) })))
}
