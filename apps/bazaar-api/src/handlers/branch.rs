//! Branch handlers (`/branch`, `/branches`)

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::{Branch, NewBranch, Page};

use super::{parse_id, ApiJson, ListQuery};
use crate::error::ApiError;
use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewBranch>,
) -> Result<(StatusCode, Json<Branch>), ApiError> {
    let branch = state.db.branches().create(&input).await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Branch>, ApiError> {
    let id = parse_id(&id)?;
    state
        .db
        .branches()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Branch", id))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Branch>>, ApiError> {
    let params = query.to_params(&state.settings.list)?;
    Ok(Json(state.db.branches().list(&params).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewBranch>,
) -> Result<Json<Branch>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.branches().update(id, &input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.db.branches().soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
