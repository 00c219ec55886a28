//! Category handlers (`/category`, `/categories`)

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::{Category, NewCategory, Page};

use super::{parse_id, ApiJson, ListQuery};
use crate::error::ApiError;
use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state.db.categories().create(&input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    let id = parse_id(&id)?;
    state
        .db
        .categories()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category", id))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Category>>, ApiError> {
    let params = query.to_params(&state.settings.list)?;
    Ok(Json(state.db.categories().list(&params).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewCategory>,
) -> Result<Json<Category>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.categories().update(id, &input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.db.categories().soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
