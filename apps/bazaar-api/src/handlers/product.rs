//! Product handlers (`/product`, `/products`)

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::{NewProduct, Page, Product};

use super::{parse_id, ApiJson, ListQuery};
use crate::error::ApiError;
use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.db.products().create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&id)?;
    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", id))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Product>>, ApiError> {
    let params = query.to_params(&state.settings.list)?;
    Ok(Json(state.db.products().list(&params).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewProduct>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.products().update(id, &input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.db.products().soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
