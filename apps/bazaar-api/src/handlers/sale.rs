//! Sale handlers (`/sale`, `/sales`, `/end-sell/{id}`)

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::{NewSale, Page, Sale};

use super::{parse_id, ApiJson, ListQuery};
use crate::error::ApiError;
use crate::AppState;

/// Opens a sale: status `in_process`, price 0.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewSale>,
) -> Result<(StatusCode, Json<Sale>), ApiError> {
    let sale = state.db.sales().create(&input).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Sale>, ApiError> {
    let id = parse_id(&id)?;
    state
        .db
        .sales()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sale", id))
}

/// Newest first; `search` matches the client name.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Sale>>, ApiError> {
    let params = query.to_params(&state.settings.list)?;
    Ok(Json(state.db.sales().list(&params).await?))
}

/// Edits an open sale. Status and price only change through settlement.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewSale>,
) -> Result<Json<Sale>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.sales().update(id, &input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.db.sales().soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /end-sell/{id}`: settles the sale and returns it with its final price.
pub async fn settle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Sale>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.checkout().settle_sale(id).await?))
}
