//! Basket handlers (`/basket`, `/baskets`)

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::{AddToBasket, BasketLine, Page};
use serde::Deserialize;

use super::{filter_id, parse_id, ApiJson, ListQuery};
use crate::error::ApiError;
use crate::AppState;

/// `?sale_id=`
#[derive(Debug, Default, Deserialize)]
pub struct BasketQuery {
    pub sale_id: Option<String>,
}

/// `POST /basket`: adds a quantity of a product to a sale's basket.
///
/// Returns the line as it stands after any merge.
pub async fn add(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<AddToBasket>,
) -> Result<(StatusCode, Json<BasketLine>), ApiError> {
    let line = state.db.checkout().add_to_basket(&input).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BasketLine>, ApiError> {
    let id = parse_id(&id)?;
    state
        .db
        .baskets()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Basket line", id))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<BasketQuery>,
) -> Result<Json<Page<BasketLine>>, ApiError> {
    let params = query.to_params(&state.settings.list)?;
    let sale_id = filter_id("sale_id", &filter.sale_id)?;
    Ok(Json(
        state.db.baskets().list(sale_id.as_deref(), &params).await?,
    ))
}

/// Removes a line from an open sale.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.db.baskets().remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
