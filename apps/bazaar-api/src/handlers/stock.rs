//! Stock handlers (`/repository`, `/repositories`)
//!
//! Inventory management writes counts directly. Sales never touch these
//! routes; settlement debits stock inside its own transaction.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::{NewStockRecord, Page, StockFilter, StockRecord};
use serde::Deserialize;

use super::{filter_id, parse_id, ApiJson, ListQuery};
use crate::error::ApiError;
use crate::AppState;

/// `?product_id=&branch_id=`
#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    pub product_id: Option<String>,
    pub branch_id: Option<String>,
}

impl StockQuery {
    fn to_filter(&self) -> Result<StockFilter, ApiError> {
        Ok(StockFilter {
            product_id: filter_id("product_id", &self.product_id)?,
            branch_id: filter_id("branch_id", &self.branch_id)?,
        })
    }
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewStockRecord>,
) -> Result<(StatusCode, Json<StockRecord>), ApiError> {
    let record = state.db.stock().create(&input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StockRecord>, ApiError> {
    let id = parse_id(&id)?;
    state
        .db
        .stock()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Stock record", id))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<StockQuery>,
) -> Result<Json<Page<StockRecord>>, ApiError> {
    let params = query.to_params(&state.settings.list)?;
    let filter = filter.to_filter()?;
    Ok(Json(state.db.stock().list(&filter, &params).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewStockRecord>,
) -> Result<Json<StockRecord>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.stock().update(id, &input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.db.stock().soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
