//! Stock ledger handlers (`/rtransaction`, `/rtransactions`)
//!
//! The ledger is append-only: no update or delete routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::{LedgerEntry, LedgerFilter, NewLedgerEntry, Page};
use serde::Deserialize;

use super::{filter_id, parse_id, ApiJson, ListQuery};
use crate::error::ApiError;
use crate::AppState;

/// `?product_id=&staff_id=`
#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    pub product_id: Option<String>,
    pub staff_id: Option<String>,
}

/// Records a manual movement ("plus" for deliveries, "minus" for write-offs).
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewLedgerEntry>,
) -> Result<(StatusCode, Json<LedgerEntry>), ApiError> {
    let entry = state.db.ledger().create(&input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LedgerEntry>, ApiError> {
    let id = parse_id(&id)?;
    state
        .db
        .ledger()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Ledger entry", id))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<LedgerQuery>,
) -> Result<Json<Page<LedgerEntry>>, ApiError> {
    let params = query.to_params(&state.settings.list)?;
    let filter = LedgerFilter {
        product_id: filter_id("product_id", &filter.product_id)?,
        staff_id: filter_id("staff_id", &filter.staff_id)?,
    };
    Ok(Json(state.db.ledger().list(&filter, &params).await?))
}
