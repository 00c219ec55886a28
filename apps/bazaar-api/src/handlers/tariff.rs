//! Staff tariff handlers (`/staff-tariff`, `/staff-tariffs`)

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::{NewStaffTariff, Page, StaffTariff};

use super::{parse_id, ApiJson, ListQuery};
use crate::error::ApiError;
use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewStaffTariff>,
) -> Result<(StatusCode, Json<StaffTariff>), ApiError> {
    let tariff = state.db.tariffs().create(&input).await?;
    Ok((StatusCode::CREATED, Json(tariff)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StaffTariff>, ApiError> {
    let id = parse_id(&id)?;
    state
        .db
        .tariffs()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Staff tariff", id))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<StaffTariff>>, ApiError> {
    let params = query.to_params(&state.settings.list)?;
    Ok(Json(state.db.tariffs().list(&params).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewStaffTariff>,
) -> Result<Json<StaffTariff>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.tariffs().update(id, &input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.db.tariffs().soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
