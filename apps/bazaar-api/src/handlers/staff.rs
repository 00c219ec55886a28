//! Staff handlers (`/staff`, `/staffs`)
//!
//! Responses carry the member's current age; the password hash never
//! leaves the database layer.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::{NewStaff, Page, PasswordChange, Staff, StaffUpdate};
use chrono::Utc;
use serde::Serialize;

use super::{parse_id, ApiJson, ListQuery};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StaffView {
    #[serde(flatten)]
    pub staff: Staff,
    pub age: u32,
}

impl From<Staff> for StaffView {
    fn from(staff: Staff) -> Self {
        let age = staff.age_on(Utc::now().date_naive());
        StaffView { staff, age }
    }
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewStaff>,
) -> Result<(StatusCode, Json<StaffView>), ApiError> {
    let staff = state.db.staff().create(&input).await?;
    Ok((StatusCode::CREATED, Json(staff.into())))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StaffView>, ApiError> {
    let id = parse_id(&id)?;
    state
        .db
        .staff()
        .get_by_id(id)
        .await?
        .map(|staff| Json(staff.into()))
        .ok_or_else(|| ApiError::not_found("Staff", id))
}

/// `search` matches name or login.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<StaffView>>, ApiError> {
    let params = query.to_params(&state.settings.list)?;
    let page = state.db.staff().list(&params).await?;

    Ok(Json(Page {
        items: page.items.into_iter().map(StaffView::from).collect(),
        count: page.count,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<StaffUpdate>,
) -> Result<Json<StaffView>, ApiError> {
    let id = parse_id(&id)?;
    let staff = state.db.staff().update(id, &input).await?;
    Ok(Json(staff.into()))
}

/// `PATCH /staff/{id}`: changes the password after checking the old one.
pub async fn change_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<PasswordChange>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.db.staff().change_password(id, &input).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.db.staff().soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
