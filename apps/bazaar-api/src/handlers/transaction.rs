//! Money transaction handlers (`/transaction`, `/transactions`)

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bazaar_core::{AmountRange, MoneyTransaction, NewMoneyTransaction, Page};
use serde::Deserialize;

use super::{parse_id, ApiJson, ListQuery};
use crate::error::ApiError;
use crate::AppState;

/// `?from_amount=&to_amount=`, inclusive, in cents.
#[derive(Debug, Default, Deserialize)]
pub struct AmountQuery {
    pub from_amount: Option<i64>,
    pub to_amount: Option<i64>,
}

impl AmountQuery {
    fn to_range(&self) -> Result<AmountRange, ApiError> {
        if let (Some(from), Some(to)) = (self.from_amount, self.to_amount) {
            if from > to {
                return Err(ApiError::validation(
                    "from_amount must not be greater than to_amount",
                ));
            }
        }

        Ok(AmountRange {
            from_cents: self.from_amount,
            to_cents: self.to_amount,
        })
    }
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewMoneyTransaction>,
) -> Result<(StatusCode, Json<MoneyTransaction>), ApiError> {
    let transaction = state.db.transactions().create(&input).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MoneyTransaction>, ApiError> {
    let id = parse_id(&id)?;
    state
        .db
        .transactions()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Transaction", id))
}

/// Ordered by amount, smallest first.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(amount): Query<AmountQuery>,
) -> Result<Json<Page<MoneyTransaction>>, ApiError> {
    let params = query.to_params(&state.settings.list)?;
    let range = amount.to_range()?;
    Ok(Json(state.db.transactions().list(&range, &params).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewMoneyTransaction>,
) -> Result<Json<MoneyTransaction>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.db.transactions().update(id, &input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.db.transactions().soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
