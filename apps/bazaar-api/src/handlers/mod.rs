//! HTTP handlers, one module per resource.
//!
//! Handlers stay thin: extract and check the request, call one repository
//! method, map the result. Business rules live in bazaar-core and the
//! checkout transaction in bazaar-db.

pub mod basket;
pub mod branch;
pub mod category;
pub mod health;
pub mod ledger;
pub mod product;
pub mod sale;
pub mod staff;
pub mod stock;
pub mod tariff;
pub mod transaction;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use bazaar_core::validation::{validate_id, validate_search_query};
use bazaar_core::ListParams;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ListSettings;
use crate::error::ApiError;

// =============================================================================
// JSON Body Extractor
// =============================================================================

/// Works like [`axum::Json`], but a body that fails to parse becomes an
/// [`ApiError`] so every 400 has the same shape.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                ApiError::validation(format!("Invalid JSON: {}", rejection.body_text()))
            })?;

        Ok(ApiJson(value))
    }
}

// =============================================================================
// Path Ids
// =============================================================================

/// Rejects path ids that are not UUIDs.
pub fn parse_id(id: &str) -> Result<&str, ApiError> {
    validate_id("id", id).map_err(|e| ApiError::validation(e.to_string()))?;
    Ok(id)
}

// =============================================================================
// Query Strings
// =============================================================================

/// `?page=&limit=&search=` shared by every list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl ListQuery {
    /// Resolves defaults and clamps the page size to the configured maximum.
    pub fn to_params(&self, settings: &ListSettings) -> Result<ListParams, ApiError> {
        let limit = self
            .limit
            .unwrap_or(settings.default_limit)
            .min(settings.max_limit);
        let params = ListParams::new(self.page.unwrap_or(1), limit);

        match &self.search {
            Some(search) => {
                let search =
                    validate_search_query(search).map_err(|e| ApiError::validation(e.to_string()))?;
                Ok(params.with_search(search))
            }
            None => Ok(params),
        }
    }
}

/// Optional id filter; an empty value counts as absent.
fn filter_id(field: &str, value: &Option<String>) -> Result<Option<String>, ApiError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => {
            validate_id(field, id).map_err(|e| ApiError::validation(e.to_string()))?;
            Ok(Some(id.to_string()))
        }
    }
}
