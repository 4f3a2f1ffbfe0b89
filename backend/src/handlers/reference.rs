//! Reference data handler

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::models::ReferenceData;
use crate::services::ReferenceService;
use crate::AppState;

/// Roles, sites and beverage types in one bundle
pub async fn get_reference(State(state): State<AppState>) -> AppResult<Json<ReferenceData>> {
    let service = ReferenceService::new(state.db.clone(), state.feed.clone());
    Ok(Json(service.load().await?))
}
