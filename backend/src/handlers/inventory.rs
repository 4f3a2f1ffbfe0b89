//! Daily inventory handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{DailyInventory, SaveInventoryInput};
use crate::services::inventory::{InventoryView, SnapshotRangeQuery, SnapshotSummary};
use crate::services::{InventoryService, ProductService, ReferenceService};
use crate::AppState;
use shared::Area;

/// Warehouse staff and salespeople both read counts of their own site
fn require_reader(user: &AuthUser, site_id: &str) -> AppResult<()> {
    if !(user.can_enter(Area::Warehouse) || user.can_enter(Area::Sales)) {
        return Err(AppError::InsufficientPermissions);
    }
    user.require_site(site_id)
}

/// Snapshot of a site and day, with box/unit breakdown of every line
pub async fn get_inventory(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((site_id, date)): Path<(String, NaiveDate)>,
) -> AppResult<Json<InventoryView>> {
    require_reader(&user, &site_id)?;

    let reference = ReferenceService::new(state.db.clone(), state.feed.clone())
        .load()
        .await?;
    let products = ProductService::new(state.db.clone(), state.feed.clone());
    let view = InventoryService::new(state.db.clone(), state.feed.clone())
        .get_view(&site_id, date, &products, &reference)
        .await?;
    Ok(Json(view))
}

/// Saved snapshot dates of a site
pub async fn list_snapshots(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(site_id): Path<String>,
    Query(range): Query<SnapshotRangeQuery>,
) -> AppResult<Json<Vec<SnapshotSummary>>> {
    require_reader(&user, &site_id)?;

    let service = InventoryService::new(state.db.clone(), state.feed.clone());
    Ok(Json(service.list_snapshots(&site_id, &range).await?))
}

/// Save the staged lines of a draft
pub async fn save_inventory(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((site_id, date)): Path<(String, NaiveDate)>,
    Json(input): Json<SaveInventoryInput>,
) -> AppResult<Json<DailyInventory>> {
    user.require(Area::Warehouse)?;
    user.require_site(&site_id)?;

    let products = ProductService::new(state.db.clone(), state.feed.clone());
    let saved = InventoryService::new(state.db.clone(), state.feed.clone())
        .save_inventory(user.user_id, &site_id, date, input, &products)
        .await?;
    Ok(Json(saved))
}
