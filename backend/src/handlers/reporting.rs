//! Reporting handlers for sales and inventory summaries and CSV export

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;

use crate::error::AppResult;
use crate::services::reporting::{InventoryReport, ReportFilter, SalesReport};
use crate::services::{InventoryService, OrderService, ReferenceService, ReportingService};
use crate::AppState;

fn service(state: &AppState) -> ReportingService {
    ReportingService::new(
        OrderService::new(state.db.clone(), state.feed.clone()),
        InventoryService::new(state.db.clone(), state.feed.clone()),
    )
}

/// Sales totals by product and salesperson
pub async fn get_sales_summary(
    State(state): State<AppState>,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Json<SalesReport>> {
    Ok(Json(service(&state).sales_summary(&filter).await?))
}

/// Per-category totals of one daily snapshot
pub async fn get_inventory_summary(
    State(state): State<AppState>,
    Path((site_id, date)): Path<(String, NaiveDate)>,
) -> AppResult<Json<InventoryReport>> {
    let reference = ReferenceService::new(state.db.clone(), state.feed.clone())
        .load()
        .await?;
    Ok(Json(
        service(&state)
            .inventory_summary(&site_id, date, &reference)
            .await?,
    ))
}

/// Order lines in the period as a CSV download
pub async fn export_sales_csv(
    State(state): State<AppState>,
    Query(filter): Query<ReportFilter>,
) -> AppResult<impl IntoResponse> {
    let reference = ReferenceService::new(state.db.clone(), state.feed.clone())
        .load()
        .await?;
    let csv = service(&state).sales_csv(&filter, &reference).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"sales.csv\""),
        ],
        csv,
    ))
}
