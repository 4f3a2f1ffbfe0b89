//! Beverage type handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::handlers::SearchQuery;
use crate::models::BeverageType;
use crate::services::beverage::{CreateBeverageTypeInput, UpdateBeverageTypeInput};
use crate::services::BeverageTypeService;
use crate::AppState;

fn service(state: &AppState) -> BeverageTypeService {
    BeverageTypeService::new(state.db.clone(), state.feed.clone())
}

pub async fn list_beverage_types(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<BeverageType>>> {
    let types = service(&state).get_beverage_types().await?;
    Ok(Json(shared::filter::search(types, query.q.as_deref())))
}

pub async fn get_beverage_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BeverageType>> {
    Ok(Json(service(&state).get_beverage_type(&id).await?))
}

pub async fn create_beverage_type(
    State(state): State<AppState>,
    Json(input): Json<CreateBeverageTypeInput>,
) -> AppResult<(StatusCode, Json<BeverageType>)> {
    let beverage_type = service(&state).create_beverage_type(input).await?;
    Ok((StatusCode::CREATED, Json(beverage_type)))
}

pub async fn update_beverage_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateBeverageTypeInput>,
) -> AppResult<Json<BeverageType>> {
    Ok(Json(service(&state).update_beverage_type(&id, input).await?))
}

pub async fn delete_beverage_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    service(&state).delete_beverage_type(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
