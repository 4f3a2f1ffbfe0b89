//! Product catalogue handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::{Product, ProductView};
use crate::services::product::{CreateProductInput, ProductFilter, UpdateProductInput};
use crate::services::{ProductService, ReferenceService};
use crate::AppState;
use shared::Area;

fn service(state: &AppState) -> ProductService {
    ProductService::new(state.db.clone(), state.feed.clone())
}

/// List products. Staff tied to a site see that site's catalogue unless they ask for another.
pub async fn list_products(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(mut filter): Query<ProductFilter>,
) -> AppResult<Json<Vec<ProductView>>> {
    if !user.is_admin() && filter.site_id.is_none() {
        filter.site_id = user.site_id.clone();
    }

    let reference = ReferenceService::new(state.db.clone(), state.feed.clone())
        .load()
        .await?;
    Ok(Json(service(&state).get_products(&filter, &reference).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    Ok(Json(service(&state).get_product(product_id).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    user.require(Area::Administration)?;
    let product = service(&state).create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    user.require(Area::Administration)?;
    Ok(Json(service(&state).update_product(product_id, input).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    user.require(Area::Administration)?;
    service(&state).delete_product(product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
