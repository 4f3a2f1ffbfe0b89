//! Sales order handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::SalesOrder;
use crate::services::order::{CreateOrderInput, OrderFilter};
use crate::services::{OrderService, ProductService};
use crate::AppState;
use shared::{Area, PaginatedResponse, SALES_ROLE, WAREHOUSE_ROLE};

fn service(state: &AppState) -> OrderService {
    OrderService::new(state.db.clone(), state.feed.clone())
}

/// Salespeople may change their own orders; administrators any order
fn require_owner(user: &AuthUser, order: &SalesOrder) -> AppResult<()> {
    if user.is_admin() || order.salesperson_id == user.user_id {
        Ok(())
    } else {
        Err(AppError::InsufficientPermissions)
    }
}

/// Owners read their orders; warehouse staff read every order of their site
fn require_reader(user: &AuthUser, order: &SalesOrder) -> AppResult<()> {
    if user.role_id == WAREHOUSE_ROLE {
        return user.require_site(&order.site_id);
    }
    require_owner(user, order)
}

/// Narrow a list filter to what the user may see
fn scope_filter(user: &AuthUser, mut filter: OrderFilter) -> AppResult<OrderFilter> {
    if user.is_admin() {
        return Ok(filter);
    }
    match user.role_id.as_str() {
        SALES_ROLE => filter.salesperson_id = Some(user.user_id),
        WAREHOUSE_ROLE => {
            let site_id = user
                .site_id
                .clone()
                .ok_or(AppError::InsufficientPermissions)?;
            filter.site_id = Some(site_id);
        }
        _ => return Err(AppError::InsufficientPermissions),
    }
    Ok(filter)
}

/// Place an order against the day's snapshot of the salesperson's site
pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<SalesOrder>)> {
    user.require(Area::Sales)?;

    let site_id = input
        .site_id
        .clone()
        .or_else(|| user.site_id.clone())
        .ok_or_else(|| {
            AppError::validation("site_id", "A site is required", "La sede es obligatoria")
        })?;
    user.require_site(&site_id)?;

    let products = ProductService::new(state.db.clone(), state.feed.clone());
    let order = service(&state)
        .create_order(user.user_id, &site_id, input, &products)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(filter): Query<OrderFilter>,
) -> AppResult<Json<PaginatedResponse<SalesOrder>>> {
    let filter = scope_filter(&user, filter)?;
    Ok(Json(service(&state).list_orders(&filter).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<SalesOrder>> {
    let order = service(&state).get_order(order_id).await?;
    require_reader(&user, &order)?;
    Ok(Json(order))
}

/// Cancel a pending order, releasing its committed units
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<SalesOrder>> {
    let service = service(&state);
    let order = service.get_order(order_id).await?;
    require_owner(&user, &order)?;

    Ok(Json(service.cancel_order(order_id).await?))
}

/// Mark a pending order delivered (warehouse of the order's site)
pub async fn deliver_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<SalesOrder>> {
    user.require(Area::Warehouse)?;

    let service = service(&state);
    let order = service.get_order(order_id).await?;
    user.require_site(&order.site_id)?;

    Ok(Json(service.deliver_order(order_id).await?))
}
