//! Role management HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::handlers::SearchQuery;
use crate::models::Role;
use crate::services::role::{CreateRoleInput, UpdateRoleInput};
use crate::services::RoleService;
use crate::AppState;

fn service(state: &AppState) -> RoleService {
    RoleService::new(state.db.clone(), state.feed.clone())
}

/// List all roles
pub async fn list_roles(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Role>>> {
    let roles = service(&state).get_roles().await?;
    Ok(Json(shared::filter::search(roles, query.q.as_deref())))
}

pub async fn get_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> AppResult<Json<Role>> {
    Ok(Json(service(&state).get_role(&role_id).await?))
}

pub async fn create_role(
    State(state): State<AppState>,
    Json(input): Json<CreateRoleInput>,
) -> AppResult<(StatusCode, Json<Role>)> {
    let role = service(&state).create_role(input).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
    Json(input): Json<UpdateRoleInput>,
) -> AppResult<Json<Role>> {
    Ok(Json(service(&state).update_role(&role_id, input).await?))
}

pub async fn delete_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> AppResult<StatusCode> {
    service(&state).delete_role(&role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
