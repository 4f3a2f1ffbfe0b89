//! User management handlers (administration)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::{User, UserView};
use crate::services::user::{CreateUserInput, UpdateUserInput, UserFilter};
use crate::services::{ReferenceService, UserService};
use crate::AppState;

fn service(state: &AppState) -> UserService {
    UserService::new(state.db.clone(), state.feed.clone())
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> AppResult<Json<Vec<UserView>>> {
    let reference = ReferenceService::new(state.db.clone(), state.feed.clone())
        .load()
        .await?;
    Ok(Json(service(&state).get_users(&filter, &reference).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<User>> {
    Ok(Json(service(&state).get_user(user_id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = service(&state).create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<Json<User>> {
    Ok(Json(service(&state).update_user(user_id, input).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service(&state).delete_user(actor.user_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
