//! Site handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::handlers::SearchQuery;
use crate::models::Site;
use crate::services::site::{CreateSiteInput, UpdateSiteInput};
use crate::services::SiteService;
use crate::AppState;

fn service(state: &AppState) -> SiteService {
    SiteService::new(state.db.clone(), state.feed.clone())
}

pub async fn list_sites(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Site>>> {
    let sites = service(&state).get_sites().await?;
    Ok(Json(shared::filter::search(sites, query.q.as_deref())))
}

pub async fn get_site(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> AppResult<Json<Site>> {
    Ok(Json(service(&state).get_site(&site_id).await?))
}

pub async fn create_site(
    State(state): State<AppState>,
    Json(input): Json<CreateSiteInput>,
) -> AppResult<(StatusCode, Json<Site>)> {
    let site = service(&state).create_site(input).await?;
    Ok((StatusCode::CREATED, Json(site)))
}

pub async fn update_site(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
    Json(input): Json<UpdateSiteInput>,
) -> AppResult<Json<Site>> {
    Ok(Json(service(&state).update_site(&site_id, input).await?))
}

pub async fn delete_site(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> AppResult<StatusCode> {
    service(&state).delete_site(&site_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
