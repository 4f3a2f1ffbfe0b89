//! Site (sede) management service

use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::feed::{ChangeFeed, ChangeKind, Collection};
use crate::models::{Site, SiteRow};
use shared::{validate_identifier, validate_name};

/// Site service
#[derive(Clone)]
pub struct SiteService {
    db: PgPool,
    feed: ChangeFeed,
}

/// Input for creating a site
#[derive(Debug, Deserialize)]
pub struct CreateSiteInput {
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    pub address: Option<String>,
}

/// Input for updating a site. The code cannot change.
#[derive(Debug, Deserialize)]
pub struct UpdateSiteInput {
    #[serde(alias = "nombre")]
    pub name: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

const SITE_COLUMNS: &str = "id, name, address, is_active, created_at, updated_at";

impl SiteService {
    pub fn new(db: PgPool, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    pub async fn get_sites(&self) -> AppResult<Vec<Site>> {
        let sites = sqlx::query_as::<_, SiteRow>(&format!(
            "SELECT {} FROM sites ORDER BY name ASC",
            SITE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(sites.into_iter().map(Site::from).collect())
    }

    pub async fn get_site(&self, site_id: &str) -> AppResult<Site> {
        sqlx::query_as::<_, SiteRow>(&format!("SELECT {} FROM sites WHERE id = $1", SITE_COLUMNS))
            .bind(site_id)
            .fetch_optional(&self.db)
            .await?
            .map(Site::from)
            .ok_or_else(|| AppError::NotFound("Site".to_string()))
    }

    pub async fn create_site(&self, input: CreateSiteInput) -> AppResult<Site> {
        let id = input.id.trim();
        validate_identifier(id).map_err(|msg| {
            AppError::validation(
                "id",
                msg,
                "El código debe tener de 2 a 32 letras, dígitos, '-' o '_'",
            )
        })?;
        validate_name(&input.name)
            .map_err(|msg| AppError::validation("nombre", msg, "El nombre es obligatorio"))?;

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sites WHERE id = $1")
            .bind(id)
            .fetch_one(&self.db)
            .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("id".to_string()));
        }

        let site = sqlx::query_as::<_, SiteRow>(&format!(
            r#"
            INSERT INTO sites (id, name, address)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            SITE_COLUMNS
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.address)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("id".to_string())
            } else {
                e.into()
            }
        })?;

        tracing::info!(site_id = %site.id, "Site created");
        self.feed.publish(Collection::Sites, &site.id, ChangeKind::Created);
        Ok(site.into())
    }

    pub async fn update_site(&self, site_id: &str, input: UpdateSiteInput) -> AppResult<Site> {
        let existing = self.get_site(site_id).await?;

        if let Some(ref name) = input.name {
            validate_name(name)
                .map_err(|msg| AppError::validation("nombre", msg, "El nombre es obligatorio"))?;
        }

        let site = sqlx::query_as::<_, SiteRow>(&format!(
            r#"
            UPDATE sites
            SET name = $1, address = $2, is_active = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {}
            "#,
            SITE_COLUMNS
        ))
        .bind(input.name.map(|n| n.trim().to_string()).unwrap_or(existing.name))
        .bind(input.address.or(existing.address))
        .bind(input.is_active.unwrap_or(existing.is_active))
        .bind(site_id)
        .fetch_one(&self.db)
        .await?;

        self.feed.publish(Collection::Sites, site_id, ChangeKind::Updated);
        Ok(site.into())
    }

    /// Hard delete. Products, users and snapshots keep the dangling site code.
    pub async fn delete_site(&self, site_id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM sites WHERE id = $1")
            .bind(site_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Site".to_string()));
        }

        tracing::info!(site_id = %site_id, "Site deleted");
        self.feed.publish(Collection::Sites, site_id, ChangeKind::Deleted);
        Ok(())
    }
}
