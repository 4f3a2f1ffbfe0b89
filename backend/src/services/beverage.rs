//! Beverage type management service

use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::feed::{ChangeFeed, ChangeKind, Collection};
use crate::models::{BeverageType, BeverageTypeRow};
use shared::{validate_identifier, validate_name};

#[derive(Clone)]
pub struct BeverageTypeService {
    db: PgPool,
    feed: ChangeFeed,
}

#[derive(Debug, Deserialize)]
pub struct CreateBeverageTypeInput {
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBeverageTypeInput {
    #[serde(alias = "nombre")]
    pub name: Option<String>,
    pub description: Option<String>,
}

const BEVERAGE_TYPE_COLUMNS: &str = "id, name, description, created_at, updated_at";

impl BeverageTypeService {
    pub fn new(db: PgPool, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    pub async fn get_beverage_types(&self) -> AppResult<Vec<BeverageType>> {
        let types = sqlx::query_as::<_, BeverageTypeRow>(&format!(
            "SELECT {} FROM beverage_types ORDER BY name ASC",
            BEVERAGE_TYPE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(types.into_iter().map(BeverageType::from).collect())
    }

    pub async fn get_beverage_type(&self, id: &str) -> AppResult<BeverageType> {
        sqlx::query_as::<_, BeverageTypeRow>(&format!(
            "SELECT {} FROM beverage_types WHERE id = $1",
            BEVERAGE_TYPE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(BeverageType::from)
        .ok_or_else(|| AppError::NotFound("Beverage type".to_string()))
    }

    pub async fn create_beverage_type(&self, input: CreateBeverageTypeInput) -> AppResult<BeverageType> {
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

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM beverage_types WHERE id = $1")
                .bind(id)
                .fetch_one(&self.db)
                .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("id".to_string()));
        }

        let beverage_type = sqlx::query_as::<_, BeverageTypeRow>(&format!(
            r#"
            INSERT INTO beverage_types (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            BEVERAGE_TYPE_COLUMNS
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("id".to_string())
            } else {
                e.into()
            }
        })?;

        self.feed
            .publish(Collection::BeverageTypes, &beverage_type.id, ChangeKind::Created);
        Ok(beverage_type.into())
    }

    pub async fn update_beverage_type(
        &self,
        id: &str,
        input: UpdateBeverageTypeInput,
    ) -> AppResult<BeverageType> {
        let existing = self.get_beverage_type(id).await?;

        if let Some(ref name) = input.name {
            validate_name(name)
                .map_err(|msg| AppError::validation("nombre", msg, "El nombre es obligatorio"))?;
        }

        let beverage_type = sqlx::query_as::<_, BeverageTypeRow>(&format!(
            r#"
            UPDATE beverage_types
            SET name = $1, description = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            BEVERAGE_TYPE_COLUMNS
        ))
        .bind(input.name.map(|n| n.trim().to_string()).unwrap_or(existing.name))
        .bind(input.description.or(existing.description))
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        self.feed
            .publish(Collection::BeverageTypes, id, ChangeKind::Updated);
        Ok(beverage_type.into())
    }

    pub async fn delete_beverage_type(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM beverage_types WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Beverage type".to_string()));
        }

        self.feed
            .publish(Collection::BeverageTypes, id, ChangeKind::Deleted);
        Ok(())
    }
}
