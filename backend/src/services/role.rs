//! Role management service

use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::feed::{ChangeFeed, ChangeKind, Collection};
use crate::models::{Role, RoleRow};
use shared::{validate_identifier, validate_name};

/// Role service for managing roles
#[derive(Clone)]
pub struct RoleService {
    db: PgPool,
    feed: ChangeFeed,
}

/// Input for creating a role
#[derive(Debug, Deserialize)]
pub struct CreateRoleInput {
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    pub description: Option<String>,
}

/// Input for updating a role. The identifier cannot change.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleInput {
    #[serde(alias = "nombre")]
    pub name: Option<String>,
    pub description: Option<String>,
}

const ROLE_COLUMNS: &str = "id, name, description, created_at, updated_at";

impl RoleService {
    /// Create a new RoleService instance
    pub fn new(db: PgPool, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// Get all roles
    pub async fn get_roles(&self) -> AppResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {} FROM roles ORDER BY name ASC",
            ROLE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(roles.into_iter().map(Role::from).collect())
    }

    /// Get a role by ID
    pub async fn get_role(&self, role_id: &str) -> AppResult<Role> {
        sqlx::query_as::<_, RoleRow>(&format!("SELECT {} FROM roles WHERE id = $1", ROLE_COLUMNS))
            .bind(role_id)
            .fetch_optional(&self.db)
            .await?
            .map(Role::from)
            .ok_or_else(|| AppError::NotFound("Role".to_string()))
    }

    /// Create a role with an administrator-chosen identifier
    pub async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let id = input.id.trim();
        validate_identifier(id).map_err(|msg| {
            AppError::validation(
                "id",
                msg,
                "El identificador debe tener de 2 a 32 letras, dígitos, '-' o '_'",
            )
        })?;
        validate_name(&input.name)
            .map_err(|msg| AppError::validation("nombre", msg, "El nombre es obligatorio"))?;

        // Check if role id already exists
        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM roles WHERE id = $1")
            .bind(id)
            .fetch_one(&self.db)
            .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("id".to_string()));
        }

        let role = sqlx::query_as::<_, RoleRow>(&format!(
            r#"
            INSERT INTO roles (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            ROLE_COLUMNS
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

        tracing::info!(role_id = %role.id, "Role created");
        self.feed.publish(Collection::Roles, &role.id, ChangeKind::Created);
        Ok(role.into())
    }

    /// Update a role's name or description
    pub async fn update_role(&self, role_id: &str, input: UpdateRoleInput) -> AppResult<Role> {
        let existing = self.get_role(role_id).await?;

        if let Some(ref name) = input.name {
            validate_name(name)
                .map_err(|msg| AppError::validation("nombre", msg, "El nombre es obligatorio"))?;
        }

        let name = input.name.map(|n| n.trim().to_string()).unwrap_or(existing.name);
        let description = input.description.or(existing.description);

        let role = sqlx::query_as::<_, RoleRow>(&format!(
            r#"
            UPDATE roles
            SET name = $1, description = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            ROLE_COLUMNS
        ))
        .bind(&name)
        .bind(&description)
        .bind(role_id)
        .fetch_one(&self.db)
        .await?;

        self.feed.publish(Collection::Roles, role_id, ChangeKind::Updated);
        Ok(role.into())
    }

    /// Delete a role. Users keep the dangling role identifier.
    pub async fn delete_role(&self, role_id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Role".to_string()));
        }

        tracing::info!(role_id = %role_id, "Role deleted");
        self.feed.publish(Collection::Roles, role_id, ChangeKind::Deleted);
        Ok(())
    }
}
