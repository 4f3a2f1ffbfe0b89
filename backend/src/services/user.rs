//! User account management service

use serde::{Deserialize, Deserializer};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::feed::{ChangeFeed, ChangeKind, Collection};
use crate::models::{ReferenceData, User, UserRow, UserView};
use crate::services::AuthService;
use shared::{normalize_email, validate_identifier, validate_name};

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
    feed: ChangeFeed,
}

/// Input for creating a user account
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(email)]
    pub email: String,
    pub name: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub role_id: String,
    pub site_id: Option<String>,
}

/// Input for updating a user. Email and password are not editable here.
#[derive(Debug, Deserialize)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub role_id: Option<String>,
    /// `Some(None)` clears the site
    #[serde(default, deserialize_with = "present")]
    pub site_id: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Filters for the users table
#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    pub q: Option<String>,
    pub role_id: Option<String>,
    pub site_id: Option<String>,
}

const USER_COLUMNS: &str =
    "id, email, name, role_id, site_id, is_active, created_at, updated_at";

impl UserService {
    pub fn new(db: PgPool, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// List users with their role and site labels resolved
    pub async fn get_users(
        &self,
        filter: &UserFilter,
        reference: &ReferenceData,
    ) -> AppResult<Vec<UserView>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE ($1::TEXT IS NULL OR role_id = $1)
              AND ($2::TEXT IS NULL OR site_id = $2)
            ORDER BY name ASC
            "#,
            USER_COLUMNS
        ))
        .bind(&filter.role_id)
        .bind(&filter.site_id)
        .fetch_all(&self.db)
        .await?;

        let users = shared::filter::search(
            rows.into_iter().map(User::from).collect(),
            filter.q.as_deref(),
        );

        Ok(users
            .into_iter()
            .map(|user| view(user, reference))
            .collect())
    }

    pub async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .map(User::from)
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<User> {
        input.validate()?;
        validate_name(&input.name)
            .map_err(|msg| AppError::validation("name", msg, "El nombre es obligatorio"))?;
        validate_identifier(&input.role_id)
            .map_err(|msg| AppError::validation("role_id", msg, "Rol inválido"))?;

        let email = normalize_email(&input.email);

        let existing =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE LOWER(email) = $1")
                .bind(&email)
                .fetch_one(&self.db)
                .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = AuthService::hash_password(&input.password)?;

        let user = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, name, role_id, site_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&password_hash)
        .bind(input.name.trim())
        .bind(&input.role_id)
        .bind(&input.site_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("email".to_string())
            } else {
                e.into()
            }
        })?;

        tracing::info!(user_id = %user.id, role = %user.role_id, "User created");
        self.feed.publish(Collection::Users, user.id, ChangeKind::Created);
        Ok(user.into())
    }

    pub async fn update_user(&self, user_id: Uuid, input: UpdateUserInput) -> AppResult<User> {
        let existing = self.get_user(user_id).await?;

        if let Some(ref name) = input.name {
            validate_name(name)
                .map_err(|msg| AppError::validation("name", msg, "El nombre es obligatorio"))?;
        }
        if let Some(ref role_id) = input.role_id {
            validate_identifier(role_id)
                .map_err(|msg| AppError::validation("role_id", msg, "Rol inválido"))?;
        }

        let user = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET name = $1, role_id = $2, site_id = $3, is_active = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(input.name.map(|n| n.trim().to_string()).unwrap_or(existing.name))
        .bind(input.role_id.unwrap_or(existing.role_id))
        .bind(input.site_id.unwrap_or(existing.site_id))
        .bind(input.is_active.unwrap_or(existing.is_active))
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        self.feed.publish(Collection::Users, user_id, ChangeKind::Updated);
        Ok(user.into())
    }

    /// Delete a user account. Administrators cannot delete themselves.
    pub async fn delete_user(&self, actor_id: Uuid, user_id: Uuid) -> AppResult<()> {
        if actor_id == user_id {
            return Err(AppError::validation(
                "id",
                "You cannot delete your own account",
                "No puedes eliminar tu propia cuenta",
            ));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        tracing::info!(user_id = %user_id, "User deleted");
        self.feed.publish(Collection::Users, user_id, ChangeKind::Deleted);
        Ok(())
    }
}

/// A field that is present in the payload, even as `null`
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn view(user: User, reference: &ReferenceData) -> UserView {
    UserView {
        role_label: reference.role_label(&user.role_id),
        site_label: user.site_id.as_deref().map(|id| reference.site_label(id)),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_input_rejects_short_password() {
        let input = CreateUserInput {
            email: "ana@example.com".into(),
            name: "Ana".into(),
            password: "12345".into(),
            role_id: "ventas".into(),
            site_id: Some("GDL".into()),
        };
        let err = AppError::from(input.validate().unwrap_err());
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "password"));
    }

    #[test]
    fn test_create_input_rejects_bad_email() {
        let input = CreateUserInput {
            email: "not-an-email".into(),
            name: "Ana".into(),
            password: "123456".into(),
            role_id: "ventas".into(),
            site_id: None,
        };
        let err = AppError::from(input.validate().unwrap_err());
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "email"));
    }

    #[test]
    fn test_update_input_distinguishes_cleared_site() {
        let cleared: UpdateUserInput = serde_json::from_str(r#"{"site_id": null}"#).unwrap();
        assert_eq!(cleared.site_id, Some(None));

        let untouched: UpdateUserInput = serde_json::from_str(r#"{"name": "Ana"}"#).unwrap();
        assert_eq!(untouched.site_id, None);
    }
}
