//! Authentication service for login, session and token management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::{BootstrapAdminConfig, Config};
use crate::error::{AppError, AppResult};
use crate::models::{Session, UserRow};
use shared::{label_or_id, normalize_email, validate_password, ADMIN_ROLE};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub role_id: String,
    pub site_id: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    #[serde(skip)]
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Credentials row used at login
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    role_id: String,
    site_id: Option<String>,
    password_hash: String,
    is_active: bool,
}

/// Input for changing the signed-in user's password
#[derive(Debug, Deserialize)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Authenticate user with email and password
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        let invalid = || AppError::unauthorized("Invalid email or password", "Correo o contraseña incorrectos");

        // Find user by email
        let user = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, role_id, site_id, password_hash, is_active
            FROM users
            WHERE LOWER(email) = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(invalid)?;

        // Check if user is active
        if !user.is_active {
            return Err(AppError::unauthorized("Account is disabled", "La cuenta está deshabilitada"));
        }

        // Verify password
        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            tracing::info!(user_id = %user.id, "Rejected login with wrong password");
            return Err(invalid());
        }

        // Update last login
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let tokens = self.generate_tokens(user.id, &user.role_id, user.site_id.as_deref())?;
        self.store_refresh_token(user.id, &tokens.refresh_token).await?;

        tracing::info!(user_id = %user.id, role = %user.role_id, "User signed in");
        Ok(tokens)
    }

    /// Refresh access token using refresh token
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let token_hash = Self::hash_token(refresh_token);

        // Revoke and read in one statement: of two concurrent refreshes only one
        // sees the token unrevoked. Role and site are read fresh so
        // reassignments apply on the next refresh.
        let (user_id, role_id, site_id) = sqlx::query_as::<_, (Uuid, String, Option<String>)>(
            r#"
            WITH consumed AS (
                UPDATE refresh_tokens
                SET revoked_at = NOW()
                WHERE token_hash = $1
                  AND revoked_at IS NULL
                  AND expires_at > NOW()
                RETURNING user_id
            )
            SELECT u.id, u.role_id, u.site_id
            FROM consumed c
            JOIN users u ON u.id = c.user_id
            WHERE u.is_active = true
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| {
            AppError::unauthorized(
                "Invalid or expired refresh token",
                "El token de renovación no es válido o expiró",
            )
        })?;

        let tokens = self.generate_tokens(user_id, &role_id, site_id.as_deref())?;
        self.store_refresh_token(user_id, &tokens.refresh_token).await?;

        Ok(tokens)
    }

    /// Sign out: revoke the given refresh token, or every token of the user
    pub async fn logout(&self, user_id: Uuid, refresh_token: Option<&str>) -> AppResult<()> {
        match refresh_token {
            Some(token) => {
                sqlx::query(
                    "UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1 AND user_id = $2 AND revoked_at IS NULL",
                )
                .bind(Self::hash_token(token))
                .bind(user_id)
                .execute(&self.db)
                .await?;
            }
            None => {
                sqlx::query(
                    "UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
                )
                .bind(user_id)
                .execute(&self.db)
                .await?;
            }
        }

        tracing::info!(user_id = %user_id, "User signed out");
        Ok(())
    }

    /// Current identity with role and site labels resolved
    pub async fn current_session(&self, user_id: Uuid) -> AppResult<Session> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, role_id, site_id, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let role_name = sqlx::query_scalar::<_, String>("SELECT name FROM roles WHERE id = $1")
            .bind(&user.role_id)
            .fetch_optional(&self.db)
            .await?;

        let site_label = match &user.site_id {
            Some(site_id) => {
                let site_name =
                    sqlx::query_scalar::<_, String>("SELECT name FROM sites WHERE id = $1")
                        .bind(site_id)
                        .fetch_optional(&self.db)
                        .await?;
                Some(label_or_id(
                    site_name.as_deref().map(|name| (site_id.as_str(), name)),
                    site_id,
                ))
            }
            None => None,
        };

        Ok(Session {
            role_label: label_or_id(
                role_name.as_deref().map(|name| (user.role_id.as_str(), name)),
                &user.role_id,
            ),
            site_label,
            user: user.into(),
        })
    }

    /// Change the signed-in user's password after re-checking the current one
    pub async fn change_password(&self, user_id: Uuid, input: ChangePasswordInput) -> AppResult<()> {
        validate_password(&input.new_password).map_err(|msg| {
            AppError::validation(
                "new_password",
                msg,
                "La contraseña debe tener al menos 6 caracteres",
            )
        })?;

        let current_hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        let valid = verify(&input.current_password, &current_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::validation(
                "current_password",
                "Current password is incorrect",
                "La contraseña actual es incorrecta",
            ));
        }

        let new_hash = Self::hash_password(&input.new_password)?;

        let mut tx = self.db.begin().await?;
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&new_hash)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        // Other sessions must sign in again
        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Create the configured administrator when no user exists yet
    pub async fn ensure_bootstrap_admin(&self, admin: &BootstrapAdminConfig) -> AppResult<()> {
        let user_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        if user_count > 0 {
            return Ok(());
        }

        validate_password(&admin.password).map_err(|msg| {
            AppError::validation("bootstrap_admin.password", msg, "Contraseña demasiado corta")
        })?;

        let password_hash = Self::hash_password(&admin.password)?;
        sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, name, role_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(normalize_email(&admin.email))
        .bind(&password_hash)
        .bind(&admin.name)
        .bind(ADMIN_ROLE)
        .execute(&self.db)
        .await?;

        tracing::info!(email = %admin.email, "Created bootstrap administrator");
        Ok(())
    }

    /// Validate access token and return claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => {
                AppError::unauthorized("Token has expired", "La sesión expiró")
            }
            _ => AppError::unauthorized(&format!("Invalid token: {}", e), "Token no válido"),
        })?;

        Ok(token_data.claims)
    }

    /// Hash a password with bcrypt
    pub fn hash_password(password: &str) -> AppResult<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Generate access and refresh tokens
    fn generate_tokens(
        &self,
        user_id: Uuid,
        role_id: &str,
        site_id: Option<&str>,
    ) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.access_token_expiry);

        let access_claims = Claims {
            sub: user_id.to_string(),
            role_id: role_id.to_string(),
            site_id: site_id.map(str::to_string),
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        // Refresh token (opaque random token)
        let refresh_token = Uuid::new_v4().to_string();

        Ok(AuthTokens {
            user_id,
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    /// Store refresh token in database
    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let token_hash = Self::hash_token(token);
        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// SHA-256 of a refresh token, hex encoded, for storage
    fn hash_token(token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, FeedConfig, JwtConfig, ServerConfig};
    use sqlx::postgres::PgPoolOptions;

    fn test_config() -> Config {
        Config {
            environment: "test".into(),
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".into(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/bdm_test".into(),
                max_connections: 1,
                min_connections: 0,
                acquire_timeout_secs: 5,
            },
            jwt: JwtConfig {
                secret: "test-secret".into(),
                access_token_expiry: 3600,
                refresh_token_expiry: 7200,
            },
            feed: FeedConfig { capacity: 4 },
            bootstrap_admin: None,
        }
    }

    fn service() -> AuthService {
        let config = test_config();
        // Lazy pool: token tests never touch the database
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .expect("lazy pool");
        AuthService::new(pool, &config)
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let service = service();
        let user_id = Uuid::new_v4();

        let tokens = service.generate_tokens(user_id, "almacen", Some("GDL")).unwrap();
        let claims = service.validate_token(&tokens.access_token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role_id, "almacen");
        assert_eq!(claims.site_id.as_deref(), Some("GDL"));
        assert_eq!(tokens.token_type, "Bearer");
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_rejected() {
        let service = service();
        let mut other_config = test_config();
        other_config.jwt.secret = "another-secret".into();
        let pool = PgPoolOptions::new()
            .connect_lazy(&other_config.database.url)
            .unwrap();
        let other = AuthService::new(pool, &other_config);

        let tokens = other.generate_tokens(Uuid::new_v4(), "admin", None).unwrap();
        assert!(matches!(
            service.validate_token(&tokens.access_token),
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[sqlx::test]
    #[ignore] // Requires database connection
    async fn test_refresh_token_is_consumed_once(pool: PgPool) {
        sqlx::query("INSERT INTO users (email, password_hash, name, role_id) VALUES ($1, $2, $3, $4)")
            .bind("ana@bebidas.mx")
            .bind(AuthService::hash_password("secreto").unwrap())
            .bind("Ana")
            .bind("ventas")
            .execute(&pool)
            .await
            .unwrap();

        let service = AuthService::new(pool, &test_config());
        let tokens = service.login("ana@bebidas.mx", "secreto").await.unwrap();

        // Two refreshes racing on the same token: exactly one wins
        let (first, second) = tokio::join!(
            service.refresh_token(&tokens.refresh_token),
            service.refresh_token(&tokens.refresh_token),
        );
        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);

        let winner = first.or(second).unwrap();
        assert!(service.refresh_token(&tokens.refresh_token).await.is_err());
        assert!(service.refresh_token(&winner.refresh_token).await.is_ok());
    }

    #[test]
    fn test_hash_token_is_stable_hex() {
        let a = AuthService::hash_token("token");
        assert_eq!(a, AuthService::hash_token("token"));
        assert_eq!(a.len(), 64);
        assert_ne!(a, AuthService::hash_token("other"));
    }
}
