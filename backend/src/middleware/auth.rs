//! Authentication middleware
//!
//! JWT authentication and role-gated route groups

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::{Area, ADMIN_ROLE};

use crate::error::{AppError, AppResult};
use crate::services::AuthService;
use crate::AppState;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: uuid::Uuid,
    pub role_id: String,
    pub site_id: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role_id == ADMIN_ROLE
    }

    /// Check if user's role opens the given area
    pub fn can_enter(&self, area: Area) -> bool {
        area.allows(&self.role_id)
    }

    /// Permission guard for use in handlers
    pub fn require(&self, area: Area) -> AppResult<()> {
        if self.can_enter(area) {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions)
        }
    }

    /// Administrators work on every site, everyone else only on their own
    pub fn can_access_site(&self, site_id: &str) -> bool {
        self.is_admin() || self.site_id.as_deref() == Some(site_id)
    }

    pub fn require_site(&self, site_id: &str) -> AppResult<()> {
        if self.can_access_site(site_id) {
            Ok(())
        } else {
            Err(AppError::InsufficientPermissions)
        }
    }
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let claims = match auth_service.validate_token(token) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    // Parse UUIDs from claims
    let user_id = match uuid::Uuid::parse_str(&claims.sub) {
        Ok(id) => id,
        Err(_) => return unauthorized_response("Invalid user ID in token"),
    };

    // Create AuthUser and insert into request extensions
    let auth_user = AuthUser {
        user_id,
        role_id: claims.role_id,
        site_id: claims.site_id,
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// Gate for administration-only route groups
pub async fn require_admin(request: Request, next: Next) -> Response {
    let area = Area::Administration;
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.can_enter(area) => next.run(request).await,
        Some(user) => {
            tracing::warn!(
                user_id = %user.user_id,
                role = %user.role_id,
                ?area,
                "Role gate rejected request"
            );
            AppError::InsufficientPermissions.into_response()
        }
        None => unauthorized_response("Authentication required"),
    }
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    AppError::unauthorized(message, "No autorizado").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{SALES_ROLE, WAREHOUSE_ROLE};

    fn user(role: &str, site: Option<&str>) -> AuthUser {
        AuthUser {
            user_id: uuid::Uuid::new_v4(),
            role_id: role.to_string(),
            site_id: site.map(str::to_string),
        }
    }

    #[test]
    fn test_site_access() {
        let admin = user(ADMIN_ROLE, None);
        let clerk = user(WAREHOUSE_ROLE, Some("GDL"));

        assert!(admin.can_access_site("MTY"));
        assert!(clerk.can_access_site("GDL"));
        assert!(!clerk.can_access_site("MTY"));
        assert!(user(SALES_ROLE, None).require_site("GDL").is_err());
    }

    #[test]
    fn test_require_area() {
        assert!(user(SALES_ROLE, Some("GDL")).require(Area::Sales).is_ok());
        assert!(user(SALES_ROLE, Some("GDL")).require(Area::Warehouse).is_err());
        assert!(user(ADMIN_ROLE, None).require(Area::Warehouse).is_ok());
    }
}
