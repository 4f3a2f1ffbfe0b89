//! User models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account on the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role_id: String,
    /// Site the user works at; administrators may have none
    pub site_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The signed-in identity as seen by the client shell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    /// Role name, or the raw role id when the role has been deleted
    pub role_label: String,
    /// Site name, or the raw site id when the site has been deleted
    pub site_label: Option<String>,
}

/// User row as rendered in the users table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    pub role_label: String,
    pub site_label: Option<String>,
}
