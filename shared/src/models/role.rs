//! Role models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role identifier with full access to every route group
pub const ADMIN_ROLE: &str = "admin";

/// Role identifier for warehouse staff entering daily counts
pub const WAREHOUSE_ROLE: &str = "almacen";

/// Role identifier for salespeople placing orders
pub const SALES_ROLE: &str = "ventas";

/// A role assigned to users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    /// Administrator-chosen identifier, immutable after creation
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Route groups guarded by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    Administration,
    Warehouse,
    Sales,
}

impl Area {
    /// Roles allowed into this area. Administrators are allowed everywhere.
    pub fn allowed_roles(&self) -> &'static [&'static str] {
        match self {
            Area::Administration => &[ADMIN_ROLE],
            Area::Warehouse => &[ADMIN_ROLE, WAREHOUSE_ROLE],
            Area::Sales => &[ADMIN_ROLE, SALES_ROLE],
        }
    }

    pub fn allows(&self, role_id: &str) -> bool {
        self.allowed_roles().contains(&role_id)
    }
}
