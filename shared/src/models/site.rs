//! Site (sede) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A physical distribution location with its own daily inventory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Site {
    /// Administrator-chosen code, immutable after creation
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
