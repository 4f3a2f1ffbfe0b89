//! Beverage type models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A beverage category (e.g. soft drinks, water, beer) used to group products
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BeverageType {
    /// Administrator-chosen code, immutable after creation
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
