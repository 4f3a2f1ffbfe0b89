//! Product models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quantity::{BoxQuantity, QuantityError};

/// A sellable product at a site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// SAP code, unique across the catalogue
    pub sku: String,
    pub units_per_box: i32,
    pub unit_price: Decimal,
    pub beverage_type_id: String,
    pub site_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn units(&self, quantity: BoxQuantity) -> Result<i64, QuantityError> {
        quantity.to_units(self.units_per_box)
    }
}

/// Product row as rendered in tables, with reference labels resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub beverage_type_label: String,
    pub site_label: String,
}
