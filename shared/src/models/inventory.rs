//! Daily inventory models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quantity::BoxQuantity;

/// Physical stock categories counted by the warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryCategory {
    Warehouse,
    Consignment,
    Rejected,
}

/// Stock counters of one product in a daily snapshot, in units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub warehouse: i64,
    pub consignment: i64,
    pub rejected: i64,
    /// Units reserved by pending sales orders (preventa)
    pub committed: i64,
}

impl StockLevel {
    pub fn physical(&self) -> i64 {
        self.warehouse + self.consignment + self.rejected
    }

    /// `warehouse + consignment + rejected - committed`
    pub fn available(&self) -> i64 {
        self.physical() - self.committed
    }

    pub fn count(&self, category: InventoryCategory) -> i64 {
        match category {
            InventoryCategory::Warehouse => self.warehouse,
            InventoryCategory::Consignment => self.consignment,
            InventoryCategory::Rejected => self.rejected,
        }
    }
}

/// One product line of a (site, date) snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLine {
    pub product_id: Uuid,
    #[serde(flatten)]
    pub stock: StockLevel,
    /// Inferred units that left the warehouse since the previous day without a recorded sale
    pub transit: i64,
}

impl SnapshotLine {
    pub fn available(&self) -> i64 {
        self.stock.available()
    }
}

/// Inventory of one site for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyInventory {
    pub id: Uuid,
    pub site_id: String,
    pub inventory_date: NaiveDate,
    /// Set once the first save of the day has compared against the previous day
    pub transit_recorded: bool,
    pub lines: Vec<SnapshotLine>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Counts entered for one product, each category as boxes plus units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLineInput {
    pub product_id: Uuid,
    pub warehouse: BoxQuantity,
    pub consignment: BoxQuantity,
    pub rejected: BoxQuantity,
}

impl InventoryLineInput {
    pub fn get(&self, category: InventoryCategory) -> BoxQuantity {
        match category {
            InventoryCategory::Warehouse => self.warehouse,
            InventoryCategory::Consignment => self.consignment,
            InventoryCategory::Rejected => self.rejected,
        }
    }

    pub fn set(&mut self, category: InventoryCategory, quantity: BoxQuantity) {
        match category {
            InventoryCategory::Warehouse => self.warehouse = quantity,
            InventoryCategory::Consignment => self.consignment = quantity,
            InventoryCategory::Rejected => self.rejected = quantity,
        }
    }
}

/// One merged save of the products touched since the previous save
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveInventoryInput {
    pub lines: Vec<InventoryLineInput>,
}

/// Snapshot line with every counter also decomposed into boxes and units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotLineView {
    #[serde(flatten)]
    pub line: SnapshotLine,
    pub product_label: String,
    pub units_per_box: Option<i32>,
    pub available: i64,
    pub warehouse_boxes: Option<BoxQuantity>,
    pub consignment_boxes: Option<BoxQuantity>,
    pub rejected_boxes: Option<BoxQuantity>,
    pub available_boxes: Option<BoxQuantity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_formula() {
        let stock = StockLevel {
            warehouse: 40,
            consignment: 5,
            rejected: 3,
            committed: 18,
        };
        assert_eq!(stock.physical(), 48);
        assert_eq!(stock.available(), 30);
        assert_eq!(stock.count(InventoryCategory::Rejected), 3);
    }

    #[test]
    fn test_line_input_set_get() {
        let mut input = InventoryLineInput::default();
        input.set(InventoryCategory::Consignment, BoxQuantity::new(2, 1));
        assert_eq!(input.get(InventoryCategory::Consignment), BoxQuantity::new(2, 1));
        assert_eq!(input.get(InventoryCategory::Warehouse), BoxQuantity::default());
    }
}
