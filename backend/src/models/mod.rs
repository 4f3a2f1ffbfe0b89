//! Database models for the Beverage Distribution Manager
//!
//! Re-exports models from the shared crate and adds the database row types
//! they are loaded from.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

pub use shared::models::*;

#[derive(Debug, FromRow)]
pub struct RoleRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct SiteRow {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SiteRow> for Site {
    fn from(row: SiteRow) -> Self {
        Site {
            id: row.id,
            name: row.name,
            address: row.address,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct BeverageTypeRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BeverageTypeRow> for BeverageType {
    fn from(row: BeverageTypeRow) -> Self {
        BeverageType {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role_id: String,
    pub site_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            role_id: row.role_id,
            site_id: row.site_id,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub units_per_box: i32,
    pub unit_price: Decimal,
    pub beverage_type_id: String,
    pub site_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            sku: row.sku,
            units_per_box: row.units_per_box,
            unit_price: row.unit_price,
            beverage_type_id: row.beverage_type_id,
            site_id: row.site_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct DailyInventoryRow {
    pub id: Uuid,
    pub site_id: String,
    pub inventory_date: NaiveDate,
    pub transit_recorded: bool,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl DailyInventoryRow {
    pub fn with_lines(self, lines: Vec<SnapshotLine>) -> DailyInventory {
        DailyInventory {
            id: self.id,
            site_id: self.site_id,
            inventory_date: self.inventory_date,
            transit_recorded: self.transit_recorded,
            lines,
            updated_by: self.updated_by,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SnapshotLineRow {
    pub product_id: Uuid,
    pub warehouse: i64,
    pub consignment: i64,
    pub rejected: i64,
    pub committed: i64,
    pub transit: i64,
}

impl SnapshotLineRow {
    pub fn stock(&self) -> StockLevel {
        StockLevel {
            warehouse: self.warehouse,
            consignment: self.consignment,
            rejected: self.rejected,
            committed: self.committed,
        }
    }
}

impl From<SnapshotLineRow> for SnapshotLine {
    fn from(row: SnapshotLineRow) -> Self {
        SnapshotLine {
            product_id: row.product_id,
            stock: row.stock(),
            transit: row.transit,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct SalesOrderRow {
    pub id: Uuid,
    pub site_id: String,
    pub salesperson_id: Uuid,
    pub order_date: NaiveDate,
    pub daily_inventory_id: Uuid,
    pub status: String,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SalesOrderRow {
    pub fn status(&self) -> OrderStatus {
        // The column is constrained to the three known values
        OrderStatus::parse(&self.status).unwrap_or(OrderStatus::Pending)
    }

    pub fn with_items(self, items: Vec<OrderItem>) -> SalesOrder {
        SalesOrder {
            status: self.status(),
            id: self.id,
            site_id: self.site_id,
            salesperson_id: self.salesperson_id,
            order_date: self.order_date,
            items,
            total: self.total,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct OrderItemRow {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
        }
    }
}
