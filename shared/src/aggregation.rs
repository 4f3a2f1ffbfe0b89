//! Reporting reducers over small in-memory order and inventory lists

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{OrderStatus, SalesOrder, SnapshotLine};

/// Sales of one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

/// Sales of one salesperson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalespersonSales {
    pub salesperson_id: Uuid,
    pub order_count: i64,
    pub revenue: Decimal,
}

/// Sales report over a set of orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub order_count: i64,
    pub cancelled_count: i64,
    pub total_revenue: Decimal,
    pub by_product: Vec<ProductSales>,
    pub by_salesperson: Vec<SalespersonSales>,
}

/// Totals of a daily snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTotals {
    pub product_count: usize,
    pub warehouse: i64,
    pub consignment: i64,
    pub rejected: i64,
    pub committed: i64,
    pub transit: i64,
    pub available: i64,
}

fn counts_as_sale(order: &SalesOrder) -> bool {
    order.status != OrderStatus::Cancelled
}

/// Quantity and revenue per product, highest revenue first. Cancelled orders are ignored.
pub fn sales_by_product(orders: &[SalesOrder]) -> Vec<ProductSales> {
    let mut by_product: HashMap<Uuid, ProductSales> = HashMap::new();
    for item in orders.iter().filter(|o| counts_as_sale(o)).flat_map(|o| &o.items) {
        let entry = by_product.entry(item.product_id).or_insert_with(|| ProductSales {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            quantity: 0,
            revenue: Decimal::ZERO,
        });
        entry.quantity += item.quantity;
        entry.revenue += item.subtotal;
    }

    let mut rows: Vec<_> = by_product.into_values().collect();
    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    rows
}

/// Order count and revenue per salesperson, highest revenue first
pub fn sales_by_salesperson(orders: &[SalesOrder]) -> Vec<SalespersonSales> {
    let mut by_person: HashMap<Uuid, SalespersonSales> = HashMap::new();
    for order in orders.iter().filter(|o| counts_as_sale(o)) {
        let entry = by_person
            .entry(order.salesperson_id)
            .or_insert_with(|| SalespersonSales {
                salesperson_id: order.salesperson_id,
                order_count: 0,
                revenue: Decimal::ZERO,
            });
        entry.order_count += 1;
        entry.revenue += order.total;
    }

    let mut rows: Vec<_> = by_person.into_values().collect();
    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.salesperson_id.cmp(&b.salesperson_id))
    });
    rows
}

pub fn summarize_sales(orders: &[SalesOrder]) -> SalesSummary {
    let sold: Vec<&SalesOrder> = orders.iter().filter(|o| counts_as_sale(o)).collect();
    SalesSummary {
        order_count: sold.len() as i64,
        cancelled_count: (orders.len() - sold.len()) as i64,
        total_revenue: sold.iter().map(|o| o.total).sum(),
        by_product: sales_by_product(orders),
        by_salesperson: sales_by_salesperson(orders),
    }
}

pub fn inventory_totals(lines: &[SnapshotLine]) -> InventoryTotals {
    lines.iter().fold(
        InventoryTotals {
            product_count: lines.len(),
            ..Default::default()
        },
        |mut acc, line| {
            acc.warehouse += line.stock.warehouse;
            acc.consignment += line.stock.consignment;
            acc.rejected += line.stock.rejected;
            acc.committed += line.stock.committed;
            acc.transit += line.transit;
            acc.available += line.available();
            acc
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{order_total, OrderItem, StockLevel};
    use chrono::{NaiveDate, Utc};

    fn order(salesperson: Uuid, status: OrderStatus, items: Vec<OrderItem>) -> SalesOrder {
        SalesOrder {
            id: Uuid::new_v4(),
            site_id: "GDL".into(),
            salesperson_id: salesperson,
            order_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            status,
            total: order_total(&items).unwrap(),
            items,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summarize_sales_skips_cancelled() {
        let cola = Uuid::new_v4();
        let water = Uuid::new_v4();
        let ana = Uuid::new_v4();
        let luis = Uuid::new_v4();

        let orders = vec![
            order(
                ana,
                OrderStatus::Pending,
                vec![
                    OrderItem::new(cola, "Cola".into(), 24, Decimal::from(10)).unwrap(),
                    OrderItem::new(water, "Agua".into(), 12, Decimal::from(5)).unwrap(),
                ],
            ),
            order(
                luis,
                OrderStatus::Delivered,
                vec![OrderItem::new(cola, "Cola".into(), 6, Decimal::from(10)).unwrap()],
            ),
            order(
                luis,
                OrderStatus::Cancelled,
                vec![OrderItem::new(water, "Agua".into(), 100, Decimal::from(5)).unwrap()],
            ),
        ];

        let summary = summarize_sales(&orders);
        assert_eq!(summary.order_count, 2);
        assert_eq!(summary.cancelled_count, 1);
        assert_eq!(summary.total_revenue, Decimal::from(360));

        assert_eq!(summary.by_product[0].product_id, cola);
        assert_eq!(summary.by_product[0].quantity, 30);
        assert_eq!(summary.by_product[1].quantity, 12);

        assert_eq!(summary.by_salesperson[0].salesperson_id, ana);
        assert_eq!(summary.by_salesperson[1].order_count, 1);
    }

    #[test]
    fn test_inventory_totals() {
        let lines = vec![
            SnapshotLine {
                product_id: Uuid::new_v4(),
                stock: StockLevel {
                    warehouse: 10,
                    consignment: 2,
                    rejected: 1,
                    committed: 4,
                },
                transit: 3,
            },
            SnapshotLine {
                product_id: Uuid::new_v4(),
                stock: StockLevel {
                    warehouse: 5,
                    consignment: 0,
                    rejected: 0,
                    committed: 5,
                },
                transit: 0,
            },
        ];

        let totals = inventory_totals(&lines);
        assert_eq!(totals.product_count, 2);
        assert_eq!(totals.warehouse, 15);
        assert_eq!(totals.committed, 9);
        assert_eq!(totals.transit, 3);
        assert_eq!(totals.available, 9);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(inventory_totals(&[]), InventoryTotals::default());
        let summary = summarize_sales(&[]);
        assert_eq!(summary.total_revenue, Decimal::ZERO);
        assert!(summary.by_product.is_empty());
    }
}
