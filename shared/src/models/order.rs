//! Sales order models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::quantity::BoxQuantity;

/// A line subtotal or order total that cannot be stored as `NUMERIC(14, 2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("order amount is too large")]
pub struct AmountOverflow;

/// Largest amount an order subtotal or total may reach
pub fn max_order_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

fn within_bound(amount: Option<Decimal>) -> Result<Decimal, AmountOverflow> {
    amount
        .filter(|a| *a <= max_order_amount())
        .ok_or(AmountOverflow)
}

/// Sales order lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Only pending orders move, and only once
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Delivered)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a sales order, priced at the moment of ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    /// Ordered quantity in units
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl OrderItem {
    pub fn new(
        product_id: Uuid,
        product_name: String,
        quantity: i64,
        unit_price: Decimal,
    ) -> Result<Self, AmountOverflow> {
        let subtotal = within_bound(unit_price.checked_mul(Decimal::from(quantity)))?;
        Ok(Self {
            product_id,
            product_name,
            quantity,
            unit_price,
            subtotal,
        })
    }
}

/// A sales order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: Uuid,
    pub site_id: String,
    pub salesperson_id: Uuid,
    pub order_date: NaiveDate,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sum of line subtotals
pub fn order_total(items: &[OrderItem]) -> Result<Decimal, AmountOverflow> {
    within_bound(
        items
            .iter()
            .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.subtotal)),
    )
}

/// Requested line of a new order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    #[serde(flatten)]
    pub quantity: BoxQuantity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_item_subtotal_and_total() {
        let price = Decimal::from_str("12.50").unwrap();
        let a = OrderItem::new(Uuid::new_v4(), "Cola 350ml".into(), 24, price).unwrap();
        let b = OrderItem::new(Uuid::new_v4(), "Agua 600ml".into(), 3, Decimal::from(8)).unwrap();
        assert_eq!(a.subtotal, Decimal::from(300));
        assert_eq!(order_total(&[a, b]), Ok(Decimal::from(324)));
    }

    #[test]
    fn test_huge_quantity_does_not_panic() {
        // Largest box count that still converts to units at 24 per box
        let quantity = crate::quantity::to_units(384_307_168_202_282_325, 0, 24).unwrap();
        let price = Decimal::new(999_999_999_999, 2);
        assert_eq!(
            OrderItem::new(Uuid::new_v4(), "Cola".into(), quantity, price),
            Err(AmountOverflow)
        );
    }

    #[test]
    fn test_subtotal_bounded_by_column() {
        let price = Decimal::new(999_999_999_999, 2);
        assert!(OrderItem::new(Uuid::new_v4(), "Cola".into(), 100, price).is_ok());
        assert!(OrderItem::new(Uuid::new_v4(), "Cola".into(), 101, price).is_err());
    }

    #[test]
    fn test_total_bounded_by_column() {
        let price = Decimal::new(999_999_999_999, 2);
        let line = OrderItem::new(Uuid::new_v4(), "Cola".into(), 60, price).unwrap();
        assert_eq!(order_total(&[line.clone(), line]), Err(AmountOverflow));
    }

    #[test]
    fn test_status_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_status_parse() {
        for status in [OrderStatus::Pending, OrderStatus::Delivered, OrderStatus::Cancelled] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("shipped"), None);
    }
}
