//! Reporting service for sales and inventory summaries and CSV export

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ReferenceData, SalesOrder};
use crate::services::inventory::InventoryService;
use crate::services::order::{OrderFilter, OrderService};
use shared::aggregation::{inventory_totals, summarize_sales, InventoryTotals, SalesSummary};

#[derive(Clone)]
pub struct ReportingService {
    orders: OrderService,
    inventory: InventoryService,
}

/// Report filter parameters
#[derive(Debug, Default, Deserialize)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub site_id: Option<String>,
}

impl ReportFilter {
    fn order_filter(&self) -> OrderFilter {
        OrderFilter {
            site_id: self.site_id.clone(),
            from: self.start_date,
            to: self.end_date,
            ..Default::default()
        }
    }
}

/// Sales summary with the period it covers
#[derive(Debug, Serialize)]
pub struct SalesReport {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub site_id: Option<String>,
    #[serde(flatten)]
    pub summary: SalesSummary,
}

/// Per-category totals of one snapshot
#[derive(Debug, Serialize)]
pub struct InventoryReport {
    pub site_id: String,
    pub site_label: String,
    pub inventory_date: NaiveDate,
    pub recorded: bool,
    #[serde(flatten)]
    pub totals: InventoryTotals,
}

/// One exported order line
#[derive(Debug, Serialize)]
pub struct SalesCsvRow {
    pub order_id: Uuid,
    pub order_date: NaiveDate,
    pub site: String,
    pub salesperson_id: Uuid,
    pub status: &'static str,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl ReportingService {
    pub fn new(orders: OrderService, inventory: InventoryService) -> Self {
        Self { orders, inventory }
    }

    pub async fn sales_summary(&self, filter: &ReportFilter) -> AppResult<SalesReport> {
        check_range(filter)?;
        let orders = self.orders.find_orders(&filter.order_filter()).await?;

        Ok(SalesReport {
            start_date: filter.start_date,
            end_date: filter.end_date,
            site_id: filter.site_id.clone(),
            summary: summarize_sales(&orders),
        })
    }

    pub async fn inventory_summary(
        &self,
        site_id: &str,
        date: NaiveDate,
        reference: &ReferenceData,
    ) -> AppResult<InventoryReport> {
        let snapshot = self.inventory.get_inventory(site_id, date).await?;

        Ok(InventoryReport {
            site_id: site_id.to_string(),
            site_label: reference.site_label(site_id),
            inventory_date: date,
            recorded: snapshot.is_some(),
            totals: snapshot
                .map(|s| inventory_totals(&s.lines))
                .unwrap_or_default(),
        })
    }

    /// Order lines in the period as CSV, site shown by its label
    pub async fn sales_csv(&self, filter: &ReportFilter, reference: &ReferenceData) -> AppResult<String> {
        check_range(filter)?;
        let orders = self.orders.find_orders(&filter.order_filter()).await?;
        let rows = csv_rows(&orders, reference);
        tracing::debug!(rows = rows.len(), "Exporting sales CSV");
        Self::export_to_csv(&rows)
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

fn check_range(filter: &ReportFilter) -> AppResult<()> {
    match (filter.start_date, filter.end_date) {
        (Some(start), Some(end)) if start > end => Err(AppError::validation(
            "start_date",
            "Start date must not be after end date",
            "La fecha inicial no puede ser posterior a la final",
        )),
        _ => Ok(()),
    }
}

fn csv_rows(orders: &[SalesOrder], reference: &ReferenceData) -> Vec<SalesCsvRow> {
    orders
        .iter()
        .flat_map(|order| {
            order.items.iter().map(move |item| SalesCsvRow {
                order_id: order.id,
                order_date: order.order_date,
                site: reference.site_label(&order.site_id),
                salesperson_id: order.salesperson_id,
                status: order.status.as_str(),
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: item.subtotal,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderItem, OrderStatus};
    use chrono::Utc;

    fn order(site_id: &str, items: Vec<OrderItem>) -> SalesOrder {
        SalesOrder {
            id: Uuid::new_v4(),
            site_id: site_id.into(),
            salesperson_id: Uuid::new_v4(),
            order_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            status: OrderStatus::Pending,
            total: items.iter().map(|i| i.subtotal).sum(),
            items,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_csv_has_one_row_per_item() {
        let orders = vec![order(
            "GDL",
            vec![
                OrderItem::new(Uuid::new_v4(), "Cola".into(), 24, Decimal::from(10)).unwrap(),
                OrderItem::new(Uuid::new_v4(), "Agua".into(), 6, Decimal::from(5)).unwrap(),
            ],
        )];

        let rows = csv_rows(&orders, &ReferenceData::default());
        let csv = ReportingService::export_to_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("order_id,order_date,site,"));
        assert!(lines[1].contains(",GDL,"));
        assert!(lines[1].contains("Cola"));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let filter = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 2),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            site_id: None,
        };
        assert!(check_range(&filter).is_err());
    }
}
