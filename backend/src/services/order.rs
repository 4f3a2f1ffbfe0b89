//! Sales order service
//!
//! Placing an order reserves stock on the (site, date) snapshot. The snapshot
//! lines of the requested products are locked for the whole transaction, so
//! two orders racing for the same units are serialized and at most one of
//! them can take the last available units.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::feed::{ChangeFeed, ChangeKind, Collection};
use crate::models::{
    order_total, OrderItem, OrderItemRow, OrderLineInput, OrderStatus, Product, SalesOrder,
    SalesOrderRow, SnapshotLineRow, StockLevel,
};
use crate::services::ProductService;
use shared::reconciliation::{merge_requests, release, reserve, StockShortage};
use shared::{PaginatedResponse, Pagination, PaginationMeta};

#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
    feed: ChangeFeed,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    /// Defaults to the salesperson's own site
    pub site_id: Option<String>,
    /// Defaults to today
    pub order_date: Option<NaiveDate>,
    pub lines: Vec<OrderLineInput>,
    pub notes: Option<String>,
}

/// Filters for the orders table
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OrderFilter {
    pub q: Option<String>,
    pub site_id: Option<String>,
    pub salesperson_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OrderFilter {
    pub fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page).max(1),
            per_page: self.per_page.unwrap_or(defaults.per_page).clamp(1, 200),
        }
    }
}

const ORDER_COLUMNS: &str = "id, site_id, salesperson_id, order_date, daily_inventory_id, status, \
                             total, notes, created_at, updated_at";

impl OrderService {
    pub fn new(db: PgPool, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// Place an order, reserving every line or none of them
    pub async fn create_order(
        &self,
        salesperson_id: Uuid,
        site_id: &str,
        input: CreateOrderInput,
        products: &ProductService,
    ) -> AppResult<SalesOrder> {
        if input.lines.is_empty() {
            return Err(AppError::validation(
                "lines",
                "An order needs at least one line",
                "El pedido debe tener al menos una línea",
            ));
        }
        let order_date = input.order_date.unwrap_or_else(|| Utc::now().date_naive());

        let ids: Vec<Uuid> = input.lines.iter().map(|l| l.product_id).collect();
        let catalogue: HashMap<Uuid, Product> = products
            .get_products_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut items = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let product = catalogue
                .get(&line.product_id)
                .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
            if product.site_id != site_id {
                return Err(AppError::validation(
                    "product_id",
                    &format!("{} is not sold at this site", product.name),
                    &format!("{} no se vende en esta sede", product.name),
                ));
            }
            let quantity = product.units(line.quantity)?;
            if quantity == 0 {
                return Err(AppError::validation(
                    "quantity",
                    "Quantity must be greater than zero",
                    "La cantidad debe ser mayor a cero",
                ));
            }
            items.push(OrderItem::new(
                product.id,
                product.name.clone(),
                quantity,
                product.unit_price,
            )?);
        }
        let requests: Vec<(Uuid, i64)> = items.iter().map(|i| (i.product_id, i.quantity)).collect();
        let total = order_total(&items)?;

        let mut tx = self.db.begin().await?;

        let snapshot_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM daily_inventories WHERE site_id = $1 AND inventory_date = $2",
        )
        .bind(site_id)
        .bind(order_date)
        .fetch_optional(&mut *tx)
        .await?;

        // Without a count for the day nothing is available
        let Some(snapshot_id) = snapshot_id else {
            let (product_id, requested) = merge_requests(&requests)[0];
            return Err(shortage_error(
                StockShortage {
                    product_id,
                    requested,
                    available: 0,
                },
                &catalogue,
            ));
        };

        let mut levels = lock_levels(&mut tx, snapshot_id, &ids).await?;

        if let Err(shortage) = reserve(&mut levels, &requests) {
            tracing::info!(
                site_id,
                %order_date,
                product_id = %shortage.product_id,
                requested = shortage.requested,
                available = shortage.available,
                "Order rejected for insufficient stock"
            );
            return Err(shortage_error(shortage, &catalogue));
        }

        let order = sqlx::query_as::<_, SalesOrderRow>(&format!(
            r#"
            INSERT INTO sales_orders (id, site_id, salesperson_id, order_date, daily_inventory_id, total, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(site_id)
        .bind(salesperson_id)
        .bind(order_date)
        .bind(snapshot_id)
        .bind(total)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        for (line_no, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sales_order_items
                    (order_id, line_no, product_id, product_name, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order.id)
            .bind(line_no as i32 + 1)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.subtotal)
            .execute(&mut *tx)
            .await?;
        }

        store_committed(&mut tx, snapshot_id, &levels, &requests).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            site_id,
            %salesperson_id,
            %total,
            "Sales order placed"
        );
        self.feed
            .publish(Collection::SalesOrders, order.id, ChangeKind::Created);
        self.feed
            .publish(Collection::DailyInventories, snapshot_id, ChangeKind::Updated);

        Ok(order.with_items(items))
    }

    /// Orders matching the filter, newest first, one page at a time
    pub async fn list_orders(&self, filter: &OrderFilter) -> AppResult<PaginatedResponse<SalesOrder>> {
        let orders = self.find_orders(filter).await?;
        let orders = shared::filter::search(orders, filter.q.as_deref());

        let pagination = filter.pagination();
        let meta = PaginationMeta::new(&pagination, orders.len() as u64);
        let data = orders
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.per_page as usize)
            .collect();

        Ok(PaginatedResponse {
            data,
            pagination: meta,
        })
    }

    /// Every order matching the SQL-side filters, with items
    pub async fn find_orders(&self, filter: &OrderFilter) -> AppResult<Vec<SalesOrder>> {
        let rows = sqlx::query_as::<_, SalesOrderRow>(&format!(
            r#"
            SELECT {}
            FROM sales_orders
            WHERE ($1::TEXT IS NULL OR site_id = $1)
              AND ($2::UUID IS NULL OR salesperson_id = $2)
              AND ($3::TEXT IS NULL OR status = $3)
              AND ($4::DATE IS NULL OR order_date >= $4)
              AND ($5::DATE IS NULL OR order_date <= $5)
            ORDER BY order_date DESC, created_at DESC
            "#,
            ORDER_COLUMNS
        ))
        .bind(&filter.site_id)
        .bind(filter.salesperson_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.db)
        .await?;

        self.attach_items(rows).await
    }

    pub async fn get_order(&self, order_id: Uuid) -> AppResult<SalesOrder> {
        let row = self.get_order_row(order_id).await?;
        let mut orders = self.attach_items(vec![row]).await?;
        orders
            .pop()
            .ok_or_else(|| AppError::NotFound("Sales order".to_string()))
    }

    /// Mark a pending order delivered. Its units stay committed.
    pub async fn deliver_order(&self, order_id: Uuid) -> AppResult<SalesOrder> {
        let mut tx = self.db.begin().await?;
        let order = lock_order(&mut tx, order_id).await?;
        check_transition(&order, OrderStatus::Delivered)?;

        set_status(&mut tx, order_id, OrderStatus::Delivered).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, "Sales order delivered");
        self.feed
            .publish(Collection::SalesOrders, order_id, ChangeKind::Updated);
        self.get_order(order_id).await
    }

    /// Cancel a pending order and give its units back to the snapshot
    pub async fn cancel_order(&self, order_id: Uuid) -> AppResult<SalesOrder> {
        let mut tx = self.db.begin().await?;
        let order = lock_order(&mut tx, order_id).await?;
        check_transition(&order, OrderStatus::Cancelled)?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT order_id, product_id, product_name, quantity, unit_price, subtotal
            FROM sales_order_items
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;
        let reserved: Vec<(Uuid, i64)> = items.iter().map(|i| (i.product_id, i.quantity)).collect();
        let ids: Vec<Uuid> = reserved.iter().map(|(id, _)| *id).collect();

        let mut levels = lock_levels(&mut tx, order.daily_inventory_id, &ids).await?;
        release(&mut levels, &reserved);
        store_committed(&mut tx, order.daily_inventory_id, &levels, &reserved).await?;

        set_status(&mut tx, order_id, OrderStatus::Cancelled).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, "Sales order cancelled");
        self.feed
            .publish(Collection::SalesOrders, order_id, ChangeKind::Updated);
        self.feed.publish(
            Collection::DailyInventories,
            order.daily_inventory_id,
            ChangeKind::Updated,
        );
        self.get_order(order_id).await
    }

    async fn get_order_row(&self, order_id: Uuid) -> AppResult<SalesOrderRow> {
        sqlx::query_as::<_, SalesOrderRow>(&format!(
            "SELECT {} FROM sales_orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sales order".to_string()))
    }

    async fn attach_items(&self, rows: Vec<SalesOrderRow>) -> AppResult<Vec<SalesOrder>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT order_id, product_id, product_name, quantity, unit_price, subtotal
            FROM sales_order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, line_no
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            items.entry(row.order_id).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.with_items(order_items)
            })
            .collect())
    }
}

/// Lock the snapshot lines of the given products, in product order
async fn lock_levels(
    tx: &mut Transaction<'_, Postgres>,
    snapshot_id: Uuid,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, StockLevel>> {
    let rows = sqlx::query_as::<_, SnapshotLineRow>(
        r#"
        SELECT product_id, warehouse, consignment, rejected, committed, transit
        FROM daily_inventory_lines
        WHERE daily_inventory_id = $1 AND product_id = ANY($2)
        ORDER BY product_id
        FOR UPDATE
        "#,
    )
    .bind(snapshot_id)
    .bind(product_ids)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.iter().map(|row| (row.product_id, row.stock())).collect())
}

async fn store_committed(
    tx: &mut Transaction<'_, Postgres>,
    snapshot_id: Uuid,
    levels: &HashMap<Uuid, StockLevel>,
    touched: &[(Uuid, i64)],
) -> AppResult<()> {
    for (product_id, _) in merge_requests(touched) {
        let Some(level) = levels.get(&product_id) else {
            continue;
        };
        sqlx::query(
            r#"
            UPDATE daily_inventory_lines
            SET committed = $1
            WHERE daily_inventory_id = $2 AND product_id = $3
            "#,
        )
        .bind(level.committed)
        .bind(snapshot_id)
        .bind(product_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn lock_order(tx: &mut Transaction<'_, Postgres>, order_id: Uuid) -> AppResult<SalesOrderRow> {
    sqlx::query_as::<_, SalesOrderRow>(&format!(
        "SELECT {} FROM sales_orders WHERE id = $1 FOR UPDATE",
        ORDER_COLUMNS
    ))
    .bind(order_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Sales order".to_string()))
}

async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    status: OrderStatus,
) -> AppResult<()> {
    sqlx::query("UPDATE sales_orders SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(status.as_str())
        .bind(order_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn check_transition(order: &SalesOrderRow, next: OrderStatus) -> AppResult<()> {
    let current = order.status();
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::InvalidStateTransition(format!(
            "order is {} and cannot become {}",
            current, next
        )))
    }
}

fn shortage_error(shortage: StockShortage, catalogue: &HashMap<Uuid, Product>) -> AppError {
    AppError::InsufficientStock {
        product_name: catalogue
            .get(&shortage.product_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| shortage.product_id.to_string()),
        product_id: shortage.product_id,
        requested: shortage.requested,
        available: shortage.available,
    }
}
