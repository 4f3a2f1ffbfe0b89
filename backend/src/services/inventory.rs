//! Daily inventory service: per-site snapshots of warehouse counts
//!
//! A save applies one merged payload in a single transaction. The first save
//! of a (site, date) snapshot also infers transit from the previous day.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::feed::{ChangeFeed, ChangeKind, Collection};
use crate::models::{
    DailyInventory, DailyInventoryRow, Product, ReferenceData, SaveInventoryInput, SnapshotLine,
    SnapshotLineRow, SnapshotLineView, StockLevel,
};
use crate::services::product::{ProductFilter, ProductService};
use shared::aggregation::{inventory_totals, InventoryTotals};
use shared::quantity::split_units;
use shared::reconciliation::transit_by_product;

#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
    feed: ChangeFeed,
}

/// Snapshot of one site and day as rendered by the entry screen
#[derive(Debug, Clone, Serialize)]
pub struct InventoryView {
    pub id: Option<Uuid>,
    pub site_id: String,
    pub site_label: String,
    pub inventory_date: NaiveDate,
    pub transit_recorded: bool,
    pub lines: Vec<SnapshotLineView>,
    pub totals: InventoryTotals,
    pub updated_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Header of a saved snapshot, for date pickers
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub id: Uuid,
    pub inventory_date: NaiveDate,
    pub transit_recorded: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SnapshotRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

const HEADER_COLUMNS: &str = "id, site_id, inventory_date, transit_recorded, updated_by, updated_at";
const LINE_COLUMNS: &str = "product_id, warehouse, consignment, rejected, committed, transit";

impl InventoryService {
    pub fn new(db: PgPool, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// Snapshot for a site and day, if one has been saved
    pub async fn get_inventory(
        &self,
        site_id: &str,
        date: NaiveDate,
    ) -> AppResult<Option<DailyInventory>> {
        let header = sqlx::query_as::<_, DailyInventoryRow>(&format!(
            "SELECT {} FROM daily_inventories WHERE site_id = $1 AND inventory_date = $2",
            HEADER_COLUMNS
        ))
        .bind(site_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, SnapshotLineRow>(&format!(
            "SELECT {} FROM daily_inventory_lines WHERE daily_inventory_id = $1",
            LINE_COLUMNS
        ))
        .bind(header.id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(
            header.with_lines(lines.into_iter().map(SnapshotLine::from).collect()),
        ))
    }

    /// Snapshot plus a zero line for every site product not counted yet
    pub async fn get_view(
        &self,
        site_id: &str,
        date: NaiveDate,
        products: &ProductService,
        reference: &ReferenceData,
    ) -> AppResult<InventoryView> {
        let snapshot = self.get_inventory(site_id, date).await?;
        let site_products = products
            .get_products(
                &ProductFilter {
                    site_id: Some(site_id.to_string()),
                    ..Default::default()
                },
                reference,
            )
            .await?;

        let mut lines: Vec<SnapshotLine> = snapshot
            .as_ref()
            .map(|s| s.lines.clone())
            .unwrap_or_default();
        let counted: HashSet<Uuid> = lines.iter().map(|l| l.product_id).collect();
        lines.extend(
            site_products
                .iter()
                .filter(|p| !counted.contains(&p.product.id))
                .map(|p| SnapshotLine {
                    product_id: p.product.id,
                    stock: StockLevel::default(),
                    transit: 0,
                }),
        );

        // Lines of deleted products stay visible under their raw id
        let mut catalogue: HashMap<Uuid, Product> = site_products
            .into_iter()
            .map(|p| (p.product.id, p.product))
            .collect();
        let missing: Vec<Uuid> = lines
            .iter()
            .map(|l| l.product_id)
            .filter(|id| !catalogue.contains_key(id))
            .collect();
        if !missing.is_empty() {
            for product in products.get_products_by_ids(&missing).await? {
                catalogue.insert(product.id, product);
            }
        }

        let totals = inventory_totals(&lines);
        let mut views: Vec<SnapshotLineView> = lines
            .into_iter()
            .map(|line| {
                let product = catalogue.get(&line.product_id);
                line_view(line, product)
            })
            .collect();
        views.sort_by(|a, b| a.product_label.cmp(&b.product_label));

        Ok(InventoryView {
            id: snapshot.as_ref().map(|s| s.id),
            site_id: site_id.to_string(),
            site_label: reference.site_label(site_id),
            inventory_date: date,
            transit_recorded: snapshot.as_ref().is_some_and(|s| s.transit_recorded),
            lines: views,
            totals,
            updated_by: snapshot.as_ref().and_then(|s| s.updated_by),
            updated_at: snapshot.as_ref().map(|s| s.updated_at),
        })
    }

    /// Saved snapshot headers of a site, newest first
    pub async fn list_snapshots(
        &self,
        site_id: &str,
        range: &SnapshotRangeQuery,
    ) -> AppResult<Vec<SnapshotSummary>> {
        let rows = sqlx::query_as::<_, DailyInventoryRow>(&format!(
            r#"
            SELECT {}
            FROM daily_inventories
            WHERE site_id = $1
              AND ($2::DATE IS NULL OR inventory_date >= $2)
              AND ($3::DATE IS NULL OR inventory_date <= $3)
            ORDER BY inventory_date DESC
            LIMIT 366
            "#,
            HEADER_COLUMNS
        ))
        .bind(site_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SnapshotSummary {
                id: row.id,
                inventory_date: row.inventory_date,
                transit_recorded: row.transit_recorded,
                updated_at: row.updated_at,
            })
            .collect())
    }

    /// Apply a merged draft to the (site, date) snapshot.
    ///
    /// `committed` is never touched here; only orders move it.
    pub async fn save_inventory(
        &self,
        user_id: Uuid,
        site_id: &str,
        date: NaiveDate,
        input: SaveInventoryInput,
        products: &ProductService,
    ) -> AppResult<DailyInventory> {
        if input.lines.is_empty() {
            return Err(AppError::validation(
                "lines",
                "Nothing to save",
                "No hay cambios para guardar",
            ));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = input.lines.iter().find(|l| !seen.insert(l.product_id)) {
            return Err(AppError::validation(
                "lines",
                &format!("Product {} appears more than once", dup.product_id),
                &format!("El producto {} aparece más de una vez", dup.product_id),
            ));
        }

        let ids: Vec<Uuid> = input.lines.iter().map(|l| l.product_id).collect();
        let catalogue: HashMap<Uuid, Product> = products
            .get_products_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        // Convert every box/unit pair before touching the database
        let mut counts: BTreeMap<Uuid, (i64, i64, i64)> = BTreeMap::new();
        for line in &input.lines {
            let product = catalogue
                .get(&line.product_id)
                .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
            if product.site_id != site_id {
                return Err(AppError::validation(
                    "product_id",
                    &format!("{} is not stocked at this site", product.name),
                    &format!("{} no pertenece a esta sede", product.name),
                ));
            }
            counts.insert(
                line.product_id,
                (
                    product.units(line.warehouse)?,
                    product.units(line.consignment)?,
                    product.units(line.rejected)?,
                ),
            );
        }

        let mut tx = self.db.begin().await?;

        // The upsert takes the header row lock for the rest of the transaction
        let header = sqlx::query_as::<_, DailyInventoryRow>(&format!(
            r#"
            INSERT INTO daily_inventories (site_id, inventory_date, updated_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (site_id, inventory_date)
            DO UPDATE SET updated_by = EXCLUDED.updated_by, updated_at = NOW()
            RETURNING {}
            "#,
            HEADER_COLUMNS
        ))
        .bind(site_id)
        .bind(date)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let existing = sqlx::query_as::<_, SnapshotLineRow>(&format!(
            r#"
            SELECT {}
            FROM daily_inventory_lines
            WHERE daily_inventory_id = $1 AND product_id = ANY($2)
            ORDER BY product_id
            FOR UPDATE
            "#,
            LINE_COLUMNS
        ))
        .bind(header.id)
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;
        let committed: HashMap<Uuid, i64> =
            existing.iter().map(|row| (row.product_id, row.committed)).collect();

        let record_transit = !header.transit_recorded;
        let transit = if record_transit {
            let yesterday: HashMap<Uuid, i64> = match date.pred_opt() {
                Some(previous) => {
                    sqlx::query_as::<_, (Uuid, i64)>(
                        r#"
                        SELECT l.product_id, l.warehouse
                        FROM daily_inventory_lines l
                        JOIN daily_inventories d ON d.id = l.daily_inventory_id
                        WHERE d.site_id = $1 AND d.inventory_date = $2 AND l.product_id = ANY($3)
                        "#,
                    )
                    .bind(site_id)
                    .bind(previous)
                    .bind(&ids)
                    .fetch_all(&mut *tx)
                    .await?
                    .into_iter()
                    .collect()
                }
                None => HashMap::new(),
            };
            let today: BTreeMap<Uuid, (i64, i64)> = counts
                .iter()
                .map(|(id, (warehouse, _, _))| {
                    (*id, (*warehouse, committed.get(id).copied().unwrap_or(0)))
                })
                .collect();
            transit_by_product(&yesterday, &today)
        } else {
            BTreeMap::new()
        };

        for (product_id, (warehouse, consignment, rejected)) in &counts {
            let line_committed = committed.get(product_id).copied().unwrap_or(0);
            if warehouse + consignment + rejected < line_committed {
                tracing::warn!(
                    site_id,
                    %date,
                    %product_id,
                    committed = line_committed,
                    "Recount leaves less stock than already committed"
                );
            }

            sqlx::query(
                r#"
                INSERT INTO daily_inventory_lines
                    (daily_inventory_id, product_id, warehouse, consignment, rejected, transit)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (daily_inventory_id, product_id) DO UPDATE
                SET warehouse = EXCLUDED.warehouse,
                    consignment = EXCLUDED.consignment,
                    rejected = EXCLUDED.rejected,
                    transit = CASE WHEN $7 THEN EXCLUDED.transit
                                   ELSE daily_inventory_lines.transit END
                "#,
            )
            .bind(header.id)
            .bind(product_id)
            .bind(warehouse)
            .bind(consignment)
            .bind(rejected)
            .bind(transit.get(product_id).copied().unwrap_or(0))
            .bind(record_transit)
            .execute(&mut *tx)
            .await?;
        }

        if record_transit {
            sqlx::query("UPDATE daily_inventories SET transit_recorded = TRUE WHERE id = $1")
                .bind(header.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            site_id,
            %date,
            lines = counts.len(),
            first_save = record_transit,
            "Daily inventory saved"
        );
        self.feed.publish(
            Collection::DailyInventories,
            header.id,
            if record_transit {
                ChangeKind::Created
            } else {
                ChangeKind::Updated
            },
        );

        self.get_inventory(site_id, date)
            .await?
            .ok_or_else(|| AppError::NotFound("Daily inventory".to_string()))
    }
}

/// Decompose every counter of a line into boxes and units
pub fn line_view(line: SnapshotLine, product: Option<&Product>) -> SnapshotLineView {
    let units_per_box = product.map(|p| p.units_per_box);
    let split = |total: i64| units_per_box.and_then(|upb| split_units(total, upb).ok());
    let available = line.available();

    SnapshotLineView {
        product_label: product
            .map(|p| p.name.clone())
            .unwrap_or_else(|| line.product_id.to_string()),
        units_per_box,
        available,
        warehouse_boxes: split(line.stock.warehouse),
        consignment_boxes: split(line.stock.consignment),
        rejected_boxes: split(line.stock.rejected),
        available_boxes: split(available),
        line,
    }
}
