//! Product catalogue service

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::feed::{ChangeFeed, ChangeKind, Collection};
use crate::models::{Product, ProductRow, ProductView, ReferenceData};
use shared::{
    validate_identifier, validate_name, validate_sku, validate_unit_price, validate_units_per_box,
};

#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    feed: ChangeFeed,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub sku: String,
    pub units_per_box: i32,
    pub unit_price: Decimal,
    pub beverage_type_id: String,
    pub site_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub units_per_box: Option<i32>,
    pub unit_price: Option<Decimal>,
    pub beverage_type_id: Option<String>,
    pub site_id: Option<String>,
}

/// Query parameters for the product list
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub q: Option<String>,
    pub site_id: Option<String>,
    pub beverage_type_id: Option<String>,
}

const PRODUCT_COLUMNS: &str = "id, name, sku, units_per_box, unit_price, beverage_type_id, \
                               site_id, created_at, updated_at";

impl ProductService {
    pub fn new(db: PgPool, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// List products by name with reference labels resolved
    pub async fn get_products(
        &self,
        filter: &ProductFilter,
        reference: &ReferenceData,
    ) -> AppResult<Vec<ProductView>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {}
            FROM products
            WHERE ($1::TEXT IS NULL OR site_id = $1)
              AND ($2::TEXT IS NULL OR beverage_type_id = $2)
            ORDER BY name ASC
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&filter.site_id)
        .bind(&filter.beverage_type_id)
        .fetch_all(&self.db)
        .await?;

        let products = shared::filter::search(
            rows.into_iter().map(Product::from).collect(),
            filter.q.as_deref(),
        );

        Ok(products
            .into_iter()
            .map(|product| view(product, reference))
            .collect())
    }

    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .map(Product::from)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Load the given products. Unknown ids are skipped.
    pub async fn get_products_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = ANY($1)",
            PRODUCT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<Product> {
        let sku = input.sku.trim().to_uppercase();
        check_fields(
            &input.name,
            &sku,
            input.units_per_box,
            input.unit_price,
            &input.beverage_type_id,
            &input.site_id,
        )?;

        // SKU is the SAP code and must stay unique
        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE sku = $1")
            .bind(&sku)
            .fetch_one(&self.db)
            .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("sku".to_string()));
        }

        let product = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (id, name, sku, units_per_box, unit_price, beverage_type_id, site_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(&sku)
        .bind(input.units_per_box)
        .bind(input.unit_price)
        .bind(&input.beverage_type_id)
        .bind(&input.site_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("sku".to_string())
            } else {
                e.into()
            }
        })?;

        tracing::info!(product_id = %product.id, sku = %product.sku, "Product created");
        self.feed
            .publish(Collection::Products, product.id, ChangeKind::Created);
        Ok(product.into())
    }

    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let existing = self.get_product(product_id).await?;

        let name = input.name.map(|n| n.trim().to_string()).unwrap_or(existing.name);
        let sku = input
            .sku
            .map(|s| s.trim().to_uppercase())
            .unwrap_or(existing.sku.clone());
        let units_per_box = input.units_per_box.unwrap_or(existing.units_per_box);
        let unit_price = input.unit_price.unwrap_or(existing.unit_price);
        let beverage_type_id = input.beverage_type_id.unwrap_or(existing.beverage_type_id);
        let site_id = input.site_id.unwrap_or(existing.site_id);

        check_fields(&name, &sku, units_per_box, unit_price, &beverage_type_id, &site_id)?;

        if sku != existing.sku {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM products WHERE sku = $1 AND id <> $2",
            )
            .bind(&sku)
            .bind(product_id)
            .fetch_one(&self.db)
            .await?;

            if taken > 0 {
                return Err(AppError::DuplicateEntry("sku".to_string()));
            }
        }

        let product = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET name = $1, sku = $2, units_per_box = $3, unit_price = $4,
                beverage_type_id = $5, site_id = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&name)
        .bind(&sku)
        .bind(units_per_box)
        .bind(unit_price)
        .bind(&beverage_type_id)
        .bind(&site_id)
        .bind(product_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("sku".to_string())
            } else {
                e.into()
            }
        })?;

        self.feed
            .publish(Collection::Products, product_id, ChangeKind::Updated);
        Ok(product.into())
    }

    /// Hard delete. Snapshot lines and order items keep the product id.
    pub async fn delete_product(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        tracing::info!(product_id = %product_id, "Product deleted");
        self.feed
            .publish(Collection::Products, product_id, ChangeKind::Deleted);
        Ok(())
    }
}

fn check_fields(
    name: &str,
    sku: &str,
    units_per_box: i32,
    unit_price: Decimal,
    beverage_type_id: &str,
    site_id: &str,
) -> AppResult<()> {
    validate_name(name)
        .map_err(|msg| AppError::validation("name", msg, "El nombre es obligatorio"))?;
    validate_sku(sku).map_err(|msg| {
        AppError::validation("sku", msg, "Código SAP inválido")
    })?;
    validate_units_per_box(units_per_box).map_err(|msg| {
        AppError::validation(
            "units_per_box",
            msg,
            "Las unidades por caja deben ser mayores a cero",
        )
    })?;
    validate_unit_price(unit_price).map_err(|msg| {
        AppError::validation("unit_price", msg, "El precio debe estar entre 0 y 9,999,999,999.99")
    })?;
    validate_identifier(beverage_type_id).map_err(|msg| {
        AppError::validation("beverage_type_id", msg, "Tipo de bebida inválido")
    })?;
    validate_identifier(site_id)
        .map_err(|msg| AppError::validation("site_id", msg, "Sede inválida"))?;
    Ok(())
}

fn view(product: Product, reference: &ReferenceData) -> ProductView {
    ProductView {
        beverage_type_label: reference.beverage_type_label(&product.beverage_type_id),
        site_label: reference.site_label(&product.site_id),
        product,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(site_id: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Cola 600ml".into(),
            sku: "CO600".into(),
            units_per_box: 24,
            unit_price: Decimal::new(1250, 2),
            beverage_type_id: "refresco".into(),
            site_id: site_id.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_view_falls_back_to_raw_site_id() {
        let view = view(product("deleted-site"), &ReferenceData::default());
        assert_eq!(view.site_label, "deleted-site");
        assert_eq!(view.beverage_type_label, "refresco");
    }

    #[test]
    fn test_check_fields_rejects_zero_units_per_box() {
        let err = check_fields("Cola", "CO600", 0, Decimal::ONE, "refresco", "GDL").unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "units_per_box"));
    }

    #[test]
    fn test_check_fields_rejects_negative_price() {
        let err = check_fields("Cola", "CO600", 12, Decimal::NEGATIVE_ONE, "refresco", "GDL").unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "unit_price"));
    }
}
