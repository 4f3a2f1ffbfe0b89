//! WebAssembly module for the Beverage Distribution Manager
//!
//! Provides client-side computation for:
//! - Box/unit conversion on the entry screens
//! - Advisory stock pre-check before an order is sent
//! - Staging of warehouse counts between saves
//! - The persisted light/dark theme

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use wasm_bindgen::prelude::*;

use shared::draft::InventoryDraft;
use shared::reconciliation::find_shortages;
use shared::{label_or_id, split_units, BoxQuantity, InventoryCategory, SnapshotLine, StockLevel, Theme};

/// localStorage key of the colour scheme
pub const THEME_STORAGE_KEY: &str = "bdm.theme";

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

/// Total units of `boxes` full boxes plus `units` loose units
#[wasm_bindgen]
pub fn to_units(boxes: u32, units: u32, units_per_box: i32) -> Result<f64, JsValue> {
    shared::to_units(i64::from(boxes), i64::from(units), units_per_box)
        .map(|total| total as f64)
        .map_err(js_error)
}

/// Split a unit total into `{"boxes": n, "units": m}` JSON
#[wasm_bindgen]
pub fn split_into_boxes(total_units: f64, units_per_box: i32) -> Result<String, JsValue> {
    split_json(total_units as i64, units_per_box).map_err(js_error)
}

fn split_json(total_units: i64, units_per_box: i32) -> Result<String, String> {
    let quantity = split_units(total_units, units_per_box).map_err(|e| e.to_string())?;
    serde_json::to_string(&quantity).map_err(|e| e.to_string())
}

/// Price of a full box, as a decimal string
#[wasm_bindgen]
pub fn box_price(unit_price: &str, units_per_box: i32) -> Result<String, JsValue> {
    box_price_of(unit_price, units_per_box).map_err(js_error)
}

fn box_price_of(unit_price: &str, units_per_box: i32) -> Result<String, String> {
    let price = Decimal::from_str(unit_price.trim()).map_err(|e| e.to_string())?;
    price
        .checked_mul(Decimal::from(units_per_box))
        .map(|total| total.to_string())
        .ok_or_else(|| "Price is too large".to_string())
}

#[derive(Deserialize)]
struct UnitRequest {
    product_id: Uuid,
    quantity: i64,
}

/// Shortages of an order draft against the cached snapshot lines.
///
/// Advisory only: the server re-checks under lock when the order is placed.
#[wasm_bindgen]
pub fn check_availability(snapshot_lines_json: &str, requests_json: &str) -> Result<String, JsValue> {
    shortages_json(snapshot_lines_json, requests_json).map_err(js_error)
}

fn shortages_json(snapshot_lines_json: &str, requests_json: &str) -> Result<String, String> {
    let lines: Vec<SnapshotLine> =
        serde_json::from_str(snapshot_lines_json).map_err(|e| format!("Invalid snapshot JSON: {}", e))?;
    let requests: Vec<UnitRequest> =
        serde_json::from_str(requests_json).map_err(|e| format!("Invalid order JSON: {}", e))?;

    let levels: HashMap<Uuid, StockLevel> = lines.iter().map(|l| (l.product_id, l.stock)).collect();
    let requested: Vec<(Uuid, i64)> = requests.iter().map(|r| (r.product_id, r.quantity)).collect();

    serde_json::to_string(&find_shortages(&levels, &requested)).map_err(|e| e.to_string())
}

/// Display name for a reference id, or the id itself when the document is gone.
///
/// `entries_json` is a list of `{"id": .., "nombre": ..}` objects.
#[wasm_bindgen]
pub fn reference_label(entries_json: &str, id: &str) -> String {
    #[derive(Deserialize)]
    struct Entry {
        id: String,
        nombre: String,
    }

    let entries: Vec<Entry> = serde_json::from_str(entries_json).unwrap_or_default();
    label_or_id(entries.iter().map(|e| (e.id.as_str(), e.nombre.as_str())), id)
}

/// Stored theme, `light` when nothing (or something unknown) is stored
#[wasm_bindgen]
pub fn load_theme() -> String {
    let stored = local_storage().and_then(|s| s.get_item(THEME_STORAGE_KEY).ok().flatten());
    Theme::from_stored(stored.as_deref()).as_str().to_string()
}

/// Persist a theme and return the value actually stored
#[wasm_bindgen]
pub fn save_theme(theme: &str) -> Result<String, JsValue> {
    let theme = Theme::from_stored(Some(theme));
    let storage = local_storage().ok_or_else(|| js_error("localStorage is not available"))?;
    storage.set_item(THEME_STORAGE_KEY, theme.as_str())?;
    Ok(theme.as_str().to_string())
}

/// Flip between light and dark and persist the result
#[wasm_bindgen]
pub fn toggle_theme() -> Result<String, JsValue> {
    let current = Theme::from_stored(Some(&load_theme()));
    save_theme(current.toggled().as_str())
}

/// Today's date in the browser's time zone as `YYYY-MM-DD`, the default snapshot date
#[wasm_bindgen]
pub fn today() -> String {
    let now = js_sys::Date::new_0();
    format!(
        "{:04}-{:02}-{:02}",
        now.get_full_year(),
        now.get_month() + 1,
        now.get_date()
    )
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

fn parse_category(category: &str) -> Result<InventoryCategory, String> {
    match category {
        "warehouse" => Ok(InventoryCategory::Warehouse),
        "consignment" => Ok(InventoryCategory::Consignment),
        "rejected" => Ok(InventoryCategory::Rejected),
        other => Err(format!("Unknown inventory category: {}", other)),
    }
}

/// Warehouse counts staged in the browser until the user saves
#[wasm_bindgen]
pub struct WarehouseDraft {
    inner: InventoryDraft,
}

impl Default for WarehouseDraft {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl WarehouseDraft {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WarehouseDraft {
        WarehouseDraft {
            inner: InventoryDraft::new(),
        }
    }

    /// Seed from the `lines` of a loaded snapshot view (each carries `units_per_box`)
    #[wasm_bindgen(js_name = fromSnapshot)]
    pub fn from_snapshot(view_lines_json: &str) -> Result<WarehouseDraft, JsValue> {
        Self::seed(view_lines_json).map_err(js_error)
    }

    fn seed(view_lines_json: &str) -> Result<WarehouseDraft, String> {
        #[derive(Deserialize)]
        struct ViewLine {
            #[serde(flatten)]
            line: SnapshotLine,
            units_per_box: Option<i32>,
        }

        let view_lines: Vec<ViewLine> =
            serde_json::from_str(view_lines_json).map_err(|e| format!("Invalid snapshot JSON: {}", e))?;
        let per_box: HashMap<Uuid, i32> = view_lines
            .iter()
            .filter_map(|v| v.units_per_box.map(|upb| (v.line.product_id, upb)))
            .collect();
        let lines: Vec<SnapshotLine> = view_lines.into_iter().map(|v| v.line).collect();

        let inner = InventoryDraft::from_snapshot(&lines, |id| per_box.get(&id).copied())
            .map_err(|e| e.to_string())?;
        Ok(WarehouseDraft { inner })
    }

    /// Stage one edited category of one product
    pub fn stage(&mut self, product_id: &str, category: &str, boxes: u32, units: u32) -> Result<(), JsValue> {
        self.stage_count(product_id, category, boxes, units).map_err(js_error)
    }

    fn stage_count(&mut self, product_id: &str, category: &str, boxes: u32, units: u32) -> Result<(), String> {
        let product_id = Uuid::parse_str(product_id).map_err(|e| e.to_string())?;
        let category = parse_category(category)?;
        self.inner
            .stage(product_id, category, BoxQuantity::new(i64::from(boxes), i64::from(units)));
        Ok(())
    }

    #[wasm_bindgen(js_name = isDirty)]
    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }

    #[wasm_bindgen(js_name = touchedCount)]
    pub fn touched_count(&self) -> usize {
        self.inner.touched_count()
    }

    /// JSON body for `PUT /inventory/:site_id/:date`, or undefined when nothing changed
    pub fn payload(&self) -> Option<String> {
        self.inner
            .payload()
            .and_then(|payload| serde_json::to_string(&payload).ok())
    }

    /// Call after the save request succeeded
    #[wasm_bindgen(js_name = markSaved)]
    pub fn mark_saved(&mut self) {
        self.inner.mark_saved();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_units_and_split() {
        assert_eq!(to_units(3, 5, 12).ok(), Some(41.0));
        assert_eq!(split_json(41, 12).unwrap(), r#"{"boxes":3,"units":5}"#);
    }

    #[test]
    fn test_box_price() {
        assert_eq!(box_price_of("12.50", 24).unwrap(), "300.00");
        assert!(box_price_of("abc", 24).is_err());
    }

    #[test]
    fn test_check_availability_reports_shortage() {
        let product = Uuid::new_v4();
        let snapshot = format!(
            r#"[{{"product_id":"{}","warehouse":10,"consignment":0,"rejected":0,"committed":4,"transit":0}}]"#,
            product
        );
        let requests = format!(r#"[{{"product_id":"{}","quantity":7}}]"#, product);

        let shortages: serde_json::Value =
            serde_json::from_str(&shortages_json(&snapshot, &requests).unwrap()).unwrap();
        assert_eq!(shortages[0]["available"], 6);
        assert_eq!(shortages[0]["requested"], 7);
    }

    #[test]
    fn test_reference_label_falls_back_to_id() {
        let entries = r#"[{"id":"GDL","nombre":"Guadalajara"}]"#;
        assert_eq!(reference_label(entries, "GDL"), "Guadalajara");
        assert_eq!(reference_label(entries, "MTY"), "MTY");
    }

    #[test]
    fn test_draft_payload_contains_touched_products_only() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lines = format!(
            r#"[
                {{"product_id":"{a}","warehouse":24,"consignment":0,"rejected":0,"committed":0,"transit":0,"units_per_box":12}},
                {{"product_id":"{b}","warehouse":6,"consignment":0,"rejected":0,"committed":0,"transit":0,"units_per_box":6}}
            ]"#
        );
        let mut draft = WarehouseDraft::seed(&lines).unwrap();
        assert!(!draft.is_dirty());

        // Same value as saved: not a change
        draft.stage_count(&a.to_string(), "warehouse", 2, 0).unwrap();
        assert!(!draft.is_dirty());

        draft.stage_count(&b.to_string(), "rejected", 0, 1).unwrap();
        assert_eq!(draft.touched_count(), 1);

        let payload: serde_json::Value = serde_json::from_str(&draft.payload().unwrap()).unwrap();
        assert_eq!(payload["lines"].as_array().unwrap().len(), 1);
        assert_eq!(payload["lines"][0]["warehouse"]["boxes"], 1);

        draft.mark_saved();
        assert!(draft.payload().is_none());
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let mut draft = WarehouseDraft::new();
        assert!(draft
            .stage_count(&Uuid::new_v4().to_string(), "garage", 1, 0)
            .is_err());
    }
}
