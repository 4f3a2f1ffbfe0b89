//! Local staging of warehouse counts between saves
//!
//! The warehouse page edits counts product by product; nothing is written
//! until the user saves, and a save sends one merged payload with every
//! product touched since the previous save.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::models::{InventoryCategory, InventoryLineInput, SaveInventoryInput, SnapshotLine};
use crate::quantity::{split_units, BoxQuantity, QuantityError};

/// Pending edits of one (site, date) snapshot
#[derive(Debug, Clone, Default)]
pub struct InventoryDraft {
    lines: BTreeMap<Uuid, InventoryLineInput>,
    touched: BTreeSet<Uuid>,
}

impl InventoryDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the draft from a loaded snapshot so untouched categories keep their saved counts
    pub fn from_snapshot<F>(lines: &[SnapshotLine], units_per_box: F) -> Result<Self, QuantityError>
    where
        F: Fn(Uuid) -> Option<i32>,
    {
        let mut draft = Self::new();
        for line in lines {
            let Some(per_box) = units_per_box(line.product_id) else {
                continue;
            };
            draft.lines.insert(
                line.product_id,
                InventoryLineInput {
                    product_id: line.product_id,
                    warehouse: split_units(line.stock.warehouse, per_box)?,
                    consignment: split_units(line.stock.consignment, per_box)?,
                    rejected: split_units(line.stock.rejected, per_box)?,
                },
            );
        }
        Ok(draft)
    }

    /// Record an edited count. Staging the value already held does not mark the product touched.
    pub fn stage(&mut self, product_id: Uuid, category: InventoryCategory, quantity: BoxQuantity) {
        let line = self.lines.entry(product_id).or_insert_with(|| InventoryLineInput {
            product_id,
            ..Default::default()
        });
        if line.get(category) != quantity {
            line.set(category, quantity);
            self.touched.insert(product_id);
        }
    }

    pub fn current(&self, product_id: Uuid) -> Option<&InventoryLineInput> {
        self.lines.get(&product_id)
    }

    pub fn is_dirty(&self) -> bool {
        !self.touched.is_empty()
    }

    pub fn touched_count(&self) -> usize {
        self.touched.len()
    }

    /// Payload covering every touched product; `None` when there is nothing to save
    pub fn payload(&self) -> Option<SaveInventoryInput> {
        if self.touched.is_empty() {
            return None;
        }
        let lines = self
            .touched
            .iter()
            .filter_map(|id| self.lines.get(id).copied())
            .collect();
        Some(SaveInventoryInput { lines })
    }

    /// Mark the current payload as saved. Call only after the write succeeded,
    /// so a failed save keeps every edit staged for retry.
    pub fn mark_saved(&mut self) {
        self.touched.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StockLevel;

    #[test]
    fn test_empty_draft_has_no_payload() {
        let draft = InventoryDraft::new();
        assert!(!draft.is_dirty());
        assert!(draft.payload().is_none());
    }

    #[test]
    fn test_payload_merges_touched_products() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut draft = InventoryDraft::new();

        draft.stage(a, InventoryCategory::Warehouse, BoxQuantity::new(3, 0));
        draft.stage(a, InventoryCategory::Rejected, BoxQuantity::new(0, 2));
        draft.stage(b, InventoryCategory::Consignment, BoxQuantity::new(1, 5));

        let payload = draft.payload().unwrap();
        assert_eq!(payload.lines.len(), 2);
        let line_a = payload.lines.iter().find(|l| l.product_id == a).unwrap();
        assert_eq!(line_a.warehouse, BoxQuantity::new(3, 0));
        assert_eq!(line_a.rejected, BoxQuantity::new(0, 2));
    }

    #[test]
    fn test_untouched_seeded_products_are_not_sent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let seeded = vec![
            SnapshotLine {
                product_id: a,
                stock: StockLevel {
                    warehouse: 30,
                    consignment: 6,
                    rejected: 0,
                    committed: 4,
                },
                transit: 0,
            },
            SnapshotLine {
                product_id: b,
                stock: StockLevel::default(),
                transit: 0,
            },
        ];
        let mut draft = InventoryDraft::from_snapshot(&seeded, |_| Some(12)).unwrap();
        assert!(!draft.is_dirty());

        // Same value as saved: still clean
        draft.stage(a, InventoryCategory::Warehouse, BoxQuantity::new(2, 6));
        assert!(!draft.is_dirty());

        draft.stage(a, InventoryCategory::Rejected, BoxQuantity::new(0, 1));
        let payload = draft.payload().unwrap();
        assert_eq!(payload.lines.len(), 1);
        // Consignment keeps its seeded value
        assert_eq!(payload.lines[0].consignment, BoxQuantity::new(0, 6));
    }

    #[test]
    fn test_mark_saved_clears_touched() {
        let a = Uuid::new_v4();
        let mut draft = InventoryDraft::new();
        draft.stage(a, InventoryCategory::Warehouse, BoxQuantity::new(1, 0));
        assert_eq!(draft.touched_count(), 1);

        draft.mark_saved();
        assert!(draft.payload().is_none());
        assert_eq!(draft.current(a).unwrap().warehouse, BoxQuantity::new(1, 0));
    }
}
