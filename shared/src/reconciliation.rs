//! Stock reservation and day-over-day reconciliation
//!
//! Reservation is all-or-nothing: every requested product is checked against
//! its freshly read availability before any counter changes. Callers hold the
//! snapshot rows locked while applying it.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::StockLevel;

/// A requested line that exceeds what the snapshot can cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("product {product_id}: requested {requested} units, {available} available")]
pub struct StockShortage {
    pub product_id: Uuid,
    pub requested: i64,
    pub available: i64,
}

/// Sum requested quantities per product, preserving first-seen order
pub fn merge_requests(requests: &[(Uuid, i64)]) -> Vec<(Uuid, i64)> {
    let mut merged: Vec<(Uuid, i64)> = Vec::with_capacity(requests.len());
    for &(product_id, quantity) in requests {
        match merged.iter_mut().find(|(id, _)| *id == product_id) {
            Some((_, total)) => *total += quantity,
            None => merged.push((product_id, quantity)),
        }
    }
    merged
}

/// Products whose availability cannot cover the merged request
pub fn find_shortages(
    levels: &HashMap<Uuid, StockLevel>,
    requests: &[(Uuid, i64)],
) -> Vec<StockShortage> {
    merge_requests(requests)
        .into_iter()
        .filter_map(|(product_id, requested)| {
            let available = levels.get(&product_id).map(StockLevel::available).unwrap_or(0);
            (requested > available).then_some(StockShortage {
                product_id,
                requested,
                available,
            })
        })
        .collect()
}

/// Increment `committed` for every requested product, or change nothing and
/// report the first shortage.
pub fn reserve(
    levels: &mut HashMap<Uuid, StockLevel>,
    requests: &[(Uuid, i64)],
) -> Result<(), StockShortage> {
    if let Some(shortage) = find_shortages(levels, requests).into_iter().next() {
        return Err(shortage);
    }

    for (product_id, quantity) in merge_requests(requests) {
        if let Some(level) = levels.get_mut(&product_id) {
            level.committed += quantity;
        }
    }
    Ok(())
}

/// Give back units reserved by a cancelled order. Counters never drop below zero.
pub fn release(levels: &mut HashMap<Uuid, StockLevel>, reserved: &[(Uuid, i64)]) {
    for (product_id, quantity) in merge_requests(reserved) {
        if let Some(level) = levels.get_mut(&product_id) {
            level.committed = (level.committed - quantity).max(0);
        }
    }
}

/// Units that left the warehouse since yesterday without a matching commitment.
///
/// `max(0, yesterday_warehouse - today_warehouse - committed)`; no previous
/// snapshot means nothing can be inferred.
pub fn compute_transit(yesterday_warehouse: Option<i64>, today_warehouse: i64, committed: i64) -> i64 {
    match yesterday_warehouse {
        Some(yesterday) => (yesterday - today_warehouse - committed).max(0),
        None => 0,
    }
}

/// Transit per product for a first save of the day
pub fn transit_by_product(
    yesterday: &HashMap<Uuid, i64>,
    today: &BTreeMap<Uuid, (i64, i64)>,
) -> BTreeMap<Uuid, i64> {
    today
        .iter()
        .map(|(product_id, &(warehouse, committed))| {
            let transit = compute_transit(yesterday.get(product_id).copied(), warehouse, committed);
            (*product_id, transit)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;

    fn level(warehouse: i64, committed: i64) -> StockLevel {
        StockLevel {
            warehouse,
            consignment: 0,
            rejected: 0,
            committed,
        }
    }

    #[test]
    fn test_reserve_increments_committed() {
        let product = Uuid::new_v4();
        let mut levels = HashMap::from([(product, level(10, 2))]);

        reserve(&mut levels, &[(product, 5)]).unwrap();

        assert_eq!(levels[&product].committed, 7);
        assert_eq!(levels[&product].available(), 3);
    }

    #[test]
    fn test_reserve_is_all_or_nothing() {
        let enough = Uuid::new_v4();
        let short = Uuid::new_v4();
        let mut levels = HashMap::from([(enough, level(50, 0)), (short, level(4, 0))]);

        let err = reserve(&mut levels, &[(enough, 10), (short, 5)]).unwrap_err();

        assert_eq!(err.product_id, short);
        assert_eq!(err.available, 4);
        assert_eq!(levels[&enough].committed, 0);
        assert_eq!(levels[&short].committed, 0);
    }

    #[test]
    fn test_repeated_lines_are_summed() {
        let product = Uuid::new_v4();
        let mut levels = HashMap::from([(product, level(10, 0))]);

        let err = reserve(&mut levels, &[(product, 6), (product, 6)]).unwrap_err();
        assert_eq!(err.requested, 12);
    }

    #[test]
    fn test_unknown_product_has_nothing_available() {
        let mut levels = HashMap::new();
        let product = Uuid::new_v4();
        let err = reserve(&mut levels, &[(product, 1)]).unwrap_err();
        assert_eq!(err.available, 0);
    }

    #[test]
    fn test_concurrent_orders_only_one_succeeds() {
        let product = Uuid::new_v4();
        let levels = Arc::new(Mutex::new(HashMap::from([(product, level(10, 0))])));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let levels = Arc::clone(&levels);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let mut guard = levels.lock().unwrap();
                    reserve(&mut guard, &[(product, 6)])
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(failure.available, 4);
        assert_eq!(levels.lock().unwrap()[&product].committed, 6);
    }

    #[test]
    fn test_release_never_goes_negative() {
        let product = Uuid::new_v4();
        let mut levels = HashMap::from([(product, level(10, 3))]);
        release(&mut levels, &[(product, 5)]);
        assert_eq!(levels[&product].committed, 0);
    }

    #[test]
    fn test_compute_transit() {
        assert_eq!(compute_transit(Some(100), 70, 10), 20);
        assert_eq!(compute_transit(Some(100), 90, 10), 0);
        // Restocked overnight
        assert_eq!(compute_transit(Some(50), 80, 0), 0);
        assert_eq!(compute_transit(None, 80, 0), 0);
    }

    #[test]
    fn test_transit_by_product() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let yesterday = HashMap::from([(a, 48)]);
        let today = BTreeMap::from([(a, (36, 0)), (b, (12, 0))]);

        let transit = transit_by_product(&yesterday, &today);
        assert_eq!(transit[&a], 12);
        assert_eq!(transit[&b], 0);
    }
}
