//! Stock reservation tests
//!
//! Tests for order placement arithmetic including:
//! - Property: concurrent orders never commit more than is available
//! - Property: a rejected order leaves every counter untouched
//! - Transit inference on the first save of the day

use proptest::prelude::*;
use shared::reconciliation::{compute_transit, release, reserve, transit_by_product};
use shared::StockLevel;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use uuid::Uuid;

fn level(warehouse: i64, consignment: i64, rejected: i64, committed: i64) -> StockLevel {
    StockLevel {
        warehouse,
        consignment,
        rejected,
        committed,
    }
}

/// Place orders from separate threads against one locked snapshot, the way
/// concurrent transactions serialise on `SELECT ... FOR UPDATE`.
fn place_concurrently(
    levels: HashMap<Uuid, StockLevel>,
    orders: Vec<Vec<(Uuid, i64)>>,
) -> (usize, HashMap<Uuid, StockLevel>) {
    let levels = Arc::new(Mutex::new(levels));
    let barrier = Arc::new(Barrier::new(orders.len()));

    let handles: Vec<_> = orders
        .into_iter()
        .map(|lines| {
            let levels = Arc::clone(&levels);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut guard = levels.lock().unwrap();
                reserve(&mut guard, &lines).is_ok()
            })
        })
        .collect();

    let accepted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    let final_levels = levels.lock().unwrap().clone();
    (accepted, final_levels)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// 10 available, two concurrent 6-unit orders
    #[test]
    fn test_two_orders_of_six_against_ten() {
        let product = Uuid::new_v4();
        let levels = HashMap::from([(product, level(10, 0, 0, 0))]);

        let (accepted, after) =
            place_concurrently(levels, vec![vec![(product, 6)], vec![(product, 6)]]);

        assert_eq!(accepted, 1);
        assert_eq!(after[&product].committed, 6);
        assert_eq!(after[&product].available(), 4);
    }

    #[test]
    fn test_consignment_and_rejected_count_as_available() {
        let product = Uuid::new_v4();
        let mut levels = HashMap::from([(product, level(2, 3, 1, 0))]);

        assert!(reserve(&mut levels, &[(product, 6)]).is_ok());
        assert_eq!(levels[&product].available(), 0);
        assert!(reserve(&mut levels, &[(product, 1)]).is_err());
    }

    #[test]
    fn test_cancel_returns_units() {
        let product = Uuid::new_v4();
        let mut levels = HashMap::from([(product, level(10, 0, 0, 0))]);

        reserve(&mut levels, &[(product, 6)]).unwrap();
        release(&mut levels, &[(product, 6)]);

        assert_eq!(levels[&product].committed, 0);
        assert!(reserve(&mut levels, &[(product, 10)]).is_ok());
    }

    #[test]
    fn test_transit_only_counts_unexplained_drop() {
        // 100 yesterday, 70 today, 10 reserved by orders
        assert_eq!(compute_transit(Some(100), 70, 10), 20);
        // No snapshot yesterday
        assert_eq!(compute_transit(None, 70, 10), 0);
    }

    #[test]
    fn test_transit_for_new_product() {
        let known = Uuid::new_v4();
        let new = Uuid::new_v4();
        let yesterday = HashMap::from([(known, 120)]);
        let today = BTreeMap::from([(known, (96, 12)), (new, (24, 0))]);

        let transit = transit_by_product(&yesterday, &today);
        assert_eq!(transit[&known], 12);
        assert_eq!(transit[&new], 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Property: Whatever the interleaving, accepted quantity never exceeds
    /// what was available and committed equals the accepted total.
    #[test]
    fn test_concurrent_orders_never_oversell(
        warehouse in 0i64..50,
        quantities in prop::collection::vec(1i64..20, 2..6),
    ) {
        let product = Uuid::new_v4();
        let levels = HashMap::from([(product, level(warehouse, 0, 0, 0))]);
        let orders: Vec<_> = quantities.iter().map(|&q| vec![(product, q)]).collect();

        let (_, after) = place_concurrently(levels, orders);

        prop_assert!(after[&product].available() >= 0);
        prop_assert!(after[&product].committed <= warehouse);
    }

    /// Property: A rejected order changes nothing
    #[test]
    fn test_rejected_order_is_atomic(
        stock_a in 0i64..100,
        stock_b in 0i64..100,
        want_a in 1i64..150,
        want_b in 1i64..150,
    ) {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let before = HashMap::from([(a, level(stock_a, 0, 0, 0)), (b, level(stock_b, 0, 0, 0))]);
        let mut levels = before.clone();

        match reserve(&mut levels, &[(a, want_a), (b, want_b)]) {
            Ok(()) => {
                prop_assert_eq!(levels[&a].committed, want_a);
                prop_assert_eq!(levels[&b].committed, want_b);
            }
            Err(shortage) => {
                prop_assert!(shortage.requested > shortage.available);
                prop_assert_eq!(levels, before);
            }
        }
    }

    /// Property: Transit is never negative
    #[test]
    fn test_transit_non_negative(
        yesterday in prop::option::of(0i64..1000),
        today in 0i64..1000,
        committed in 0i64..1000,
    ) {
        prop_assert!(compute_transit(yesterday, today, committed) >= 0);
    }
}
