//! Box/unit conversion tests
//!
//! Tests for packaging arithmetic including:
//! - Property: a unit total splits back into the boxes and units it was entered as
//! - Property: conversion never accepts negative or non-positive packaging

use proptest::prelude::*;
use shared::{split_units, to_units, BoxQuantity, QuantityError};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_full_boxes_plus_loose_units() {
        assert_eq!(to_units(3, 5, 12), Ok(41));
        assert_eq!(split_units(41, 12), Ok(BoxQuantity::new(3, 5)));
    }

    #[test]
    fn test_loose_units_may_exceed_a_box() {
        // Normalised on the way back
        let total = to_units(1, 30, 24).unwrap();
        assert_eq!(total, 54);
        assert_eq!(split_units(total, 24), Ok(BoxQuantity::new(2, 6)));
    }

    #[test]
    fn test_single_unit_boxes() {
        assert_eq!(to_units(7, 0, 1), Ok(7));
        assert_eq!(split_units(7, 1), Ok(BoxQuantity::new(7, 0)));
    }

    #[test]
    fn test_invalid_units_per_box() {
        assert_eq!(to_units(1, 0, 0), Err(QuantityError::InvalidUnitsPerBox(0)));
        assert_eq!(split_units(10, -4), Err(QuantityError::InvalidUnitsPerBox(-4)));
    }

    #[test]
    fn test_negative_counts_rejected() {
        assert_eq!(to_units(-1, 0, 12), Err(QuantityError::Negative));
        assert_eq!(to_units(0, -1, 12), Err(QuantityError::Negative));
        assert_eq!(split_units(-1, 12), Err(QuantityError::Negative));
    }

    #[test]
    fn test_overflow_detected() {
        assert_eq!(to_units(i64::MAX, 0, 2), Err(QuantityError::Overflow));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Property: For all (boxes, units, upb) with units < upb,
    /// `boxes * upb + units` splits back to (boxes, units).
    #[test]
    fn test_split_inverts_conversion(
        boxes in 0i64..100_000,
        upb in 1i32..=240,
        units_seed in 0i64..240,
    ) {
        let units = units_seed % i64::from(upb);
        let total = to_units(boxes, units, upb).unwrap();

        prop_assert_eq!(total, boxes * i64::from(upb) + units);
        prop_assert_eq!(split_units(total, upb).unwrap(), BoxQuantity::new(boxes, units));
    }

    /// Property: Splitting never loses units
    #[test]
    fn test_split_preserves_total(
        total in 0i64..10_000_000,
        upb in 1i32..=240,
    ) {
        let quantity = split_units(total, upb).unwrap();
        prop_assert!(quantity.units < i64::from(upb));
        prop_assert_eq!(quantity.to_units(upb).unwrap(), total);
    }
}
