//! Box/unit packaging conversion
//!
//! Every product is packed in boxes holding a fixed number of units. Counts
//! are entered as a (boxes, units) pair and stored as a single unit total:
//! `total = boxes * units_per_box + units`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while converting between box/unit pairs and unit totals
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("units per box must be greater than zero (got {0})")]
    InvalidUnitsPerBox(i32),

    #[error("quantities cannot be negative")]
    Negative,

    #[error("quantity is too large")]
    Overflow,
}

/// A quantity expressed in boxes plus loose units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxQuantity {
    pub boxes: i64,
    pub units: i64,
}

impl BoxQuantity {
    pub fn new(boxes: i64, units: i64) -> Self {
        Self { boxes, units }
    }

    /// Convert to a unit total. Loose units may exceed a full box.
    pub fn to_units(self, units_per_box: i32) -> Result<i64, QuantityError> {
        to_units(self.boxes, self.units, units_per_box)
    }
}

/// `boxes * units_per_box + units`, rejecting negative and overflowing input
pub fn to_units(boxes: i64, units: i64, units_per_box: i32) -> Result<i64, QuantityError> {
    if units_per_box <= 0 {
        return Err(QuantityError::InvalidUnitsPerBox(units_per_box));
    }
    if boxes < 0 || units < 0 {
        return Err(QuantityError::Negative);
    }

    boxes
        .checked_mul(i64::from(units_per_box))
        .and_then(|total| total.checked_add(units))
        .ok_or(QuantityError::Overflow)
}

/// Split a unit total into full boxes and the remaining loose units
pub fn split_units(total: i64, units_per_box: i32) -> Result<BoxQuantity, QuantityError> {
    if units_per_box <= 0 {
        return Err(QuantityError::InvalidUnitsPerBox(units_per_box));
    }
    if total < 0 {
        return Err(QuantityError::Negative);
    }

    let per_box = i64::from(units_per_box);
    Ok(BoxQuantity {
        boxes: total / per_box,
        units: total % per_box,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_to_units() {
        assert_eq!(to_units(3, 4, 12), Ok(40));
        assert_eq!(to_units(0, 0, 24), Ok(0));
        // Loose units beyond a full box are accepted as entered
        assert_eq!(to_units(1, 30, 24), Ok(54));
    }

    #[test]
    fn test_to_units_rejects_bad_input() {
        assert_eq!(to_units(1, 0, 0), Err(QuantityError::InvalidUnitsPerBox(0)));
        assert_eq!(to_units(-1, 0, 6), Err(QuantityError::Negative));
        assert_eq!(to_units(0, -2, 6), Err(QuantityError::Negative));
        assert_eq!(to_units(i64::MAX, 1, 6), Err(QuantityError::Overflow));
    }

    #[test]
    fn test_split_units() {
        assert_eq!(split_units(40, 12), Ok(BoxQuantity::new(3, 4)));
        assert_eq!(split_units(11, 12), Ok(BoxQuantity::new(0, 11)));
        assert_eq!(split_units(-1, 12), Err(QuantityError::Negative));
    }

    proptest! {
        #[test]
        fn prop_box_unit_round_trip(
            boxes in 0i64..100_000,
            units_per_box in 1i32..500,
            seed in 0i64..500,
        ) {
            let units = seed % i64::from(units_per_box);
            let total = to_units(boxes, units, units_per_box).unwrap();
            prop_assert_eq!(split_units(total, units_per_box).unwrap(), BoxQuantity::new(boxes, units));
        }
    }
}
