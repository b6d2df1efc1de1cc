//! # Lot Selector
//!
//! Partitions one ingredient's requested quantity across its matched
//! inventory lots, oldest expiration first ("first in / first perishable").
//! Lots without an expiration date sort last and are consumed only when the
//! dated lots run out. A lot whose unit cannot be converted to the requested
//! unit is skipped rather than failing the ingredient; whatever the walk
//! cannot cover is reported as a shortfall, never as an error.

use log::{debug, trace};

use crate::ingredient_model::{InventoryLot, UsageAllocation};
use crate::unit_conversion::ConversionTable;

/// Quantities at or below this are treated as zero during allocation
pub const AMOUNT_EPSILON: f64 = 1e-9;

/// Result of allocating one ingredient across its matched lots
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationOutcome {
    /// Planned deductions in draw order (soonest expiration first)
    pub allocations: Vec<UsageAllocation>,
    /// Unmet remainder in the requested unit; 0.0 when fully covered
    pub shortfall: f64,
}

impl AllocationOutcome {
    /// True when the requested amount was fully covered
    pub fn fully_covered(&self) -> bool {
        self.shortfall <= AMOUNT_EPSILON
    }
}

/// Allocate `requested_amount` of `requested_unit` across the matched lots.
///
/// Lots are walked in expiration order; each contributes
/// `min(lot.quantity, remaining)` in its own native unit. Conversion into a
/// lot's unit goes through the table with the ingredient name so density
/// factors apply; a lot that cannot be converted is skipped and logged.
pub fn allocate(
    ingredient_name: &str,
    requested_amount: f64,
    requested_unit: &str,
    matched_lots: &[&InventoryLot],
    table: &ConversionTable,
) -> AllocationOutcome {
    let mut lots: Vec<&InventoryLot> = matched_lots.to_vec();
    lots.sort_by_key(|lot| (lot.expiration_key(), lot.id));

    let mut allocations = Vec::new();
    let mut remaining = requested_amount;

    for lot in lots {
        if remaining <= AMOUNT_EPSILON {
            break;
        }
        if lot.quantity <= AMOUNT_EPSILON {
            trace!("Skipping empty lot {} ({})", lot.id, lot.product_name);
            continue;
        }

        // Express the outstanding request in this lot's native unit
        let needed = match table.convert(remaining, requested_unit, &lot.unit, Some(ingredient_name))
        {
            Ok(amount) => amount,
            Err(err) => {
                debug!(
                    "Skipping lot {} ({}): cannot convert {} -> {}: {}",
                    lot.id, lot.product_name, requested_unit, lot.unit, err
                );
                continue;
            }
        };

        let take = lot.quantity.min(needed);
        if take <= AMOUNT_EPSILON {
            continue;
        }

        allocations.push(UsageAllocation {
            lot_id: lot.id,
            amount_to_deduct: take,
            unit: lot.unit.clone(),
            resulting_quantity: lot.quantity - take,
            lot_version: lot.version,
        });

        // Conversion is purely multiplicative, so the consumed fraction of
        // `needed` is the consumed fraction of `remaining`
        if take >= needed {
            remaining = 0.0;
        } else {
            remaining *= 1.0 - take / needed;
        }
    }

    if remaining <= AMOUNT_EPSILON {
        remaining = 0.0;
    } else {
        debug!(
            "Shortfall of {} {} for '{}' after {} allocation(s)",
            remaining,
            requested_unit,
            ingredient_name,
            allocations.len()
        );
    }

    AllocationOutcome {
        allocations,
        shortfall: remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    #[test]
    fn test_oldest_expiring_lot_drawn_first() {
        let day1 = InventoryLot::new(1, "milk", 1.0, "cup").with_expiration(day(1));
        let day5 = InventoryLot::new(2, "milk", 1.0, "cup").with_expiration(day(5));
        let undated = InventoryLot::new(3, "milk", 1.0, "cup");
        // Deliberately unsorted input
        let lots = vec![&undated, &day5, &day1];

        let outcome = allocate("milk", 2.5, "cup", &lots, ConversionTable::builtin());

        let order: Vec<i64> = outcome.allocations.iter().map(|a| a.lot_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(outcome.allocations[0].amount_to_deduct, 1.0);
        assert_eq!(outcome.allocations[1].amount_to_deduct, 1.0);
        assert_eq!(outcome.allocations[2].amount_to_deduct, 0.5);
        assert!(outcome.fully_covered());
    }

    #[test]
    fn test_partial_draw_leaves_remainder_in_lot() {
        let lot = InventoryLot::new(1, "milk", 2.0, "cup").with_expiration(day(1));
        let lots = vec![&lot];

        let outcome = allocate("milk", 0.5, "cup", &lots, ConversionTable::builtin());

        assert_eq!(outcome.allocations.len(), 1);
        assert_eq!(outcome.allocations[0].amount_to_deduct, 0.5);
        assert_eq!(outcome.allocations[0].resulting_quantity, 1.5);
        assert!(outcome.fully_covered());
    }

    #[test]
    fn test_shortfall_reported_not_dropped() {
        let lot = InventoryLot::new(1, "milk", 1.0, "cup").with_expiration(day(1));
        let lots = vec![&lot];

        let outcome = allocate("milk", 3.0, "cup", &lots, ConversionTable::builtin());

        assert_eq!(outcome.allocations.len(), 1);
        assert_eq!(outcome.allocations[0].amount_to_deduct, 1.0);
        assert!((outcome.shortfall - 2.0).abs() < 1e-9);
        assert!(!outcome.fully_covered());
    }

    #[test]
    fn test_cross_unit_draw() {
        // Request in cups, lot stored in milliliters
        let lot = InventoryLot::new(1, "milk", 500.0, "ml").with_expiration(day(1));
        let lots = vec![&lot];

        let outcome = allocate("milk", 1.0, "cup", &lots, ConversionTable::builtin());

        assert_eq!(outcome.allocations.len(), 1);
        let taken = outcome.allocations[0].amount_to_deduct;
        assert!((taken - 236.588_236_5).abs() < 1e-6, "took {taken} ml");
        assert_eq!(outcome.allocations[0].unit, "ml");
        assert!(outcome.fully_covered());
    }

    #[test]
    fn test_unconvertible_lot_skipped() {
        // A count lot cannot absorb a volume request; the dated volume lot
        // behind it still gets drawn
        let count_lot = InventoryLot::new(1, "milk", 4.0, "each").with_expiration(day(1));
        let volume_lot = InventoryLot::new(2, "milk", 2.0, "cup").with_expiration(day(5));
        let lots = vec![&count_lot, &volume_lot];

        let outcome = allocate("milk", 1.0, "cup", &lots, ConversionTable::builtin());

        assert_eq!(outcome.allocations.len(), 1);
        assert_eq!(outcome.allocations[0].lot_id, 2);
        assert!(outcome.fully_covered());
    }

    #[test]
    fn test_density_bridged_draw() {
        // Request by volume against a lot stored by weight
        let lot = InventoryLot::new(1, "flour", 1000.0, "g").with_expiration(day(1));
        let lots = vec![&lot];

        let outcome = allocate("flour", 1.0, "cup", &lots, ConversionTable::builtin());

        assert_eq!(outcome.allocations.len(), 1);
        let grams = outcome.allocations[0].amount_to_deduct;
        assert!((grams - 236.588_236_5 * 0.529).abs() < 0.01, "took {grams} g");
        assert!(outcome.fully_covered());
    }

    #[test]
    fn test_conservation_across_lots() {
        let lot_a = InventoryLot::new(1, "milk", 0.4, "cup").with_expiration(day(1));
        let lot_b = InventoryLot::new(2, "milk", 100.0, "ml").with_expiration(day(5));
        let lots = vec![&lot_a, &lot_b];

        let requested = 0.7;
        let outcome = allocate("milk", requested, "cup", &lots, ConversionTable::builtin());

        // Sum of deductions converted back to cups never exceeds the request
        let total_cups: f64 = outcome
            .allocations
            .iter()
            .map(|a| {
                ConversionTable::builtin()
                    .convert(a.amount_to_deduct, &a.unit, "cup", Some("milk"))
                    .unwrap()
            })
            .sum();
        assert!(total_cups <= requested + 1e-9);
        assert!((total_cups + outcome.shortfall - requested).abs() < 1e-9);
    }

    #[test]
    fn test_empty_lot_list_is_pure_shortfall() {
        let outcome = allocate("milk", 1.0, "cup", &[], ConversionTable::builtin());
        assert!(outcome.allocations.is_empty());
        assert_eq!(outcome.shortfall, 1.0);
    }
}
