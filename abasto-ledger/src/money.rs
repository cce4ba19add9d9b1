//! Money calculation utilities using rust_decimal for precision
//!
//! All intermediate arithmetic is done in `Decimal`, then converted back
//! to `f64` for storage/serialization, rounded to 2 decimal places.

use rust_decimal::prelude::*;

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round an f64 amount to 2 decimal places through Decimal
#[inline]
pub fn round2(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Per-line total: unit price times quantity
pub fn line_total(unit_price: f64, quantity: f64) -> f64 {
    to_f64(to_decimal(unit_price) * to_decimal(quantity))
}

/// Scale an amount by a factor (percentage adjustments), rounded
pub fn scale(value: f64, factor: f64) -> f64 {
    to_f64(to_decimal(value) * to_decimal(factor))
}

/// Weighted-average unit cost after merging a new lot into existing stock
///
/// `(existing_qty * existing_unit_cost + lot_cost) / new_total`, with a
/// 0-guard when the merged quantity is zero.
pub fn weighted_unit_cost(
    existing_qty: f64,
    existing_unit_cost: f64,
    lot_cost: f64,
    new_total: f64,
) -> f64 {
    let total = to_decimal(new_total);
    if total <= Decimal::ZERO {
        return 0.0;
    }
    let merged_value =
        to_decimal(existing_qty) * to_decimal(existing_unit_cost) + to_decimal(lot_cost);
    to_f64(merged_value / total)
}

/// Unit cost of a fresh lot: total cost over unit count, 0-guarded
pub fn lot_unit_cost(cost: f64, units: f64) -> f64 {
    if units <= 0.0 {
        return 0.0;
    }
    to_f64(to_decimal(cost) / to_decimal(units))
}
