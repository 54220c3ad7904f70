//! Money helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` rounded to two places. Comparisons that decide
//! whether something is settled use `EPSILON` so sub-cent residue never leaves a
//! document looking open.

use rust_decimal::{Decimal, RoundingStrategy};

/// Tolerance used when comparing settled amounts (1e-6).
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// Largest amount a `NUMERIC(14, 2)` column holds (999 999 999 999.99).
pub const MAX_MONEY: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 2);

/// Largest quantity a `NUMERIC(14, 3)` column holds (99 999 999 999.999).
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 3);

/// Returns true when the rounded amount fits a `NUMERIC(14, 2)` column.
#[must_use]
pub fn fits_money_column(amount: Decimal) -> bool {
    round_money(amount).abs() <= MAX_MONEY
}

/// Rounds an amount to two decimal places (banker's rounding).
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Returns true when the amount is strictly greater than zero once rounded.
#[must_use]
pub fn is_positive_money(amount: Decimal) -> bool {
    round_money(amount) > Decimal::ZERO
}
