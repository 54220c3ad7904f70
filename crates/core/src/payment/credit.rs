//! Unapplied customer credit.
//!
//! The part of a customer payment that is not linked to any receipt is kept as an
//! implicit credit. It is never stored; every reader derives it here.

use quarry_shared::types::round_money;
use rust_decimal::Decimal;

/// `max(amount - sum(linked), 0)`, rounded to cents.
#[must_use]
pub fn unapplied_credit<I>(amount: Decimal, linked: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    let linked: Decimal = linked.into_iter().sum();
    round_money((amount - linked).max(Decimal::ZERO))
}
