//! Paid / outstanding arithmetic for a single document.

use quarry_shared::types::{EPSILON, round_money};
use rust_decimal::Decimal;

/// Amount still owed on a document. Never negative.
#[must_use]
pub fn outstanding(total: Decimal, paid: Decimal) -> Decimal {
    (total - paid).max(Decimal::ZERO)
}

/// True when `paid` covers `total` within `EPSILON`.
#[must_use]
pub fn is_settled(total: Decimal, paid: Decimal) -> bool {
    paid >= total - EPSILON
}

/// Derived paid fields of a receipt or inventory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaidState {
    /// Sum of every contribution, rounded to cents.
    pub amount_paid: Decimal,
    /// `max(total - amount_paid, 0)`.
    pub outstanding: Decimal,
    /// Whether the document is settled.
    pub is_paid: bool,
}

impl PaidState {
    /// Builds the state from an already summed paid amount.
    #[must_use]
    pub fn from_paid(total: Decimal, amount_paid: Decimal) -> Self {
        let amount_paid = round_money(amount_paid);
        Self {
            amount_paid,
            outstanding: outstanding(total, amount_paid),
            is_paid: is_settled(total, amount_paid),
        }
    }

    /// Recomputes the state from the individual contributions (links, legacy
    /// payments, settlement offsets).
    #[must_use]
    pub fn derive<I>(total: Decimal, contributions: I) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        let paid: Decimal = contributions.into_iter().sum();
        Self::from_paid(total, paid)
    }

    /// True when the stored fields differ from this state.
    #[must_use]
    pub fn differs_from(&self, amount_paid: Decimal, is_paid: bool) -> bool {
        self.amount_paid != amount_paid || self.is_paid != is_paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(100), dec!(40), dec!(60))]
    #[case(dec!(100), dec!(100), dec!(0))]
    #[case(dec!(100), dec!(130), dec!(0))]
    #[case(dec!(0), dec!(0), dec!(0))]
    fn test_outstanding(#[case] total: Decimal, #[case] paid: Decimal, #[case] expected: Decimal) {
        assert_eq!(outstanding(total, paid), expected);
    }

    #[rstest]
    #[case(dec!(100), dec!(100), true)]
    #[case(dec!(100), dec!(99.9999995), true)]
    #[case(dec!(100), dec!(99.99), false)]
    #[case(dec!(0), dec!(0), true)]
    #[case(dec!(50), dec!(60), true)]
    fn test_is_settled(#[case] total: Decimal, #[case] paid: Decimal, #[case] expected: bool) {
        assert_eq!(is_settled(total, paid), expected);
    }

    #[test]
    fn test_derive_sums_contributions() {
        let state = PaidState::derive(dec!(150), [dec!(100), dec!(20), dec!(30)]);
        assert_eq!(state.amount_paid, dec!(150));
        assert_eq!(state.outstanding, dec!(0));
        assert!(state.is_paid);
    }

    #[test]
    fn test_derive_without_contributions() {
        let state = PaidState::derive(dec!(80), std::iter::empty());
        assert_eq!(state.amount_paid, dec!(0));
        assert_eq!(state.outstanding, dec!(80));
        assert!(!state.is_paid);
    }

    #[test]
    fn test_derive_rounds_sub_cent_residue() {
        let state = PaidState::derive(dec!(10), [dec!(3.333), dec!(3.333), dec!(3.334)]);
        assert_eq!(state.amount_paid, dec!(10.00));
        assert!(state.is_paid);
    }

    #[test]
    fn test_differs_from() {
        let state = PaidState::from_paid(dec!(100), dec!(40));
        assert!(!state.differs_from(dec!(40), false));
        assert!(state.differs_from(dec!(40), true));
        assert!(state.differs_from(dec!(39.99), false));
    }
}
