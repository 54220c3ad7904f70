//! Property-based tests for payment sanitizing.

use chrono::{FixedOffset, TimeZone};
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

use super::custody::CustodyPolicy;
use super::sanitizer::PaymentSanitizer;
use super::types::{PaymentType, RawPaymentInput};

fn positive_cents() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

fn payment_type() -> impl Strategy<Value = PaymentType> {
    prop::sample::select(PaymentType::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A positive amount survives as the same value whether sent as string or number.
    #[test]
    fn prop_positive_amount_is_kept(cents in positive_cents()) {
        let expected = Decimal::new(cents, 2);

        let from_string = PaymentSanitizer::parse_amount(Some(&json!(expected.to_string())));
        prop_assert_eq!(from_string.unwrap(), expected);

        let from_number = PaymentSanitizer::parse_amount(Some(&json!(cents)));
        prop_assert_eq!(from_number.unwrap(), Decimal::from(cents));
    }

    /// Zero and negative amounts are always rejected.
    #[test]
    fn prop_non_positive_amount_rejected(cents in 0i64..1_000_000_000i64) {
        let value = Decimal::new(-cents, 2).to_string();
        prop_assert!(PaymentSanitizer::parse_amount(Some(&json!(value))).is_err());
    }

    /// Without any reference only the unlinked types validate.
    #[test]
    fn prop_required_reference(payment_type in payment_type(), cents in positive_cents()) {
        let raw = RawPaymentInput {
            amount: Some(json!(Decimal::new(cents, 2).to_string())),
            payment_type: Some(payment_type.as_str().to_string()),
            ..RawPaymentInput::default()
        };
        let now = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let result = PaymentSanitizer::sanitize_at(&raw, &CustodyPolicy::unrestricted(), now);
        let unlinked = matches!(
            payment_type,
            PaymentType::GeneralExpense | PaymentType::OwnerDraw | PaymentType::PayrollRun
        );
        prop_assert_eq!(result.is_ok(), unlinked);
    }
}
