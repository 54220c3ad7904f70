//! Property-based tests for settlement planning.

use chrono::{FixedOffset, TimeZone};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::service::SettlementService;
use crate::allocation::OpenItem;

fn items(seed: u128) -> impl Strategy<Value = Vec<OpenItem>> {
    prop::collection::vec((0i64..60, 0i64..500_000, 0i64..500_000), 0..8).prop_map(move |raw| {
        let base = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap();
        raw.into_iter()
            .enumerate()
            .map(|(i, (days, total, paid))| OpenItem {
                id: Uuid::from_u128(seed + i as u128),
                date: base + chrono::Duration::days(days),
                total: Decimal::new(total, 2),
                paid: Decimal::new(paid.min(total), 2),
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Both sides receive exactly the offset, which equals the smaller outstanding sum.
    #[test]
    fn prop_offset_is_symmetric(receipts in items(1_000), purchases in items(2_000)) {
        let receivable: Decimal = receipts.iter().map(OpenItem::outstanding).sum();
        let payable: Decimal = purchases.iter().map(OpenItem::outstanding).sum();

        let plan = SettlementService::plan(receipts, purchases);

        let receipt_side: Decimal = plan.receipt_allocations.iter().map(|a| a.applied).sum();
        let purchase_side: Decimal = plan.purchase_allocations.iter().map(|a| a.applied).sum();

        prop_assert_eq!(plan.offset, receivable.min(payable));
        prop_assert_eq!(receipt_side, plan.offset);
        prop_assert_eq!(purchase_side, plan.offset);
    }
}
