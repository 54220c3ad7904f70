//! Property-based tests for the waterfall allocator.

use chrono::{DateTime, FixedOffset, TimeZone};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::waterfall::{OpenItem, apply_waterfall, sort_oldest_first};

/// Strategy for an amount between 0.00 and 10,000.00.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for one open item: (day offset, total, paid fraction in percent).
fn open_item() -> impl Strategy<Value = (i64, Decimal, u32)> {
    (0i64..365, amount(), 0u32..=120)
}

fn build_items(raw: Vec<(i64, Decimal, u32)>) -> Vec<OpenItem> {
    let base: DateTime<FixedOffset> = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .unwrap();

    let mut items: Vec<OpenItem> = raw
        .into_iter()
        .enumerate()
        .map(|(i, (days, total, pct))| OpenItem {
            id: Uuid::from_u128(i as u128 + 1),
            date: base + chrono::Duration::days(days),
            total,
            paid: (total * Decimal::from(pct) / Decimal::from(100)).round_dp(2),
        })
        .collect();
    sort_oldest_first(&mut items);
    items
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// No item ever ends up paid beyond its total because of the waterfall.
    #[test]
    fn prop_no_over_allocation(
        pay in amount(),
        raw in prop::collection::vec(open_item(), 0..12),
    ) {
        let items = build_items(raw);
        let result = apply_waterfall(pay, &items);

        for alloc in &result.allocations {
            let item = items.iter().find(|i| i.id == alloc.entity_id).unwrap();
            prop_assert!(alloc.applied > Decimal::ZERO);
            prop_assert!(alloc.applied <= item.outstanding());
            prop_assert!(alloc.new_paid <= item.total.max(item.paid));
        }
    }

    /// Applied plus remainder is exactly the amount, and applied never exceeds it.
    #[test]
    fn prop_conservation(
        pay in amount(),
        raw in prop::collection::vec(open_item(), 0..12),
    ) {
        let items = build_items(raw);
        let result = apply_waterfall(pay, &items);

        prop_assert!(result.total_applied() <= pay);
        prop_assert_eq!(result.total_applied() + result.remainder, pay);
    }

    /// Money only reaches a later item once every earlier open item is fully covered.
    #[test]
    fn prop_oldest_first(
        pay in amount(),
        raw in prop::collection::vec(open_item(), 1..12),
    ) {
        let items = build_items(raw);
        let result = apply_waterfall(pay, &items);

        if let Some(last) = result.allocations.last() {
            let last_pos = items.iter().position(|i| i.id == last.entity_id).unwrap();
            for earlier in &items[..last_pos] {
                if earlier.outstanding() > Decimal::ZERO {
                    let alloc = result
                        .allocations
                        .iter()
                        .find(|a| a.entity_id == earlier.id);
                    prop_assert!(alloc.is_some_and(|a| a.new_outstanding == Decimal::ZERO));
                }
            }
        }
    }

    /// A leftover remainder means every open item was filled.
    #[test]
    fn prop_remainder_implies_all_settled(
        pay in amount(),
        raw in prop::collection::vec(open_item(), 0..12),
    ) {
        let items = build_items(raw);
        let result = apply_waterfall(pay, &items);

        if result.remainder > Decimal::ZERO {
            let owed: Decimal = items.iter().map(OpenItem::outstanding).sum();
            prop_assert_eq!(result.total_applied(), owed);
        }
    }
}
