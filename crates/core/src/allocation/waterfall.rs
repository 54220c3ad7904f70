//! Oldest-first waterfall allocation.
//!
//! A payment amount is consumed against open items in order. Each item receives
//! `min(remaining, outstanding)`; settled items are skipped and nothing is ever
//! allocated as zero or negative. Whatever is left over is returned as `remainder`.

use chrono::{DateTime, FixedOffset};
use quarry_shared::types::round_money;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::balance::{is_settled, outstanding};

/// A receipt or inventory entry that may still be owed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenItem {
    /// Entity id.
    pub id: Uuid,
    /// Document date, used for ordering.
    pub date: DateTime<FixedOffset>,
    /// Fixed document total.
    pub total: Decimal,
    /// Amount already paid.
    pub paid: Decimal,
}

impl OpenItem {
    /// Amount still owed.
    #[must_use]
    pub fn outstanding(&self) -> Decimal {
        outstanding(self.total, self.paid)
    }
}

/// A single slice of the waterfall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Entity that receives the money.
    pub entity_id: Uuid,
    /// Amount applied to it.
    pub applied: Decimal,
    /// Paid amount after this allocation.
    pub new_paid: Decimal,
    /// Outstanding amount after this allocation.
    pub new_outstanding: Decimal,
}

/// Output of `apply_waterfall`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaterfallResult {
    /// Non-zero allocations in application order.
    pub allocations: Vec<Allocation>,
    /// Part of the amount that found no open item.
    pub remainder: Decimal,
}

impl WaterfallResult {
    /// Total amount that was applied.
    #[must_use]
    pub fn total_applied(&self) -> Decimal {
        self.allocations.iter().map(|a| a.applied).sum()
    }
}

/// Sorts items oldest first: by date, then by id.
pub fn sort_oldest_first(items: &mut [OpenItem]) {
    items.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
}

/// Spreads `amount` over `items` in the given order.
///
/// Negative amounts are treated as zero. Callers sort the items first
/// (see `sort_oldest_first`).
#[must_use]
pub fn apply_waterfall(amount: Decimal, items: &[OpenItem]) -> WaterfallResult {
    let mut remaining = round_money(amount.max(Decimal::ZERO));
    let mut allocations = Vec::new();

    for item in items {
        if remaining <= Decimal::ZERO {
            break;
        }
        if is_settled(item.total, item.paid) {
            continue;
        }

        let applied = remaining.min(round_money(item.outstanding()));
        if applied <= Decimal::ZERO {
            continue;
        }

        let new_paid = item.paid + applied;
        remaining -= applied;
        allocations.push(Allocation {
            entity_id: item.id,
            applied,
            new_paid,
            new_outstanding: outstanding(item.total, new_paid),
        });
    }

    WaterfallResult {
        allocations,
        remainder: remaining,
    }
}
