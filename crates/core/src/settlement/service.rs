//! Settlement planning.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::SettlementError;
use crate::allocation::{Allocation, OpenItem, apply_waterfall, sort_oldest_first};

/// How one customer/supplier pair is netted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementPlan {
    /// Amount offset on each side.
    pub offset: Decimal,
    /// Slices applied to the customer's receipts, oldest first.
    pub receipt_allocations: Vec<Allocation>,
    /// Slices applied to the supplier's purchases, oldest first.
    pub purchase_allocations: Vec<Allocation>,
}

impl SettlementPlan {
    /// True when nothing would be offset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offset <= Decimal::ZERO
    }
}

/// Stateless settlement rules.
pub struct SettlementService;

impl SettlementService {
    /// Nets a customer's open receipts against the paired supplier's open purchases.
    ///
    /// `offset = min(sum receipt outstanding, sum purchase outstanding)`, then the
    /// offset is spread oldest first on both sides.
    #[must_use]
    pub fn plan(mut receipts: Vec<OpenItem>, mut purchases: Vec<OpenItem>) -> SettlementPlan {
        sort_oldest_first(&mut receipts);
        sort_oldest_first(&mut purchases);

        let receivable: Decimal = receipts.iter().map(OpenItem::outstanding).sum();
        let payable: Decimal = purchases.iter().map(OpenItem::outstanding).sum();
        let offset = receivable.min(payable);

        if offset <= Decimal::ZERO {
            return SettlementPlan::default();
        }

        let receipt_side = apply_waterfall(offset, &receipts);
        let purchase_side = apply_waterfall(offset, &purchases);

        SettlementPlan {
            offset: receipt_side.total_applied().min(purchase_side.total_applied()),
            receipt_allocations: receipt_side.allocations,
            purchase_allocations: purchase_side.allocations,
        }
    }

    /// Rejects merging a record into itself.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::SelfMerge` when `source == target`.
    pub fn ensure_distinct(source: Uuid, target: Uuid) -> Result<(), SettlementError> {
        if source == target {
            Err(SettlementError::SelfMerge)
        } else {
            Ok(())
        }
    }
}
