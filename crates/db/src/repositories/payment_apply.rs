//! Applies a validated payment's side effects.
//!
//! Runs inside the transaction that inserted or updated the payment row. Links are
//! clamped against live balances, then every touched row goes through the
//! recompute pass, which is the only writer of paid fields.

use chrono::Utc;
use quarry_core::allocation::{OpenItem, apply_waterfall, sort_oldest_first};
use quarry_core::payment::PaymentTarget;
use quarry_shared::types::round_money;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect,
    Set,
};
use tracing::debug;
use uuid::Uuid;

use super::error::RepoError;
use super::payment::SanitizedPayment;
use super::reconcile::{recompute_inventory_entries, recompute_receipts};
use crate::entities::{
    debris_entries, inventory_entries, inventory_payments, payments, payroll_entries,
    receipt_payments, receipts,
    sea_orm_active_enums::{DebrisStatus, InventoryEntryType},
};

/// Rows touched by `apply_payment_effects`.
#[derive(Debug, Clone, Default)]
pub struct AppliedEffects {
    /// Receipt links created.
    pub receipt_links: Vec<receipt_payments::Model>,
    /// Inventory links created.
    pub inventory_links: Vec<inventory_payments::Model>,
    /// Payroll entry now pointing at the payment.
    pub payroll_entry: Option<payroll_entries::Model>,
    /// Debris entry now marked removed.
    pub debris_entry: Option<debris_entries::Model>,
    /// Recomputed receipts.
    pub receipts: Vec<receipts::Model>,
    /// Recomputed inventory entries.
    pub inventory_entries: Vec<inventory_entries::Model>,
}

/// Applies the side effects of `payment` according to its sanitized intent.
///
/// # Errors
///
/// Returns an error if a referenced row vanished or a query fails. The caller
/// drops the transaction, so nothing is persisted.
pub async fn apply_payment_effects(
    txn: &DatabaseTransaction,
    payment: &payments::Model,
    sanitized: &SanitizedPayment,
) -> Result<AppliedEffects, RepoError> {
    let mut effects = AppliedEffects::default();

    match sanitized.draft.target {
        PaymentTarget::Receipt { receipt_id } => {
            let id = receipt_id.into_inner();
            let fresh = recompute_receipts(txn, &[id]).await?;
            let receipt = fresh
                .models
                .into_iter()
                .next()
                .ok_or(RepoError::NotFound {
                    entity: "receipt",
                    id,
                })?;

            let owed = round_money(receipt.total - receipt.amount_paid);
            let applied = payment.amount.min(owed);
            if applied > Decimal::ZERO {
                effects
                    .receipt_links
                    .push(insert_receipt_link(txn, payment.id, id, applied).await?);
            }
            effects.receipts = recompute_receipts(txn, &[id]).await?.models;
        }
        PaymentTarget::Customer {
            apply_to_receipts: true,
            ..
        } => {
            let Some(plan) = &sanitized.receipt_plan else {
                return Ok(effects);
            };
            let ids: Vec<Uuid> = plan.allocations.iter().map(|a| a.entity_id).collect();
            let fresh = recompute_receipts(txn, &ids).await?.models;

            let mut remaining = payment.amount;
            for allocation in &plan.allocations {
                let Some(receipt) = fresh.iter().find(|r| r.id == allocation.entity_id) else {
                    continue;
                };
                let owed = round_money(receipt.total - receipt.amount_paid);
                let applied = allocation.applied.min(owed).min(remaining);
                if applied <= Decimal::ZERO {
                    continue;
                }
                remaining -= applied;
                effects
                    .receipt_links
                    .push(insert_receipt_link(txn, payment.id, receipt.id, applied).await?);
            }
            effects.receipts = recompute_receipts(txn, &ids).await?.models;
        }
        PaymentTarget::Supplier {
            supplier_id,
            apply_to_purchases: true,
        } => {
            let purchases: Vec<Uuid> = inventory_entries::Entity::find()
                .filter(inventory_entries::Column::SupplierId.eq(supplier_id.into_inner()))
                .filter(inventory_entries::Column::EntryType.eq(InventoryEntryType::Purchase))
                .select_only()
                .column(inventory_entries::Column::Id)
                .into_tuple()
                .all(txn)
                .await?;
            let fresh = recompute_inventory_entries(txn, &purchases).await?.models;

            let mut items: Vec<OpenItem> = fresh
                .iter()
                .filter(|e| !e.is_paid)
                .map(|e| OpenItem {
                    id: e.id,
                    date: e.date,
                    total: e.total_cost,
                    paid: e.amount_paid,
                })
                .collect();
            sort_oldest_first(&mut items);

            let result = apply_waterfall(payment.amount, &items);
            for allocation in &result.allocations {
                effects.inventory_links.push(
                    insert_inventory_link(txn, payment.id, allocation.entity_id, allocation.applied)
                        .await?,
                );
            }
            let touched: Vec<Uuid> = result.allocations.iter().map(|a| a.entity_id).collect();
            effects.inventory_entries = recompute_inventory_entries(txn, &touched).await?.models;
        }
        PaymentTarget::Payroll { entry_id } => {
            let id = entry_id.into_inner();
            let entry = payroll_entries::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(RepoError::NotFound {
                    entity: "payroll entry",
                    id,
                })?;
            let mut active: payroll_entries::ActiveModel = entry.into();
            active.payment_id = Set(Some(payment.id));
            effects.payroll_entry = Some(active.update(txn).await?);
        }
        PaymentTarget::Debris { entry_id } => {
            let id = entry_id.into_inner();
            let entry = debris_entries::Entity::find_by_id(id)
                .one(txn)
                .await?
                .ok_or(RepoError::NotFound {
                    entity: "debris entry",
                    id,
                })?;
            let mut active: debris_entries::ActiveModel = entry.into();
            active.status = Set(DebrisStatus::Removed);
            active.removal_cost = Set(Some(payment.amount));
            active.removal_date = Set(Some(payment.date));
            active.removal_payment_id = Set(Some(payment.id));
            effects.debris_entry = Some(active.update(txn).await?);
        }
        PaymentTarget::Customer { .. } | PaymentTarget::Supplier { .. } | PaymentTarget::Unlinked => {}
    }

    debug!(
        payment_id = %payment.id,
        receipt_links = effects.receipt_links.len(),
        inventory_links = effects.inventory_links.len(),
        "Payment effects applied"
    );
    Ok(effects)
}

async fn insert_receipt_link(
    txn: &DatabaseTransaction,
    payment_id: Uuid,
    receipt_id: Uuid,
    amount: Decimal,
) -> Result<receipt_payments::Model, RepoError> {
    let link = receipt_payments::ActiveModel {
        id: Set(Uuid::now_v7()),
        payment_id: Set(payment_id),
        receipt_id: Set(receipt_id),
        amount: Set(amount),
        created_at: Set(Utc::now().fixed_offset()),
    };
    Ok(link.insert(txn).await?)
}

async fn insert_inventory_link(
    txn: &DatabaseTransaction,
    payment_id: Uuid,
    inventory_entry_id: Uuid,
    amount: Decimal,
) -> Result<inventory_payments::Model, RepoError> {
    let link = inventory_payments::ActiveModel {
        id: Set(Uuid::now_v7()),
        payment_id: Set(payment_id),
        inventory_entry_id: Set(inventory_entry_id),
        amount: Set(amount),
        created_at: Set(Utc::now().fixed_offset()),
    };
    Ok(link.insert(txn).await?)
}
