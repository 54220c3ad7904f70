//! Undoes a payment's side effects.
//!
//! Used before deleting a payment and before re-applying an edited one, inside the
//! same transaction. After reversal the payment owns no links and the rows it
//! touched are recomputed without it.

use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::debug;
use uuid::Uuid;

use super::error::RepoError;
use super::reconcile::{recompute_inventory_entries, recompute_receipts};
use crate::entities::{
    debris_entries, inventory_payments, payments, payroll_entries, receipt_payments,
    sea_orm_active_enums::DebrisStatus,
};

/// Everything a payment currently owns.
#[derive(Debug, Clone, Default)]
pub struct PaymentLinks {
    /// Receipt links.
    pub receipt_links: Vec<receipt_payments::Model>,
    /// Inventory links.
    pub inventory_links: Vec<inventory_payments::Model>,
    /// Payroll entry settled by the payment.
    pub payroll_entry: Option<payroll_entries::Model>,
    /// Debris entry settled by the payment.
    pub debris_entry: Option<debris_entries::Model>,
}

impl PaymentLinks {
    /// Receipts referenced by the links.
    #[must_use]
    pub fn receipt_ids(&self) -> Vec<Uuid> {
        self.receipt_links.iter().map(|l| l.receipt_id).collect()
    }

    /// Inventory entries referenced by the links.
    #[must_use]
    pub fn inventory_entry_ids(&self) -> Vec<Uuid> {
        self.inventory_links
            .iter()
            .map(|l| l.inventory_entry_id)
            .collect()
    }
}

/// Rows whose paid fields changed because of a reversal.
#[derive(Debug, Clone, Default)]
pub struct ReversedEffects {
    /// Receipts recomputed.
    pub receipt_ids: Vec<Uuid>,
    /// Inventory entries recomputed.
    pub inventory_entry_ids: Vec<Uuid>,
}

/// Loads every link owned by a payment.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn load_links<C>(conn: &C, payment_id: Uuid) -> Result<PaymentLinks, DbErr>
where
    C: ConnectionTrait,
{
    let receipt_links = receipt_payments::Entity::find()
        .filter(receipt_payments::Column::PaymentId.eq(payment_id))
        .order_by_asc(receipt_payments::Column::Id)
        .all(conn)
        .await?;
    let inventory_links = inventory_payments::Entity::find()
        .filter(inventory_payments::Column::PaymentId.eq(payment_id))
        .order_by_asc(inventory_payments::Column::Id)
        .all(conn)
        .await?;
    let payroll_entry = payroll_entries::Entity::find()
        .filter(payroll_entries::Column::PaymentId.eq(payment_id))
        .one(conn)
        .await?;
    let debris_entry = debris_entries::Entity::find()
        .filter(debris_entries::Column::RemovalPaymentId.eq(payment_id))
        .one(conn)
        .await?;

    Ok(PaymentLinks {
        receipt_links,
        inventory_links,
        payroll_entry,
        debris_entry,
    })
}

/// Removes all side effects of `payment`.
///
/// A legacy payment (`allocation_tracked = false`) is marked tracked first so
/// the recompute stops counting it against its receipt.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn reverse_payment_effects(
    txn: &DatabaseTransaction,
    payment: &payments::Model,
) -> Result<ReversedEffects, RepoError> {
    let links = load_links(txn, payment.id).await?;

    receipt_payments::Entity::delete_many()
        .filter(receipt_payments::Column::PaymentId.eq(payment.id))
        .exec(txn)
        .await?;
    inventory_payments::Entity::delete_many()
        .filter(inventory_payments::Column::PaymentId.eq(payment.id))
        .exec(txn)
        .await?;

    if let Some(entry) = links.payroll_entry.clone() {
        let mut active: payroll_entries::ActiveModel = entry.into();
        active.payment_id = Set(None);
        active.update(txn).await?;
    }

    if let Some(entry) = links.debris_entry.clone() {
        let mut active: debris_entries::ActiveModel = entry.into();
        active.status = Set(DebrisStatus::Pending);
        active.removal_cost = Set(None);
        active.removal_date = Set(None);
        active.removal_payment_id = Set(None);
        active.update(txn).await?;
    }

    if !payment.allocation_tracked {
        let mut active: payments::ActiveModel = payment.clone().into();
        active.allocation_tracked = Set(true);
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(txn).await?;
    }

    let receipt_ids: Vec<Uuid> = links
        .receipt_ids()
        .into_iter()
        .chain(payment.receipt_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let inventory_entry_ids = links.inventory_entry_ids();

    recompute_receipts(txn, &receipt_ids).await?;
    recompute_inventory_entries(txn, &inventory_entry_ids).await?;

    debug!(
        payment_id = %payment.id,
        receipts = receipt_ids.len(),
        inventory_entries = inventory_entry_ids.len(),
        "Payment effects reversed"
    );

    Ok(ReversedEffects {
        receipt_ids,
        inventory_entry_ids,
    })
}
