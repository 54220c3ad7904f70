//! Recompute pass for derived paid fields.
//!
//! `amount_paid` / `is_paid` on receipts and inventory entries are never
//! incremented in place. After any mutation the touched rows are re-derived from
//! the rows that pay them:
//!
//! - receipts: receipt links + legacy untracked RECEIPT payments without a link +
//!   settlement offsets
//! - inventory entries: inventory links + settlement offsets
//!
//! A row is written only when the derived values differ, so running the pass twice
//! is the same as running it once.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::Utc;
use quarry_core::allocation::PaidState;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::{
    inventory_entries, inventory_payments, payments, receipt_payments, receipts,
    sea_orm_active_enums::PaymentType, settlement_offsets,
};

/// Rows per recompute batch in a full reconciliation.
const RECONCILE_BATCH: usize = 500;

/// Result of recomputing a set of rows.
#[derive(Debug, Clone)]
pub struct Recomputed<M> {
    /// Fresh models, in the order they were loaded.
    pub models: Vec<M>,
    /// How many rows had drifted and were rewritten.
    pub corrected: usize,
}

/// Summary of a full reconciliation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Receipts examined.
    pub receipts_checked: usize,
    /// Receipts rewritten.
    pub receipts_corrected: usize,
    /// Inventory entries examined.
    pub inventory_checked: usize,
    /// Inventory entries rewritten.
    pub inventory_corrected: usize,
}

/// Re-derives paid fields for the given receipts.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn recompute_receipts<C>(
    conn: &C,
    ids: &[Uuid],
) -> Result<Recomputed<receipts::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let ids = unique(ids);
    if ids.is_empty() {
        return Ok(Recomputed {
            models: Vec::new(),
            corrected: 0,
        });
    }

    let rows = receipts::Entity::find()
        .filter(receipts::Column::Id.is_in(ids.clone()))
        .order_by_asc(receipts::Column::Date)
        .order_by_asc(receipts::Column::Id)
        .all(conn)
        .await?;

    let links = receipt_payments::Entity::find()
        .filter(receipt_payments::Column::ReceiptId.is_in(ids.clone()))
        .all(conn)
        .await?;

    let legacy = payments::Entity::find()
        .filter(payments::Column::PaymentType.eq(PaymentType::Receipt))
        .filter(payments::Column::AllocationTracked.eq(false))
        .filter(payments::Column::ReceiptId.is_in(ids.clone()))
        .all(conn)
        .await?;

    let offsets = settlement_offsets::Entity::find()
        .filter(settlement_offsets::Column::ReceiptId.is_in(ids))
        .all(conn)
        .await?;

    let linked_pairs: HashSet<(Uuid, Uuid)> =
        links.iter().map(|l| (l.payment_id, l.receipt_id)).collect();

    let mut contributions: HashMap<Uuid, Vec<Decimal>> = HashMap::new();
    for link in &links {
        contributions
            .entry(link.receipt_id)
            .or_default()
            .push(link.amount);
    }
    for payment in &legacy {
        if let Some(receipt_id) = payment.receipt_id
            && !linked_pairs.contains(&(payment.id, receipt_id))
        {
            contributions
                .entry(receipt_id)
                .or_default()
                .push(payment.amount);
        }
    }
    for offset in &offsets {
        if let Some(receipt_id) = offset.receipt_id {
            contributions
                .entry(receipt_id)
                .or_default()
                .push(offset.amount);
        }
    }

    let mut models = Vec::with_capacity(rows.len());
    let mut corrected = 0;
    for row in rows {
        let state = PaidState::derive(
            row.total,
            contributions.remove(&row.id).unwrap_or_default(),
        );
        if state.differs_from(row.amount_paid, row.is_paid) {
            debug!(
                receipt_id = %row.id,
                stored = %row.amount_paid,
                derived = %state.amount_paid,
                "Receipt paid amount corrected"
            );
            let mut active: receipts::ActiveModel = row.into();
            active.amount_paid = Set(state.amount_paid);
            active.is_paid = Set(state.is_paid);
            active.updated_at = Set(Utc::now().fixed_offset());
            models.push(active.update(conn).await?);
            corrected += 1;
        } else {
            models.push(row);
        }
    }

    Ok(Recomputed { models, corrected })
}

/// Re-derives paid fields for the given inventory entries.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn recompute_inventory_entries<C>(
    conn: &C,
    ids: &[Uuid],
) -> Result<Recomputed<inventory_entries::Model>, DbErr>
where
    C: ConnectionTrait,
{
    let ids = unique(ids);
    if ids.is_empty() {
        return Ok(Recomputed {
            models: Vec::new(),
            corrected: 0,
        });
    }

    let rows = inventory_entries::Entity::find()
        .filter(inventory_entries::Column::Id.is_in(ids.clone()))
        .order_by_asc(inventory_entries::Column::Date)
        .order_by_asc(inventory_entries::Column::Id)
        .all(conn)
        .await?;

    let links = inventory_payments::Entity::find()
        .filter(inventory_payments::Column::InventoryEntryId.is_in(ids.clone()))
        .all(conn)
        .await?;

    let offsets = settlement_offsets::Entity::find()
        .filter(settlement_offsets::Column::InventoryEntryId.is_in(ids))
        .all(conn)
        .await?;

    let mut contributions: HashMap<Uuid, Vec<Decimal>> = HashMap::new();
    for link in &links {
        contributions
            .entry(link.inventory_entry_id)
            .or_default()
            .push(link.amount);
    }
    for offset in &offsets {
        if let Some(entry_id) = offset.inventory_entry_id {
            contributions.entry(entry_id).or_default().push(offset.amount);
        }
    }

    let mut models = Vec::with_capacity(rows.len());
    let mut corrected = 0;
    for row in rows {
        let state = PaidState::derive(
            row.total_cost,
            contributions.remove(&row.id).unwrap_or_default(),
        );
        if state.differs_from(row.amount_paid, row.is_paid) {
            debug!(
                inventory_entry_id = %row.id,
                stored = %row.amount_paid,
                derived = %state.amount_paid,
                "Inventory paid amount corrected"
            );
            let mut active: inventory_entries::ActiveModel = row.into();
            active.amount_paid = Set(state.amount_paid);
            active.is_paid = Set(state.is_paid);
            active.updated_at = Set(Utc::now().fixed_offset());
            models.push(active.update(conn).await?);
            corrected += 1;
        } else {
            models.push(row);
        }
    }

    Ok(Recomputed { models, corrected })
}

fn unique(ids: &[Uuid]) -> Vec<Uuid> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Repository running the full reconciliation.
#[derive(Debug, Clone)]
pub struct ReconcileRepository {
    db: DatabaseConnection,
}

impl ReconcileRepository {
    /// Creates a new reconcile repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Recomputes every receipt and inventory entry in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails; nothing is written in that case.
    pub async fn reconcile_all(&self) -> Result<ReconcileReport, DbErr> {
        let txn = self.db.begin().await?;
        let report = reconcile_all_in(&txn).await?;
        txn.commit().await?;

        info!(
            receipts_checked = report.receipts_checked,
            receipts_corrected = report.receipts_corrected,
            inventory_checked = report.inventory_checked,
            inventory_corrected = report.inventory_corrected,
            "Reconciliation finished"
        );
        Ok(report)
    }
}

/// Full reconciliation on an existing connection or transaction.
///
/// # Errors
///
/// Returns an error if a query fails.
pub async fn reconcile_all_in<C>(conn: &C) -> Result<ReconcileReport, DbErr>
where
    C: ConnectionTrait,
{
    let mut report = ReconcileReport::default();

    let receipt_ids: Vec<Uuid> = receipts::Entity::find()
        .select_only()
        .column(receipts::Column::Id)
        .into_tuple()
        .all(conn)
        .await?;
    for chunk in receipt_ids.chunks(RECONCILE_BATCH) {
        let done = recompute_receipts(conn, chunk).await?;
        report.receipts_checked += done.models.len();
        report.receipts_corrected += done.corrected;
    }

    let entry_ids: Vec<Uuid> = inventory_entries::Entity::find()
        .select_only()
        .column(inventory_entries::Column::Id)
        .into_tuple()
        .all(conn)
        .await?;
    for chunk in entry_ids.chunks(RECONCILE_BATCH) {
        let done = recompute_inventory_entries(conn, chunk).await?;
        report.inventory_checked += done.models.len();
        report.inventory_corrected += done.corrected;
    }

    Ok(report)
}
