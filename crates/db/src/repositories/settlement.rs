//! Customer/supplier pairing, barter settlement and duplicate merges.
//!
//! Settlement nets what a paired customer owes against what the business owes the
//! same party as a supplier. The netted amount is stored as `settlement_offsets`
//! rows, never as a payment, and the recompute pass counts those rows like links.

use chrono::Utc;
use quarry_core::allocation::{Allocation, OpenItem};
use quarry_core::settlement::{SettlementError, SettlementService};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::Expr,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::RepoError;
use super::reconcile::{recompute_inventory_entries, recompute_receipts};
use crate::entities::{
    customer_supplier_links, customers, inventory_entries, invoices, payments, receipts,
    sea_orm_active_enums::InventoryEntryType, settlement_offsets, suppliers,
};

/// Outcome of settling one pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairSettlement {
    /// Pairing that was settled.
    pub link_id: Uuid,
    /// Customer side.
    pub customer_id: Uuid,
    /// Supplier side.
    pub supplier_id: Uuid,
    /// Amount netted on each side.
    pub offset: Decimal,
    /// Receipts touched.
    pub receipts_settled: usize,
    /// Purchases touched.
    pub purchases_settled: usize,
}

/// Outcome of a settle-pairs run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementSummary {
    /// Shared by every offset row written in this run.
    pub batch_id: Uuid,
    /// Pairs with a non-zero offset.
    pub pairs: Vec<PairSettlement>,
    /// Sum of the offsets.
    pub total_offset: Decimal,
}

/// Rows moved by a merge.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    /// Record that was kept.
    pub target_id: Uuid,
    /// Record that was deleted.
    pub source_id: Uuid,
    /// Receipts reassigned (customer merge).
    pub receipts_moved: u64,
    /// Inventory entries reassigned (supplier merge).
    pub inventory_entries_moved: u64,
    /// Payments reassigned.
    pub payments_moved: u64,
    /// Invoices reassigned (customer merge).
    pub invoices_moved: u64,
    /// True when the source's pairing now belongs to the target.
    pub pair_moved: bool,
    /// True when the source's pairing was dropped because the target had one.
    pub pair_dropped: bool,
}

/// Settlement repository.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Pairs a customer with a supplier. Any existing pairing of either side is
    /// removed first.
    ///
    /// # Errors
    ///
    /// Returns `CUSTOMER_NOT_FOUND`, `SUPPLIER_NOT_FOUND` or a database error.
    pub async fn pair(
        &self,
        customer_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<customer_supplier_links::Model, RepoError> {
        let txn = self.db.begin().await?;

        customers::Entity::find_by_id(customer_id)
            .one(&txn)
            .await?
            .ok_or(SettlementError::CustomerNotFound(customer_id))?;
        suppliers::Entity::find_by_id(supplier_id)
            .one(&txn)
            .await?
            .ok_or(SettlementError::SupplierNotFound(supplier_id))?;

        let removed = customer_supplier_links::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(customer_supplier_links::Column::CustomerId.eq(customer_id))
                    .add(customer_supplier_links::Column::SupplierId.eq(supplier_id)),
            )
            .exec(&txn)
            .await?;

        let link = customer_supplier_links::ActiveModel {
            id: Set(Uuid::now_v7()),
            customer_id: Set(customer_id),
            supplier_id: Set(supplier_id),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            link_id = %link.id,
            customer_id = %customer_id,
            supplier_id = %supplier_id,
            replaced = removed.rows_affected,
            "Customer paired with supplier"
        );
        Ok(link)
    }

    /// Removes a pairing. Offsets already written stay.
    ///
    /// # Errors
    ///
    /// Returns `PAIR_NOT_FOUND` or a database error.
    pub async fn unpair(&self, link_id: Uuid) -> Result<customer_supplier_links::Model, RepoError> {
        let link = customer_supplier_links::Entity::find_by_id(link_id)
            .one(&self.db)
            .await?
            .ok_or(SettlementError::PairNotFound(link_id))?;
        customer_supplier_links::Entity::delete_by_id(link_id)
            .exec(&self.db)
            .await?;

        info!(link_id = %link_id, "Pairing removed");
        Ok(link)
    }

    /// Lists all pairings, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_pairs(&self) -> Result<Vec<customer_supplier_links::Model>, RepoError> {
        Ok(customer_supplier_links::Entity::find()
            .order_by_asc(customer_supplier_links::Column::CreatedAt)
            .order_by_asc(customer_supplier_links::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Settles every pair in one transaction.
    ///
    /// # Errors
    ///
    /// Returns a database error; no offset is written in that case.
    pub async fn settle_pairs(&self) -> Result<SettlementSummary, RepoError> {
        let txn = self.db.begin().await?;
        let batch_id = Uuid::now_v7();

        let links = customer_supplier_links::Entity::find()
            .order_by_asc(customer_supplier_links::Column::CreatedAt)
            .order_by_asc(customer_supplier_links::Column::Id)
            .all(&txn)
            .await?;

        let mut pairs = Vec::new();
        for link in &links {
            if let Some(settled) = settle_pair(&txn, batch_id, link).await? {
                pairs.push(settled);
            }
        }

        txn.commit().await?;

        let total_offset = pairs.iter().map(|p| p.offset).sum();
        info!(
            batch_id = %batch_id,
            pairs = links.len(),
            settled = pairs.len(),
            total_offset = %total_offset,
            "Settlement run finished"
        );
        Ok(SettlementSummary {
            batch_id,
            pairs,
            total_offset,
        })
    }

    /// Moves everything owned by `source` to `target` and deletes `source`.
    ///
    /// # Errors
    ///
    /// Returns `SELF_MERGE`, `CUSTOMER_NOT_FOUND` or a database error.
    pub async fn merge_customers(
        &self,
        source: Uuid,
        target: Uuid,
    ) -> Result<MergeSummary, RepoError> {
        SettlementService::ensure_distinct(source, target)?;
        let txn = self.db.begin().await?;

        for id in [source, target] {
            customers::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or(SettlementError::CustomerNotFound(id))?;
        }

        let mut summary = MergeSummary {
            target_id: target,
            source_id: source,
            ..MergeSummary::default()
        };

        summary.receipts_moved = receipts::Entity::update_many()
            .col_expr(receipts::Column::CustomerId, Expr::value(target))
            .filter(receipts::Column::CustomerId.eq(source))
            .exec(&txn)
            .await?
            .rows_affected;
        summary.payments_moved = payments::Entity::update_many()
            .col_expr(payments::Column::CustomerId, Expr::value(target))
            .filter(payments::Column::CustomerId.eq(source))
            .exec(&txn)
            .await?
            .rows_affected;
        summary.invoices_moved = invoices::Entity::update_many()
            .col_expr(invoices::Column::CustomerId, Expr::value(target))
            .filter(invoices::Column::CustomerId.eq(source))
            .exec(&txn)
            .await?
            .rows_affected;

        let source_link = customer_supplier_links::Entity::find()
            .filter(customer_supplier_links::Column::CustomerId.eq(source))
            .one(&txn)
            .await?;
        let target_link = customer_supplier_links::Entity::find()
            .filter(customer_supplier_links::Column::CustomerId.eq(target))
            .one(&txn)
            .await?;
        if let Some(link) = source_link {
            if target_link.is_none() {
                let mut active: customer_supplier_links::ActiveModel = link.into();
                active.customer_id = Set(target);
                active.update(&txn).await?;
                summary.pair_moved = true;
            } else {
                customer_supplier_links::Entity::delete_by_id(link.id)
                    .exec(&txn)
                    .await?;
                summary.pair_dropped = true;
            }
        }

        customers::Entity::delete_by_id(source).exec(&txn).await?;
        txn.commit().await?;

        info!(
            source_id = %source,
            target_id = %target,
            receipts = summary.receipts_moved,
            payments = summary.payments_moved,
            invoices = summary.invoices_moved,
            "Customers merged"
        );
        Ok(summary)
    }

    /// Moves everything owned by `source` to `target` and deletes `source`.
    ///
    /// # Errors
    ///
    /// Returns `SELF_MERGE`, `SUPPLIER_NOT_FOUND` or a database error.
    pub async fn merge_suppliers(
        &self,
        source: Uuid,
        target: Uuid,
    ) -> Result<MergeSummary, RepoError> {
        SettlementService::ensure_distinct(source, target)?;
        let txn = self.db.begin().await?;

        for id in [source, target] {
            suppliers::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or(SettlementError::SupplierNotFound(id))?;
        }

        let mut summary = MergeSummary {
            target_id: target,
            source_id: source,
            ..MergeSummary::default()
        };

        summary.inventory_entries_moved = inventory_entries::Entity::update_many()
            .col_expr(inventory_entries::Column::SupplierId, Expr::value(target))
            .filter(inventory_entries::Column::SupplierId.eq(source))
            .exec(&txn)
            .await?
            .rows_affected;
        summary.payments_moved = payments::Entity::update_many()
            .col_expr(payments::Column::SupplierId, Expr::value(target))
            .filter(payments::Column::SupplierId.eq(source))
            .exec(&txn)
            .await?
            .rows_affected;

        let source_link = customer_supplier_links::Entity::find()
            .filter(customer_supplier_links::Column::SupplierId.eq(source))
            .one(&txn)
            .await?;
        let target_link = customer_supplier_links::Entity::find()
            .filter(customer_supplier_links::Column::SupplierId.eq(target))
            .one(&txn)
            .await?;
        if let Some(link) = source_link {
            if target_link.is_none() {
                let mut active: customer_supplier_links::ActiveModel = link.into();
                active.supplier_id = Set(target);
                active.update(&txn).await?;
                summary.pair_moved = true;
            } else {
                customer_supplier_links::Entity::delete_by_id(link.id)
                    .exec(&txn)
                    .await?;
                summary.pair_dropped = true;
            }
        }

        suppliers::Entity::delete_by_id(source).exec(&txn).await?;
        txn.commit().await?;

        info!(
            source_id = %source,
            target_id = %target,
            inventory_entries = summary.inventory_entries_moved,
            payments = summary.payments_moved,
            "Suppliers merged"
        );
        Ok(summary)
    }
}

async fn settle_pair(
    txn: &DatabaseTransaction,
    batch_id: Uuid,
    link: &customer_supplier_links::Model,
) -> Result<Option<PairSettlement>, RepoError> {
    let receipt_ids: Vec<Uuid> = receipts::Entity::find()
        .filter(receipts::Column::CustomerId.eq(link.customer_id))
        .all(txn)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();
    let purchase_ids: Vec<Uuid> = inventory_entries::Entity::find()
        .filter(inventory_entries::Column::SupplierId.eq(link.supplier_id))
        .filter(inventory_entries::Column::EntryType.eq(InventoryEntryType::Purchase))
        .all(txn)
        .await?
        .into_iter()
        .map(|e| e.id)
        .collect();

    let receipts = recompute_receipts(txn, &receipt_ids).await?.models;
    let purchases = recompute_inventory_entries(txn, &purchase_ids).await?.models;

    let plan = SettlementService::plan(
        receipts
            .iter()
            .map(|r| OpenItem {
                id: r.id,
                date: r.date,
                total: r.total,
                paid: r.amount_paid,
            })
            .collect(),
        purchases
            .iter()
            .map(|e| OpenItem {
                id: e.id,
                date: e.date,
                total: e.total_cost,
                paid: e.amount_paid,
            })
            .collect(),
    );
    if plan.is_empty() {
        debug!(link_id = %link.id, "Nothing to settle");
        return Ok(None);
    }

    let now = Utc::now().fixed_offset();
    for allocation in &plan.receipt_allocations {
        insert_offset(txn, batch_id, link.id, allocation, true, now).await?;
    }
    for allocation in &plan.purchase_allocations {
        insert_offset(txn, batch_id, link.id, allocation, false, now).await?;
    }

    let touched_receipts: Vec<Uuid> = plan.receipt_allocations.iter().map(|a| a.entity_id).collect();
    let touched_purchases: Vec<Uuid> =
        plan.purchase_allocations.iter().map(|a| a.entity_id).collect();
    recompute_receipts(txn, &touched_receipts).await?;
    recompute_inventory_entries(txn, &touched_purchases).await?;

    debug!(link_id = %link.id, offset = %plan.offset, "Pair settled");
    Ok(Some(PairSettlement {
        link_id: link.id,
        customer_id: link.customer_id,
        supplier_id: link.supplier_id,
        offset: plan.offset,
        receipts_settled: touched_receipts.len(),
        purchases_settled: touched_purchases.len(),
    }))
}

async fn insert_offset<C>(
    conn: &C,
    batch_id: Uuid,
    link_id: Uuid,
    allocation: &Allocation,
    receipt_side: bool,
    created_at: chrono::DateTime<chrono::FixedOffset>,
) -> Result<settlement_offsets::Model, RepoError>
where
    C: ConnectionTrait,
{
    let (receipt_id, inventory_entry_id) = if receipt_side {
        (Some(allocation.entity_id), None)
    } else {
        (None, Some(allocation.entity_id))
    };
    Ok(settlement_offsets::ActiveModel {
        id: Set(Uuid::now_v7()),
        batch_id: Set(batch_id),
        link_id: Set(link_id),
        receipt_id: Set(receipt_id),
        inventory_entry_id: Set(inventory_entry_id),
        amount: Set(allocation.applied),
        created_at: Set(created_at),
    }
    .insert(conn)
    .await?)
}
