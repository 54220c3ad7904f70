//! Balance reports.
//!
//! Reports run a recompute first so they never show drifted paid fields.

use std::collections::HashMap;

use quarry_core::allocation::outstanding;
use quarry_core::payment::unapplied_credit;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::error::RepoError;
use super::reconcile::{ReconcileReport, reconcile_all_in, recompute_receipts};
use crate::entities::{
    customers, inventory_entries, payments, receipt_payments, receipts,
    sea_orm_active_enums::{InventoryEntryType, PaymentType},
    settlement_offsets,
};

/// Company-wide open balances.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingSummary {
    /// Sum of receipt outstanding.
    pub receivables: Decimal,
    /// Sum of purchase outstanding.
    pub payables: Decimal,
    /// Customer payments not linked to any receipt.
    pub unapplied_customer_credit: Decimal,
    /// Amount netted by settlements, counted once per pair.
    pub settlement_offsets: Decimal,
    /// Receipts with something still owed.
    pub open_receipts: usize,
    /// Purchases with something still owed.
    pub open_purchases: usize,
    /// Drift corrected by the recompute that preceded the report.
    pub reconcile: ReconcileReport,
}

/// One customer's position.
#[derive(Debug, Clone)]
pub struct CustomerBalance {
    /// The customer.
    pub customer: customers::Model,
    /// Receipts with something still owed, oldest first.
    pub open_receipts: Vec<receipts::Model>,
    /// Sum of their outstanding.
    pub receivable: Decimal,
    /// Customer payments not linked to any receipt.
    pub unapplied_credit: Decimal,
}

impl CustomerBalance {
    /// Receivable minus credit. Negative when the customer is in credit.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.receivable - self.unapplied_credit
    }
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Reconciles, then sums open balances across the ledger.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn outstanding_summary(&self) -> Result<OutstandingSummary, RepoError> {
        let txn = self.db.begin().await?;
        let reconcile = reconcile_all_in(&txn).await?;

        let receipts = receipts::Entity::find().all(&txn).await?;
        let purchases = inventory_entries::Entity::find()
            .filter(inventory_entries::Column::EntryType.eq(InventoryEntryType::Purchase))
            .all(&txn)
            .await?;

        let receipt_owed: Vec<Decimal> = receipts
            .iter()
            .map(|r| outstanding(r.total, r.amount_paid))
            .filter(|owed| *owed > Decimal::ZERO)
            .collect();
        let purchase_owed: Vec<Decimal> = purchases
            .iter()
            .map(|e| outstanding(e.total_cost, e.amount_paid))
            .filter(|owed| *owed > Decimal::ZERO)
            .collect();

        let unapplied_customer_credit = customer_credit(&txn, None).await?;
        let settlement_offsets = settlement_offsets::Entity::find()
            .filter(settlement_offsets::Column::ReceiptId.is_not_null())
            .all(&txn)
            .await?
            .iter()
            .map(|o| o.amount)
            .sum();

        txn.commit().await?;

        let summary = OutstandingSummary {
            receivables: receipt_owed.iter().sum(),
            payables: purchase_owed.iter().sum(),
            unapplied_customer_credit,
            settlement_offsets,
            open_receipts: receipt_owed.len(),
            open_purchases: purchase_owed.len(),
            reconcile,
        };
        debug!(
            receivables = %summary.receivables,
            payables = %summary.payables,
            "Outstanding summary computed"
        );
        Ok(summary)
    }

    /// Open receipts and unapplied credit for one customer.
    ///
    /// # Errors
    ///
    /// Returns `CUSTOMER_NOT_FOUND` or a database error.
    pub async fn customer_balance(&self, customer_id: Uuid) -> Result<CustomerBalance, RepoError> {
        let txn = self.db.begin().await?;

        let customer = customers::Entity::find_by_id(customer_id)
            .one(&txn)
            .await?
            .ok_or(RepoError::NotFound {
                entity: "customer",
                id: customer_id,
            })?;

        let ids: Vec<Uuid> = receipts::Entity::find()
            .filter(receipts::Column::CustomerId.eq(customer_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        let open_receipts: Vec<receipts::Model> = recompute_receipts(&txn, &ids)
            .await?
            .models
            .into_iter()
            .filter(|r| outstanding(r.total, r.amount_paid) > Decimal::ZERO)
            .collect();
        let unapplied_credit = customer_credit(&txn, Some(customer_id)).await?;

        txn.commit().await?;

        let receivable = open_receipts
            .iter()
            .map(|r| outstanding(r.total, r.amount_paid))
            .sum();
        Ok(CustomerBalance {
            customer,
            open_receipts,
            receivable,
            unapplied_credit,
        })
    }
}

/// Sum of unapplied credit over customer payments, for one customer or all.
async fn customer_credit<C>(conn: &C, customer_id: Option<Uuid>) -> Result<Decimal, RepoError>
where
    C: ConnectionTrait,
{
    let mut query =
        payments::Entity::find().filter(payments::Column::PaymentType.eq(PaymentType::CustomerPayment));
    if let Some(customer_id) = customer_id {
        query = query.filter(payments::Column::CustomerId.eq(customer_id));
    }
    let payments = query.all(conn).await?;
    if payments.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let ids: Vec<Uuid> = payments.iter().map(|p| p.id).collect();
    let mut linked: HashMap<Uuid, Vec<Decimal>> = HashMap::new();
    for link in receipt_payments::Entity::find()
        .filter(receipt_payments::Column::PaymentId.is_in(ids))
        .all(conn)
        .await?
    {
        linked.entry(link.payment_id).or_default().push(link.amount);
    }

    Ok(payments
        .iter()
        .map(|p| unapplied_credit(p.amount, linked.remove(&p.id).unwrap_or_default()))
        .sum())
}
