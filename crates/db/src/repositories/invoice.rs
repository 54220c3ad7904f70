//! Invoice repository.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Utc};
use quarry_core::allocation::{OpenItem, PaidState, outstanding};
use quarry_core::invoice::{InvoiceCandidate, InvoiceError, InvoiceService};
use quarry_core::payment::{PaymentDraft, PaymentSanitizer, PaymentTarget, PaymentType};
use quarry_shared::types::{CustomerId, PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use super::error::RepoError;
use super::payment::{SanitizedPayment, insert_payment};
use super::payment_apply::apply_payment_effects;
use super::reconcile::recompute_receipts;
use crate::entities::{invoice_receipts, invoices, payments, receipt_payments, receipts};

/// An invoice with its receipts.
#[derive(Debug, Clone)]
pub struct InvoiceDetails {
    /// The invoice row.
    pub invoice: invoices::Model,
    /// Receipts on the invoice, oldest first.
    pub receipts: Vec<receipts::Model>,
}

/// Result of paying an invoice.
#[derive(Debug, Clone)]
pub struct InvoicePayment {
    /// Invoice after the snapshot refresh.
    pub invoice: InvoiceDetails,
    /// The customer payment created for it.
    pub payment: payments::Model,
    /// Links created by the payment.
    pub receipt_links: Vec<receipt_payments::Model>,
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Groups receipts into a new invoice.
    ///
    /// # Errors
    ///
    /// Returns an `InvoiceError` when the receipts cannot be grouped, or a
    /// database error.
    pub async fn create_invoice(
        &self,
        receipt_ids: &[Uuid],
        date: Option<DateTime<FixedOffset>>,
        vat_rate: Decimal,
    ) -> Result<InvoiceDetails, RepoError> {
        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = receipt_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        if ids.is_empty() {
            return Err(InvoiceError::NoReceipts.into());
        }

        let txn = self.db.begin().await?;

        let rows = recompute_receipts(&txn, &ids).await?.models;
        if let Some(missing) = ids.iter().find(|id| !rows.iter().any(|r| r.id == **id)) {
            return Err(InvoiceError::ReceiptNotFound(*missing).into());
        }

        let invoiced: HashSet<Uuid> = invoice_receipts::Entity::find()
            .filter(invoice_receipts::Column::ReceiptId.is_in(ids.clone()))
            .all(&txn)
            .await?
            .into_iter()
            .map(|link| link.receipt_id)
            .collect();

        let candidates: Vec<InvoiceCandidate> = rows
            .iter()
            .map(|r| candidate(r, invoiced.contains(&r.id)))
            .collect();
        let (customer_id, kind) = InvoiceService::validate_candidates(&candidates)?;
        let totals = InvoiceService::compute_totals(kind, &candidates, vat_rate);
        let invoice_number = next_invoice_number(&txn).await?;

        let now = Utc::now().fixed_offset();
        let invoice = invoices::ActiveModel {
            id: Set(Uuid::now_v7()),
            invoice_number: Set(invoice_number),
            customer_id: Set(customer_id),
            receipt_type: Set(kind.into()),
            date: Set(date.unwrap_or(now)),
            subtotal: Set(totals.subtotal),
            vat_amount: Set(totals.vat_amount),
            total: Set(totals.total),
            amount_paid: Set(totals.amount_paid),
            outstanding: Set(totals.outstanding),
            is_paid: Set(totals.is_paid),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for receipt in &rows {
            invoice_receipts::ActiveModel {
                id: Set(Uuid::now_v7()),
                invoice_id: Set(invoice.id),
                receipt_id: Set(receipt.id),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            receipts = rows.len(),
            total = %invoice.total,
            "Invoice created"
        );
        Ok(InvoiceDetails {
            invoice,
            receipts: rows,
        })
    }

    /// Loads an invoice with its receipts.
    ///
    /// # Errors
    ///
    /// Returns `INVOICE_NOT_FOUND` or a database error.
    pub async fn get_invoice(&self, id: Uuid) -> Result<InvoiceDetails, RepoError> {
        let invoice = invoices::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound(id))?;
        let receipts = invoice_receipt_rows(&self.db, id).await?;
        Ok(InvoiceDetails { invoice, receipts })
    }

    /// Lists invoices, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_invoices(
        &self,
        customer_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<PageResponse<invoices::Model>, RepoError> {
        let mut query = invoices::Entity::find();
        if let Some(customer_id) = customer_id {
            query = query.filter(invoices::Column::CustomerId.eq(customer_id));
        }

        let total = query.clone().count(&self.db).await?;
        let data = query
            .order_by_desc(invoices::Column::Date)
            .order_by_desc(invoices::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Pays everything still owed on an invoice's receipts with one customer
    /// payment, then refreshes the invoice snapshot.
    ///
    /// # Errors
    ///
    /// Returns `INVOICE_NOT_FOUND`, `INVOICE_ALREADY_PAID` or a database error.
    pub async fn mark_paid(
        &self,
        id: Uuid,
        created_by: Option<Uuid>,
    ) -> Result<InvoicePayment, RepoError> {
        let txn = self.db.begin().await?;

        let invoice = invoices::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound(id))?;

        let receipt_ids = invoice_receipt_ids(&txn, id).await?;
        let rows = recompute_receipts(&txn, &receipt_ids).await?.models;
        let amount = InvoiceService::payable_amount(
            id,
            rows.iter().map(|r| outstanding(r.total, r.amount_paid)),
        )?;

        let customer_id = CustomerId::from_uuid(invoice.customer_id);
        let draft = PaymentDraft {
            amount,
            payment_type: PaymentType::CustomerPayment,
            date: Utc::now().fixed_offset(),
            description: Some(format!("Payment for invoice {}", invoice.invoice_number)),
            category: None,
            reference: Some(invoice.invoice_number.clone()),
            custodian: None,
            supplier_id: None,
            customer_id: Some(customer_id),
            receipt_id: None,
            payroll_entry_id: None,
            debris_entry_id: None,
            apply_to_receipts: true,
            apply_to_purchases: true,
            target: PaymentTarget::Customer {
                customer_id,
                apply_to_receipts: true,
            },
        };
        let open: Vec<OpenItem> = rows
            .iter()
            .map(|r| OpenItem {
                id: r.id,
                date: r.date,
                total: r.total,
                paid: r.amount_paid,
            })
            .collect();
        let sanitized = SanitizedPayment {
            receipt_plan: Some(PaymentSanitizer::plan_receipt_allocation(amount, open)),
            draft,
        };

        let payment = insert_payment(&txn, &sanitized.draft, created_by).await?;
        let effects = apply_payment_effects(&txn, &payment, &sanitized).await?;

        let fresh = recompute_receipts(&txn, &receipt_ids).await?.models;
        let paid = PaidState::derive(invoice.total, fresh.iter().map(|r| r.amount_paid));

        let mut active: invoices::ActiveModel = invoice.into();
        active.amount_paid = Set(paid.amount_paid);
        active.outstanding = Set(paid.outstanding);
        active.is_paid = Set(paid.is_paid);
        active.updated_at = Set(Utc::now().fixed_offset());
        let invoice = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            invoice_id = %id,
            payment_id = %payment.id,
            amount = %amount,
            "Invoice marked paid"
        );
        Ok(InvoicePayment {
            invoice: InvoiceDetails {
                invoice,
                receipts: fresh,
            },
            payment,
            receipt_links: effects.receipt_links,
        })
    }
}

fn candidate(receipt: &receipts::Model, already_invoiced: bool) -> InvoiceCandidate {
    InvoiceCandidate {
        receipt_id: receipt.id,
        customer_id: receipt.customer_id,
        kind: receipt.receipt_type.into(),
        total: receipt.total,
        amount_paid: receipt.amount_paid,
        already_invoiced,
    }
}

/// `INV-{n}` where `n` is one past the invoice count, skipping numbers already
/// taken.
async fn next_invoice_number<C>(conn: &C) -> Result<String, RepoError>
where
    C: ConnectionTrait,
{
    let mut sequence = invoices::Entity::find().count(conn).await? + 1;
    loop {
        let number = InvoiceService::invoice_number(sequence);
        let taken = invoices::Entity::find()
            .filter(invoices::Column::InvoiceNumber.eq(number.as_str()))
            .count(conn)
            .await?;
        if taken == 0 {
            return Ok(number);
        }
        sequence += 1;
    }
}

async fn invoice_receipt_ids<C>(conn: &C, invoice_id: Uuid) -> Result<Vec<Uuid>, RepoError>
where
    C: ConnectionTrait,
{
    Ok(invoice_receipts::Entity::find()
        .select_only()
        .column(invoice_receipts::Column::ReceiptId)
        .filter(invoice_receipts::Column::InvoiceId.eq(invoice_id))
        .into_tuple()
        .all(conn)
        .await?)
}

async fn invoice_receipt_rows<C>(
    conn: &C,
    invoice_id: Uuid,
) -> Result<Vec<receipts::Model>, RepoError>
where
    C: ConnectionTrait,
{
    let ids = invoice_receipt_ids(conn, invoice_id).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(receipts::Entity::find()
        .filter(receipts::Column::Id.is_in(ids))
        .order_by_asc(receipts::Column::Date)
        .order_by_asc(receipts::Column::Id)
        .all(conn)
        .await?)
}
