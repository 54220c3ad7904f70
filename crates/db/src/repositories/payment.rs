//! Payment repository.
//!
//! Every mutation runs in one transaction:
//! - create: sanitize, insert, apply
//! - update: load, sanitize (editing), reverse, update, apply
//! - delete: load, reverse, delete
//!
//! Any error drops the transaction, so a failed request leaves no partial links.

use std::collections::HashMap;

use chrono::Utc;
use quarry_core::allocation::{OpenItem, WaterfallResult};
use quarry_core::payment::{
    CustodyPolicy, PaymentDraft, PaymentError, PaymentSanitizer, PaymentTarget, RawPaymentInput,
    unapplied_credit,
};
use quarry_shared::types::{CustomerId, PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use super::error::RepoError;
use super::payment_apply::apply_payment_effects;
use super::payment_reverse::{load_links, reverse_payment_effects};
use super::reconcile::recompute_receipts;
use crate::entities::{
    customers, debris_entries, inventory_entries, inventory_payments, payments, payroll_entries,
    receipt_payments, receipts, sea_orm_active_enums::PaymentType, suppliers,
};

/// A validated payment plus the receipt plan for customer payments.
#[derive(Debug, Clone)]
pub struct SanitizedPayment {
    /// Normalized fields.
    pub draft: PaymentDraft,
    /// Oldest-first plan over the customer's receipts, when one applies.
    pub receipt_plan: Option<WaterfallResult>,
}

/// Validates a raw payment and resolves every reference it makes.
///
/// `editing` is the stored payment being replaced, if any. Its own links are
/// treated as already reversed when planning and checking conflicts. The only
/// writes are recompute corrections to the customer's receipts.
///
/// # Errors
///
/// Returns the first validation, lookup or conflict error.
pub async fn sanitize_payment<C>(
    conn: &C,
    raw: &RawPaymentInput,
    custody: &CustodyPolicy,
    editing: Option<&payments::Model>,
) -> Result<SanitizedPayment, RepoError>
where
    C: ConnectionTrait,
{
    let mut draft = PaymentSanitizer::sanitize(raw, custody)?;
    let editing_id = editing.map(|p| p.id);

    if let Some(supplier_id) = draft.supplier_id {
        let id = supplier_id.into_inner();
        suppliers::Entity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or(PaymentError::SupplierNotFound(id))?;
    }

    if let Some(customer_id) = draft.customer_id {
        let id = customer_id.into_inner();
        customers::Entity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or(PaymentError::CustomerNotFound(id))?;
    }

    if let Some(receipt_id) = draft.receipt_id {
        let id = receipt_id.into_inner();
        let receipt = receipts::Entity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or(PaymentError::ReceiptNotFound(id))?;
        if draft.customer_id.is_none() {
            draft.customer_id = receipt.customer_id.map(CustomerId::from_uuid);
        }
    }

    match draft.target {
        PaymentTarget::Payroll { entry_id } => {
            let id = entry_id.into_inner();
            let entry = payroll_entries::Entity::find_by_id(id)
                .one(conn)
                .await?
                .ok_or(PaymentError::PayrollNotFound(id))?;
            PaymentSanitizer::ensure_payroll_available(id, entry.payment_id, editing_id)?;
        }
        PaymentTarget::Debris { entry_id } => {
            let id = entry_id.into_inner();
            let entry = debris_entries::Entity::find_by_id(id)
                .one(conn)
                .await?
                .ok_or(PaymentError::DebrisNotFound(id))?;
            PaymentSanitizer::ensure_debris_available(id, entry.removal_payment_id, editing_id)?;
        }
        _ => {}
    }

    let receipt_plan = match draft.target {
        PaymentTarget::Customer {
            customer_id,
            apply_to_receipts: true,
        } => {
            let own = own_receipt_contributions(conn, editing).await?;
            let ids: Vec<Uuid> = receipts::Entity::find()
                .filter(receipts::Column::CustomerId.eq(customer_id.into_inner()))
                .select_only()
                .column(receipts::Column::Id)
                .into_tuple()
                .all(conn)
                .await?;
            let open: Vec<OpenItem> = recompute_receipts(conn, &ids)
                .await?
                .models
                .into_iter()
                .map(|r| OpenItem {
                    id: r.id,
                    date: r.date,
                    total: r.total,
                    paid: r.amount_paid - own.get(&r.id).copied().unwrap_or_default(),
                })
                .collect();
            Some(PaymentSanitizer::plan_receipt_allocation(draft.amount, open))
        }
        _ => None,
    };

    Ok(SanitizedPayment {
        draft,
        receipt_plan,
    })
}

/// What the edited payment currently contributes to each receipt.
async fn own_receipt_contributions<C>(
    conn: &C,
    editing: Option<&payments::Model>,
) -> Result<HashMap<Uuid, Decimal>, RepoError>
where
    C: ConnectionTrait,
{
    let mut own: HashMap<Uuid, Decimal> = HashMap::new();
    let Some(payment) = editing else {
        return Ok(own);
    };

    let links = receipt_payments::Entity::find()
        .filter(receipt_payments::Column::PaymentId.eq(payment.id))
        .all(conn)
        .await?;
    for link in &links {
        *own.entry(link.receipt_id).or_default() += link.amount;
    }

    if !payment.allocation_tracked
        && payment.payment_type == PaymentType::Receipt
        && let Some(receipt_id) = payment.receipt_id
        && !own.contains_key(&receipt_id)
    {
        own.insert(receipt_id, payment.amount);
    }

    Ok(own)
}

/// Filter for listing payments. All fields are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    /// Payment type.
    pub payment_type: Option<PaymentType>,
    /// Supplier reference.
    pub supplier_id: Option<Uuid>,
    /// Customer reference.
    pub customer_id: Option<Uuid>,
    /// Direct receipt reference.
    pub receipt_id: Option<Uuid>,
    /// Employee whose payroll entries the payment settles.
    pub employee_id: Option<Uuid>,
    /// Substring of the description.
    pub description: Option<String>,
}

/// A payment with everything it owns and the rows it pays.
#[derive(Debug, Clone)]
pub struct PaymentDetails {
    /// The payment row.
    pub payment: payments::Model,
    /// Receipt links.
    pub receipt_links: Vec<receipt_payments::Model>,
    /// Inventory links.
    pub inventory_links: Vec<inventory_payments::Model>,
    /// Payroll entry settled by the payment.
    pub payroll_entry: Option<payroll_entries::Model>,
    /// Debris entry settled by the payment.
    pub debris_entry: Option<debris_entries::Model>,
    /// Current state of the linked receipts.
    pub receipts: Vec<receipts::Model>,
    /// Current state of the linked inventory entries.
    pub inventory_entries: Vec<inventory_entries::Model>,
    /// Part of the amount not linked to any receipt or inventory entry.
    pub unapplied_amount: Decimal,
}

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a payment and applies its effects.
    ///
    /// # Errors
    ///
    /// Returns a validation, lookup, conflict or database error. Nothing is
    /// persisted on error.
    pub async fn create_payment(
        &self,
        raw: &RawPaymentInput,
        custody: &CustodyPolicy,
        created_by: Option<Uuid>,
    ) -> Result<PaymentDetails, RepoError> {
        let txn = self.db.begin().await?;

        let sanitized = sanitize_payment(&txn, raw, custody, None).await?;
        let payment = insert_payment(&txn, &sanitized.draft, created_by).await?;

        apply_payment_effects(&txn, &payment, &sanitized).await?;
        let details = load_details(&txn, payment).await?;
        txn.commit().await?;

        info!(
            payment_id = %details.payment.id,
            payment_type = %sanitized.draft.payment_type,
            amount = %details.payment.amount,
            "Payment created"
        );
        Ok(details)
    }

    /// Replaces a payment: reverses its effects, updates the row and applies the
    /// new effects.
    ///
    /// # Errors
    ///
    /// Returns `PAYMENT_NOT_FOUND` or any error `create_payment` can return.
    pub async fn update_payment(
        &self,
        id: Uuid,
        raw: &RawPaymentInput,
        custody: &CustodyPolicy,
    ) -> Result<PaymentDetails, RepoError> {
        let txn = self.db.begin().await?;

        let existing = payments::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(PaymentError::PaymentNotFound(id))?;

        let sanitized = sanitize_payment(&txn, raw, custody, Some(&existing)).await?;
        let reversed = reverse_payment_effects(&txn, &existing).await?;

        let mut active = draft_to_active(&sanitized.draft);
        active.id = sea_orm::ActiveValue::Unchanged(existing.id);
        active.updated_at = Set(Utc::now().fixed_offset());
        let payment = active.update(&txn).await?;

        apply_payment_effects(&txn, &payment, &sanitized).await?;
        let details = load_details(&txn, payment).await?;
        txn.commit().await?;

        info!(
            payment_id = %id,
            payment_type = %sanitized.draft.payment_type,
            amount = %details.payment.amount,
            receipts_released = reversed.receipt_ids.len(),
            inventory_released = reversed.inventory_entry_ids.len(),
            "Payment updated"
        );
        Ok(details)
    }

    /// Reverses a payment's effects and deletes it. Returns the deleted row.
    ///
    /// # Errors
    ///
    /// Returns `PAYMENT_NOT_FOUND` or a database error.
    pub async fn delete_payment(&self, id: Uuid) -> Result<payments::Model, RepoError> {
        let txn = self.db.begin().await?;

        let existing = payments::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(PaymentError::PaymentNotFound(id))?;

        let reversed = reverse_payment_effects(&txn, &existing).await?;
        payments::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(
            payment_id = %id,
            receipts_released = reversed.receipt_ids.len(),
            inventory_released = reversed.inventory_entry_ids.len(),
            "Payment deleted"
        );
        Ok(existing)
    }

    /// Loads a payment with its links and the rows it pays.
    ///
    /// # Errors
    ///
    /// Returns `PAYMENT_NOT_FOUND` or a database error.
    pub async fn get_payment(&self, id: Uuid) -> Result<PaymentDetails, RepoError> {
        let payment = payments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(PaymentError::PaymentNotFound(id))?;
        load_details(&self.db, payment).await
    }

    /// Lists payments, newest first.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_payments(
        &self,
        filter: &PaymentFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<payments::Model>, RepoError> {
        let mut query = payments::Entity::find();

        if let Some(payment_type) = filter.payment_type {
            query = query.filter(payments::Column::PaymentType.eq(payment_type));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(payments::Column::SupplierId.eq(supplier_id));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(payments::Column::CustomerId.eq(customer_id));
        }
        if let Some(receipt_id) = filter.receipt_id {
            query = query.filter(payments::Column::ReceiptId.eq(receipt_id));
        }
        if let Some(employee_id) = filter.employee_id {
            let paid_by: Vec<Option<Uuid>> = payroll_entries::Entity::find()
                .select_only()
                .column(payroll_entries::Column::PaymentId)
                .filter(payroll_entries::Column::EmployeeId.eq(employee_id))
                .filter(payroll_entries::Column::PaymentId.is_not_null())
                .into_tuple()
                .all(&self.db)
                .await?;
            let ids: Vec<Uuid> = paid_by.into_iter().flatten().collect();
            query = query.filter(payments::Column::Id.is_in(ids));
        }
        if let Some(text) = filter.description.as_deref().map(str::trim)
            && !text.is_empty()
        {
            query = query.filter(payments::Column::Description.contains(text));
        }

        let paginator = query
            .order_by_desc(payments::Column::Date)
            .order_by_desc(payments::Column::Id)
            .paginate(&self.db, u64::from(page.per_page()));

        let total = paginator.num_items().await?;
        let data = paginator.fetch_page(u64::from(page.page().saturating_sub(1))).await?;

        Ok(PageResponse::new(data, page, total))
    }
}

/// Inserts a new payment row from a draft. Effects are not applied.
pub(crate) async fn insert_payment(
    txn: &DatabaseTransaction,
    draft: &PaymentDraft,
    created_by: Option<Uuid>,
) -> Result<payments::Model, RepoError> {
    let now = Utc::now().fixed_offset();
    let mut active = draft_to_active(draft);
    active.id = Set(Uuid::now_v7());
    active.created_by = Set(created_by);
    active.created_at = Set(now);
    active.updated_at = Set(now);
    Ok(active.insert(txn).await?)
}

/// Row fields taken from a draft. Identity and audit columns are left unset.
fn draft_to_active(draft: &PaymentDraft) -> payments::ActiveModel {
    payments::ActiveModel {
        date: Set(draft.date),
        amount: Set(draft.amount),
        payment_type: Set(draft.payment_type.into()),
        supplier_id: Set(draft.supplier_id.map(|id| id.into_inner())),
        customer_id: Set(draft.customer_id.map(|id| id.into_inner())),
        receipt_id: Set(draft.receipt_id.map(|id| id.into_inner())),
        description: Set(draft.description.clone()),
        category: Set(draft.category.clone()),
        reference: Set(draft.reference.clone()),
        custodian: Set(draft.custodian.clone()),
        allocation_tracked: Set(true),
        ..Default::default()
    }
}

async fn load_details<C>(conn: &C, payment: payments::Model) -> Result<PaymentDetails, RepoError>
where
    C: ConnectionTrait,
{
    let links = load_links(conn, payment.id).await?;

    let receipt_ids = links.receipt_ids();
    let receipts = if receipt_ids.is_empty() {
        Vec::new()
    } else {
        receipts::Entity::find()
            .filter(receipts::Column::Id.is_in(receipt_ids))
            .order_by_asc(receipts::Column::Date)
            .order_by_asc(receipts::Column::Id)
            .all(conn)
            .await?
    };

    let entry_ids = links.inventory_entry_ids();
    let inventory_entries = if entry_ids.is_empty() {
        Vec::new()
    } else {
        inventory_entries::Entity::find()
            .filter(inventory_entries::Column::Id.is_in(entry_ids))
            .order_by_asc(inventory_entries::Column::Date)
            .order_by_asc(inventory_entries::Column::Id)
            .all(conn)
            .await?
    };

    let linked = links
        .receipt_links
        .iter()
        .map(|l| l.amount)
        .chain(links.inventory_links.iter().map(|l| l.amount));
    let unapplied_amount = unapplied_credit(payment.amount, linked);

    Ok(PaymentDetails {
        payment,
        receipt_links: links.receipt_links,
        inventory_links: links.inventory_links,
        payroll_entry: links.payroll_entry,
        debris_entry: links.debris_entry,
        receipts,
        inventory_entries,
        unapplied_amount,
    })
}
