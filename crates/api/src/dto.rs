//! Response bodies.
//!
//! Bodies are camelCase. Money leaves the API as a string with two decimals so
//! clients never see a float. Field names mirror the entity columns.

#![allow(missing_docs)]

use chrono::{DateTime, FixedOffset};
use quarry_db::entities::{
    customer_supplier_links, customers, debris_entries, inventory_entries, inventory_payments,
    invoices, payments, payroll_entries, receipt_payments, receipts, suppliers,
    sea_orm_active_enums::{DebrisStatus, InventoryEntryType, PaymentType, ReceiptType},
};
use quarry_db::repositories::{CustomerBalance, InvoiceDetails, PaymentDetails};
use quarry_shared::types::{PageMeta, PageResponse, round_money};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Formats money as a two-decimal string.
#[must_use]
pub fn money(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}

fn outstanding(total: Decimal, paid: Decimal) -> String {
    money(quarry_core::allocation::outstanding(total, paid))
}

/// A page of items.
#[derive(Debug, Serialize)]
pub struct PageBody<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Paging metadata.
    pub meta: PageMeta,
}

impl<T, U> From<PageResponse<U>> for PageBody<T>
where
    T: From<U>,
{
    fn from(page: PageResponse<U>) -> Self {
        let page = page.map(T::from);
        Self {
            data: page.data,
            meta: page.meta,
        }
    }
}

/// Payment row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody {
    pub id: Uuid,
    pub date: DateTime<FixedOffset>,
    pub amount: String,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub supplier_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub receipt_id: Option<Uuid>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub reference: Option<String>,
    pub custodian: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<payments::Model> for PaymentBody {
    fn from(p: payments::Model) -> Self {
        Self {
            id: p.id,
            date: p.date,
            amount: money(p.amount),
            payment_type: p.payment_type,
            supplier_id: p.supplier_id,
            customer_id: p.customer_id,
            receipt_id: p.receipt_id,
            description: p.description,
            category: p.category,
            reference: p.reference,
            custodian: p.custodian,
            created_by: p.created_by,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Slice of a payment applied to a receipt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLinkBody {
    pub receipt_id: Uuid,
    pub amount: String,
}

impl From<receipt_payments::Model> for ReceiptLinkBody {
    fn from(link: receipt_payments::Model) -> Self {
        Self {
            receipt_id: link.receipt_id,
            amount: money(link.amount),
        }
    }
}

/// Slice of a payment applied to an inventory entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLinkBody {
    pub inventory_entry_id: Uuid,
    pub amount: String,
}

impl From<inventory_payments::Model> for InventoryLinkBody {
    fn from(link: inventory_payments::Model) -> Self {
        Self {
            inventory_entry_id: link.inventory_entry_id,
            amount: money(link.amount),
        }
    }
}

/// Payment with its effects.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsBody {
    #[serde(flatten)]
    pub payment: PaymentBody,
    pub unapplied_amount: String,
    pub receipt_links: Vec<ReceiptLinkBody>,
    pub inventory_links: Vec<InventoryLinkBody>,
    pub payroll_entry: Option<PayrollEntryBody>,
    pub debris_entry: Option<DebrisEntryBody>,
    pub receipts: Vec<ReceiptBody>,
    pub inventory_entries: Vec<InventoryEntryBody>,
}

impl From<PaymentDetails> for PaymentDetailsBody {
    fn from(d: PaymentDetails) -> Self {
        Self {
            payment: d.payment.into(),
            unapplied_amount: money(d.unapplied_amount),
            receipt_links: d.receipt_links.into_iter().map(Into::into).collect(),
            inventory_links: d.inventory_links.into_iter().map(Into::into).collect(),
            payroll_entry: d.payroll_entry.map(Into::into),
            debris_entry: d.debris_entry.map(Into::into),
            receipts: d.receipts.into_iter().map(Into::into).collect(),
            inventory_entries: d.inventory_entries.into_iter().map(Into::into).collect(),
        }
    }
}

/// Customer or supplier.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyBody {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl From<customers::Model> for PartyBody {
    fn from(c: customers::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            phone: c.phone,
            created_at: c.created_at,
        }
    }
}

impl From<suppliers::Model> for PartyBody {
    fn from(s: suppliers::Model) -> Self {
        Self {
            id: s.id,
            name: s.name,
            phone: s.phone,
            created_at: s.created_at,
        }
    }
}

/// Receipt with derived balance.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptBody {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub receipt_type: ReceiptType,
    pub date: DateTime<FixedOffset>,
    pub reference: Option<String>,
    pub total: String,
    pub amount_paid: String,
    pub outstanding: String,
    pub is_paid: bool,
}

impl From<receipts::Model> for ReceiptBody {
    fn from(r: receipts::Model) -> Self {
        Self {
            id: r.id,
            customer_id: r.customer_id,
            receipt_type: r.receipt_type,
            date: r.date,
            reference: r.reference,
            total: money(r.total),
            amount_paid: money(r.amount_paid),
            outstanding: outstanding(r.total, r.amount_paid),
            is_paid: r.is_paid,
        }
    }
}

/// Inventory entry with derived balance.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntryBody {
    pub id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub entry_type: InventoryEntryType,
    pub product: String,
    pub date: DateTime<FixedOffset>,
    pub quantity: String,
    pub unit_cost: String,
    pub total_cost: String,
    pub amount_paid: String,
    pub outstanding: String,
    pub is_paid: bool,
}

impl From<inventory_entries::Model> for InventoryEntryBody {
    fn from(e: inventory_entries::Model) -> Self {
        Self {
            id: e.id,
            supplier_id: e.supplier_id,
            entry_type: e.entry_type,
            product: e.product,
            date: e.date,
            quantity: e.quantity.normalize().to_string(),
            unit_cost: money(e.unit_cost),
            total_cost: money(e.total_cost),
            amount_paid: money(e.amount_paid),
            outstanding: outstanding(e.total_cost, e.amount_paid),
            is_paid: e.is_paid,
        }
    }
}

/// Payroll entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollEntryBody {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub description: Option<String>,
    pub period: String,
    pub amount: String,
    pub payment_id: Option<Uuid>,
    pub is_paid: bool,
}

impl From<payroll_entries::Model> for PayrollEntryBody {
    fn from(e: payroll_entries::Model) -> Self {
        Self {
            id: e.id,
            employee_id: e.employee_id,
            description: e.description,
            period: e.period,
            amount: money(e.amount),
            payment_id: e.payment_id,
            is_paid: e.payment_id.is_some(),
        }
    }
}

/// Debris entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebrisEntryBody {
    pub id: Uuid,
    pub description: String,
    pub job_site: Option<String>,
    pub status: DebrisStatus,
    pub removal_cost: Option<String>,
    pub removal_date: Option<DateTime<FixedOffset>>,
    pub removal_payment_id: Option<Uuid>,
}

impl From<debris_entries::Model> for DebrisEntryBody {
    fn from(e: debris_entries::Model) -> Self {
        Self {
            id: e.id,
            description: e.description,
            job_site: e.job_site,
            status: e.status,
            removal_cost: e.removal_cost.map(money),
            removal_date: e.removal_date,
            removal_payment_id: e.removal_payment_id,
        }
    }
}

/// Invoice row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceBody {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub receipt_type: ReceiptType,
    pub date: DateTime<FixedOffset>,
    pub subtotal: String,
    pub vat_amount: String,
    pub total: String,
    pub amount_paid: String,
    pub outstanding: String,
    pub is_paid: bool,
}

impl From<invoices::Model> for InvoiceBody {
    fn from(i: invoices::Model) -> Self {
        Self {
            id: i.id,
            invoice_number: i.invoice_number,
            customer_id: i.customer_id,
            receipt_type: i.receipt_type,
            date: i.date,
            subtotal: money(i.subtotal),
            vat_amount: money(i.vat_amount),
            total: money(i.total),
            amount_paid: money(i.amount_paid),
            outstanding: money(i.outstanding),
            is_paid: i.is_paid,
        }
    }
}

/// Invoice with its receipts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetailsBody {
    #[serde(flatten)]
    pub invoice: InvoiceBody,
    pub receipts: Vec<ReceiptBody>,
}

impl From<InvoiceDetails> for InvoiceDetailsBody {
    fn from(d: InvoiceDetails) -> Self {
        Self {
            invoice: d.invoice.into(),
            receipts: d.receipts.into_iter().map(Into::into).collect(),
        }
    }
}

/// Customer/supplier pairing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairBody {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub supplier_id: Uuid,
    pub created_at: DateTime<FixedOffset>,
}

impl From<customer_supplier_links::Model> for PairBody {
    fn from(l: customer_supplier_links::Model) -> Self {
        Self {
            id: l.id,
            customer_id: l.customer_id,
            supplier_id: l.supplier_id,
            created_at: l.created_at,
        }
    }
}

/// One customer's position.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBalanceBody {
    pub customer: PartyBody,
    pub receivable: String,
    pub unapplied_credit: String,
    pub net: String,
    pub open_receipts: Vec<ReceiptBody>,
}

impl From<CustomerBalance> for CustomerBalanceBody {
    fn from(b: CustomerBalance) -> Self {
        Self {
            receivable: money(b.receivable),
            unapplied_credit: money(b.unapplied_credit),
            net: money(b.net()),
            customer: b.customer.into(),
            open_receipts: b.open_receipts.into_iter().map(Into::into).collect(),
        }
    }
}
