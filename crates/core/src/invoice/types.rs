//! Invoice domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::InvoiceError;

/// Receipt kind. Plain receipts carry no VAT; TVA receipts include it in the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReceiptKind {
    /// No VAT.
    Normal,
    /// Total includes VAT.
    Tva,
}

impl ReceiptKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Tva => "TVA",
        }
    }
}

impl std::fmt::Display for ReceiptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReceiptKind {
    type Err = InvoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NORMAL" => Ok(Self::Normal),
            "TVA" => Ok(Self::Tva),
            _ => Err(InvoiceError::InvalidReceiptKind(s.to_string())),
        }
    }
}

/// A receipt proposed for an invoice, with its recomputed paid amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceCandidate {
    /// Receipt id.
    pub receipt_id: Uuid,
    /// Owning customer, `None` for walk-in sales.
    pub customer_id: Option<Uuid>,
    /// Receipt kind.
    pub kind: ReceiptKind,
    /// Receipt total.
    pub total: Decimal,
    /// Receipt paid amount.
    pub amount_paid: Decimal,
    /// True when the receipt already belongs to an invoice.
    pub already_invoiced: bool,
}

/// Invoice amount snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    /// Total before VAT.
    pub subtotal: Decimal,
    /// VAT part of the total.
    pub vat_amount: Decimal,
    /// Sum of receipt totals.
    pub total: Decimal,
    /// Sum of receipt paid amounts.
    pub amount_paid: Decimal,
    /// `max(total - amount_paid, 0)`.
    pub outstanding: Decimal,
    /// True when settled.
    pub is_paid: bool,
}
