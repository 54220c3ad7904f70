//! Invoice error types.

use quarry_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during invoice operations.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// No receipts were given.
    #[error("An invoice needs at least one receipt")]
    NoReceipts,

    /// A receipt has no customer.
    #[error("Receipt {0} is a walk-in sale and cannot be invoiced")]
    WalkInReceipt(Uuid),

    /// Receipts belong to different customers.
    #[error("All receipts of an invoice must belong to the same customer")]
    MixedCustomers,

    /// Receipts mix NORMAL and TVA.
    #[error("All receipts of an invoice must have the same receipt type")]
    MixedReceiptTypes,

    /// Receipt kind name not recognized.
    #[error("Unknown receipt type: {0}")]
    InvalidReceiptKind(String),

    /// Receipt already belongs to another invoice.
    #[error("Receipt {0} is already invoiced")]
    ReceiptAlreadyInvoiced(Uuid),

    /// Receipt does not exist.
    #[error("Receipt not found: {0}")]
    ReceiptNotFound(Uuid),

    /// Invoice does not exist.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(Uuid),

    /// Nothing left to pay.
    #[error("Invoice {0} is already paid")]
    InvoiceAlreadyPaid(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl InvoiceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoReceipts => "NO_RECEIPTS",
            Self::WalkInReceipt(_) => "WALK_IN_RECEIPT",
            Self::MixedCustomers => "MIXED_CUSTOMERS",
            Self::MixedReceiptTypes => "MIXED_RECEIPT_TYPES",
            Self::InvalidReceiptKind(_) => "INVALID_RECEIPT_TYPE",
            Self::ReceiptAlreadyInvoiced(_) => "RECEIPT_ALREADY_INVOICED",
            Self::ReceiptNotFound(_) => "RECEIPT_NOT_FOUND",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::InvoiceAlreadyPaid(_) => "INVOICE_ALREADY_PAID",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ReceiptNotFound(_) | Self::InvoiceNotFound(_) => 404,
            Self::Database(_) => 500,
            _ => 400,
        }
    }
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        Self::from_domain(err.http_status_code(), err.error_code(), err.to_string())
    }
}
