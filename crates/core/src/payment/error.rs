//! Payment error types.

use quarry_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while validating or applying a payment.
#[derive(Debug, Error)]
pub enum PaymentError {
    // ========== Malformed Input ==========
    /// Amount missing, not numeric, or not positive.
    #[error("Amount must be a number greater than zero")]
    InvalidAmount,

    /// Unknown payment type.
    #[error("Unknown payment type: {0}")]
    InvalidType(String),

    /// Date could not be parsed.
    #[error("Invalid payment date: {0}")]
    InvalidDate(String),

    /// Supplier id is not a UUID.
    #[error("Invalid supplier id")]
    InvalidSupplier,

    /// Customer id is not a UUID.
    #[error("Invalid customer id")]
    InvalidCustomer,

    /// Receipt id is not a UUID.
    #[error("Invalid receipt id")]
    InvalidReceipt,

    /// Payroll entry id is not a UUID.
    #[error("Invalid payroll entry id")]
    InvalidPayroll,

    /// Debris entry id is not a UUID.
    #[error("Invalid debris entry id")]
    InvalidDebris,

    /// Custodian is not an allowed custody holder.
    #[error("Custodian {0} is not allowed to hold cash")]
    InvalidCustodian(String),

    // ========== Missing References ==========
    /// SUPPLIER payment without supplier.
    #[error("Supplier payments require a supplier")]
    SupplierRequired,

    /// RECEIPT payment without receipt.
    #[error("Receipt payments require a receipt")]
    ReceiptRequired,

    /// Payroll payment without payroll entry.
    #[error("Payroll payments require a payroll entry")]
    PayrollRequired,

    /// DEBRIS_REMOVAL payment without debris entry.
    #[error("Debris removal payments require a debris entry")]
    DebrisRequired,

    /// CUSTOMER_PAYMENT without customer.
    #[error("Customer payments require a customer")]
    CustomerRequired,

    // ========== Not Found ==========
    /// Supplier does not exist.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(Uuid),

    /// Customer does not exist.
    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    /// Receipt does not exist.
    #[error("Receipt not found: {0}")]
    ReceiptNotFound(Uuid),

    /// Payroll entry does not exist.
    #[error("Payroll entry not found: {0}")]
    PayrollNotFound(Uuid),

    /// Debris entry does not exist.
    #[error("Debris entry not found: {0}")]
    DebrisNotFound(Uuid),

    /// Payment does not exist.
    #[error("Payment not found: {0}")]
    PaymentNotFound(Uuid),

    // ========== Conflicts ==========
    /// Payroll entry already settled by another payment.
    #[error("Payroll entry {0} is already paid by another payment")]
    PayrollAlreadyPaid(Uuid),

    /// Debris entry already settled by another payment.
    #[error("Debris entry {0} is already paid by another payment")]
    DebrisAlreadyPaid(Uuid),

    // ========== Server Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InvalidType(_) => "INVALID_TYPE",
            Self::InvalidDate(_) => "INVALID_DATE",
            Self::InvalidSupplier => "INVALID_SUPPLIER",
            Self::InvalidCustomer => "INVALID_CUSTOMER",
            Self::InvalidReceipt => "INVALID_RECEIPT",
            Self::InvalidPayroll => "INVALID_PAYROLL",
            Self::InvalidDebris => "INVALID_DEBRIS",
            Self::InvalidCustodian(_) => "INVALID_CUSTODIAN",
            Self::SupplierRequired => "SUPPLIER_REQUIRED",
            Self::ReceiptRequired => "RECEIPT_REQUIRED",
            Self::PayrollRequired => "PAYROLL_REQUIRED",
            Self::DebrisRequired => "DEBRIS_REQUIRED",
            Self::CustomerRequired => "CUSTOMER_REQUIRED",
            Self::SupplierNotFound(_) => "SUPPLIER_NOT_FOUND",
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::ReceiptNotFound(_) => "RECEIPT_NOT_FOUND",
            Self::PayrollNotFound(_) => "PAYROLL_NOT_FOUND",
            Self::DebrisNotFound(_) => "DEBRIS_NOT_FOUND",
            Self::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::PayrollAlreadyPaid(_) => "PAYROLL_ALREADY_PAID",
            Self::DebrisAlreadyPaid(_) => "DEBRIS_ALREADY_PAID",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 404 Not Found
            Self::SupplierNotFound(_)
            | Self::CustomerNotFound(_)
            | Self::ReceiptNotFound(_)
            | Self::PayrollNotFound(_)
            | Self::DebrisNotFound(_)
            | Self::PaymentNotFound(_) => 404,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,

            // 400 Bad Request - validation and conflict errors
            _ => 400,
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        Self::from_domain(err.http_status_code(), err.error_code(), err.to_string())
    }
}
