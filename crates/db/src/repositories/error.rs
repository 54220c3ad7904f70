//! Repository error type.

use quarry_core::invoice::InvoiceError;
use quarry_core::payment::PaymentError;
use quarry_core::settlement::SettlementError;
use quarry_shared::AppError;
use sea_orm::DbErr;
use uuid::Uuid;

/// Errors returned by repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Payment rule violated.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Invoice rule violated.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// Settlement or merge rule violated.
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    /// Input rejected before touching the database.
    #[error("{message}")]
    Invalid {
        /// Stable error code.
        code: &'static str,
        /// Human readable message.
        message: String,
    },

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity name, lower case.
        entity: &'static str,
        /// Requested id.
        id: Uuid,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepoError {
    /// Builds an `Invalid` error.
    pub fn invalid(code: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            code,
            message: message.into(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Payment(e) => e.error_code(),
            Self::Invoice(e) => e.error_code(),
            Self::Settlement(e) => e.error_code(),
            Self::Invalid { code, .. } => *code,
            Self::NotFound { entity, .. } => match *entity {
                "customer" => "CUSTOMER_NOT_FOUND",
                "supplier" => "SUPPLIER_NOT_FOUND",
                "receipt" => "RECEIPT_NOT_FOUND",
                "inventory entry" => "INVENTORY_ENTRY_NOT_FOUND",
                "payroll entry" => "PAYROLL_NOT_FOUND",
                "debris entry" => "DEBRIS_NOT_FOUND",
                "payment" => "PAYMENT_NOT_FOUND",
                "invoice" => "INVOICE_NOT_FOUND",
                _ => "ENTITY_NOT_FOUND",
            },
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Payment(e) => e.http_status_code(),
            Self::Invoice(e) => e.http_status_code(),
            Self::Settlement(e) => e.http_status_code(),
            Self::Invalid { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Database(_) => 500,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        Self::from_domain(err.http_status_code(), err.error_code(), err.to_string())
    }
}
