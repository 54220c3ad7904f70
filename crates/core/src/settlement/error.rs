//! Settlement and merge error types.

use quarry_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during pairing, settlement, or merges.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Source and target of a merge are the same record.
    #[error("Cannot merge a record into itself")]
    SelfMerge,

    /// Pairing does not exist.
    #[error("Pair not found: {0}")]
    PairNotFound(Uuid),

    /// Customer does not exist.
    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    /// Supplier does not exist.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl SettlementError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SelfMerge => "SELF_MERGE",
            Self::PairNotFound(_) => "PAIR_NOT_FOUND",
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::SupplierNotFound(_) => "SUPPLIER_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::SelfMerge => 400,
            Self::PairNotFound(_) | Self::CustomerNotFound(_) | Self::SupplierNotFound(_) => 404,
            Self::Database(_) => 500,
        }
    }
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        Self::from_domain(err.http_status_code(), err.error_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_status() {
        assert_eq!(SettlementError::SelfMerge.error_code(), "SELF_MERGE");
        assert_eq!(SettlementError::SelfMerge.http_status_code(), 400);
        assert_eq!(
            SettlementError::PairNotFound(Uuid::nil()).http_status_code(),
            404
        );
        assert_eq!(
            SettlementError::SupplierNotFound(Uuid::nil()).error_code(),
            "SUPPLIER_NOT_FOUND"
        );
    }
}
