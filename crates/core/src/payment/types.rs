//! Payment domain types.

use chrono::{DateTime, FixedOffset};
use quarry_shared::types::{
    CustomerId, DebrisEntryId, PayrollEntryId, ReceiptId, SupplierId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::PaymentError;

/// Kind of cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    /// Cash paid to a supplier against purchases.
    Supplier,
    /// Cash received against one receipt.
    Receipt,
    /// Cash received from a customer, spread over their open receipts.
    CustomerPayment,
    /// Salary for one payroll entry.
    PayrollSalary,
    /// Piecework pay for one payroll entry.
    PayrollPiecework,
    /// Cost of removing one debris pile.
    DebrisRemoval,
    /// Any other expense.
    GeneralExpense,
    /// Owner withdrawal.
    OwnerDraw,
    /// Bulk payroll disbursement not tied to an entry.
    PayrollRun,
}

impl PaymentType {
    /// Every payment type.
    pub const ALL: [Self; 9] = [
        Self::Supplier,
        Self::Receipt,
        Self::CustomerPayment,
        Self::PayrollSalary,
        Self::PayrollPiecework,
        Self::DebrisRemoval,
        Self::GeneralExpense,
        Self::OwnerDraw,
        Self::PayrollRun,
    ];

    /// Wire name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Supplier => "SUPPLIER",
            Self::Receipt => "RECEIPT",
            Self::CustomerPayment => "CUSTOMER_PAYMENT",
            Self::PayrollSalary => "PAYROLL_SALARY",
            Self::PayrollPiecework => "PAYROLL_PIECEWORK",
            Self::DebrisRemoval => "DEBRIS_REMOVAL",
            Self::GeneralExpense => "GENERAL_EXPENSE",
            Self::OwnerDraw => "OWNER_DRAW",
            Self::PayrollRun => "PAYROLL_RUN",
        }
    }

    /// True for the types that settle a single payroll entry.
    #[must_use]
    pub const fn settles_payroll_entry(self) -> bool {
        matches!(self, Self::PayrollSalary | Self::PayrollPiecework)
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentType {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PaymentError::InvalidType(s.to_string()))
    }
}

/// Payment request body as received, before any validation.
///
/// Amount and ids stay loosely typed so that malformed values produce the
/// payment error codes instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPaymentInput {
    /// Amount as a JSON number or numeric string.
    pub amount: Option<serde_json::Value>,
    /// Payment type name.
    #[serde(rename = "type")]
    pub payment_type: Option<String>,
    /// Payment date.
    pub date: Option<serde_json::Value>,
    /// Free text.
    pub description: Option<String>,
    /// Expense category.
    pub category: Option<String>,
    /// External reference (cheque number, transfer id).
    pub reference: Option<String>,
    /// Person holding the cash.
    pub custodian: Option<String>,
    /// Supplier id.
    pub supplier_id: Option<serde_json::Value>,
    /// Customer id.
    pub customer_id: Option<serde_json::Value>,
    /// Receipt id.
    pub receipt_id: Option<serde_json::Value>,
    /// Payroll entry id.
    pub payroll_entry_id: Option<serde_json::Value>,
    /// Debris entry id.
    pub debris_entry_id: Option<serde_json::Value>,
    /// Spread customer payments over open receipts. Defaults to true.
    pub apply_to_receipts: Option<bool>,
    /// Spread supplier payments over open purchases. Defaults to true.
    pub apply_to_purchases: Option<bool>,
}

/// What a validated payment is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTarget {
    /// Supplier purchases, oldest first.
    Supplier {
        /// Supplier paid.
        supplier_id: SupplierId,
        /// Whether to link purchases.
        apply_to_purchases: bool,
    },
    /// One receipt.
    Receipt {
        /// Receipt paid.
        receipt_id: ReceiptId,
    },
    /// A customer's receipts, oldest first.
    Customer {
        /// Paying customer.
        customer_id: CustomerId,
        /// Whether to link receipts.
        apply_to_receipts: bool,
    },
    /// One payroll entry.
    Payroll {
        /// Entry settled.
        entry_id: PayrollEntryId,
    },
    /// One debris entry.
    Debris {
        /// Entry settled.
        entry_id: DebrisEntryId,
    },
    /// No linkage side effects.
    Unlinked,
}

/// Validated and normalized payment fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDraft {
    /// Amount rounded to cents, strictly positive.
    pub amount: Decimal,
    /// Payment type.
    pub payment_type: PaymentType,
    /// Payment date.
    pub date: DateTime<FixedOffset>,
    /// Free text.
    pub description: Option<String>,
    /// Expense category.
    pub category: Option<String>,
    /// External reference.
    pub reference: Option<String>,
    /// Person holding the cash.
    pub custodian: Option<String>,
    /// Supplier id.
    pub supplier_id: Option<SupplierId>,
    /// Customer id. For receipt payments the database layer fills it from the receipt.
    pub customer_id: Option<CustomerId>,
    /// Receipt id.
    pub receipt_id: Option<ReceiptId>,
    /// Payroll entry id.
    pub payroll_entry_id: Option<PayrollEntryId>,
    /// Debris entry id.
    pub debris_entry_id: Option<DebrisEntryId>,
    /// Spread customer payments over open receipts.
    pub apply_to_receipts: bool,
    /// Spread supplier payments over open purchases.
    pub apply_to_purchases: bool,
    /// Resolved target.
    pub target: PaymentTarget,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_payment_type_roundtrip() {
        for t in PaymentType::ALL {
            assert_eq!(PaymentType::from_str(t.as_str()).unwrap(), t);
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn test_payment_type_is_case_sensitive() {
        assert!(matches!(
            PaymentType::from_str("receipt"),
            Err(PaymentError::InvalidType(_))
        ));
        assert!(PaymentType::from_str("").is_err());
    }

    #[test]
    fn test_settles_payroll_entry() {
        assert!(PaymentType::PayrollSalary.settles_payroll_entry());
        assert!(PaymentType::PayrollPiecework.settles_payroll_entry());
        assert!(!PaymentType::PayrollRun.settles_payroll_entry());
    }

    #[test]
    fn test_raw_input_camel_case() {
        let raw: RawPaymentInput = serde_json::from_str(
            r#"{"amount": "12.50", "type": "RECEIPT", "receiptId": "x", "applyToReceipts": false}"#,
        )
        .unwrap();
        assert_eq!(raw.payment_type.as_deref(), Some("RECEIPT"));
        assert_eq!(raw.apply_to_receipts, Some(false));
        assert!(raw.receipt_id.is_some());
        assert!(raw.supplier_id.is_none());
    }
}
