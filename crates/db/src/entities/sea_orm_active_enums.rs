//! Enum columns shared by the entities.
//!
//! Stored as short strings so the same entities work on `PostgreSQL` and `SQLite`.

use quarry_core::invoice::ReceiptKind;
use quarry_core::payment::PaymentType as DomainPaymentType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    #[sea_orm(string_value = "SUPPLIER")]
    Supplier,
    #[sea_orm(string_value = "RECEIPT")]
    Receipt,
    #[sea_orm(string_value = "CUSTOMER_PAYMENT")]
    CustomerPayment,
    #[sea_orm(string_value = "PAYROLL_SALARY")]
    PayrollSalary,
    #[sea_orm(string_value = "PAYROLL_PIECEWORK")]
    PayrollPiecework,
    #[sea_orm(string_value = "DEBRIS_REMOVAL")]
    DebrisRemoval,
    #[sea_orm(string_value = "GENERAL_EXPENSE")]
    GeneralExpense,
    #[sea_orm(string_value = "OWNER_DRAW")]
    OwnerDraw,
    #[sea_orm(string_value = "PAYROLL_RUN")]
    PayrollRun,
}

impl From<DomainPaymentType> for PaymentType {
    fn from(value: DomainPaymentType) -> Self {
        match value {
            DomainPaymentType::Supplier => Self::Supplier,
            DomainPaymentType::Receipt => Self::Receipt,
            DomainPaymentType::CustomerPayment => Self::CustomerPayment,
            DomainPaymentType::PayrollSalary => Self::PayrollSalary,
            DomainPaymentType::PayrollPiecework => Self::PayrollPiecework,
            DomainPaymentType::DebrisRemoval => Self::DebrisRemoval,
            DomainPaymentType::GeneralExpense => Self::GeneralExpense,
            DomainPaymentType::OwnerDraw => Self::OwnerDraw,
            DomainPaymentType::PayrollRun => Self::PayrollRun,
        }
    }
}

impl From<PaymentType> for DomainPaymentType {
    fn from(value: PaymentType) -> Self {
        match value {
            PaymentType::Supplier => Self::Supplier,
            PaymentType::Receipt => Self::Receipt,
            PaymentType::CustomerPayment => Self::CustomerPayment,
            PaymentType::PayrollSalary => Self::PayrollSalary,
            PaymentType::PayrollPiecework => Self::PayrollPiecework,
            PaymentType::DebrisRemoval => Self::DebrisRemoval,
            PaymentType::GeneralExpense => Self::GeneralExpense,
            PaymentType::OwnerDraw => Self::OwnerDraw,
            PaymentType::PayrollRun => Self::PayrollRun,
        }
    }
}

/// Receipt type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum ReceiptType {
    #[sea_orm(string_value = "NORMAL")]
    Normal,
    #[sea_orm(string_value = "TVA")]
    Tva,
}

impl From<ReceiptKind> for ReceiptType {
    fn from(value: ReceiptKind) -> Self {
        match value {
            ReceiptKind::Normal => Self::Normal,
            ReceiptKind::Tva => Self::Tva,
        }
    }
}

impl From<ReceiptType> for ReceiptKind {
    fn from(value: ReceiptType) -> Self {
        match value {
            ReceiptType::Normal => Self::Normal,
            ReceiptType::Tva => Self::Tva,
        }
    }
}

/// Inventory entry type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum InventoryEntryType {
    #[sea_orm(string_value = "PURCHASE")]
    Purchase,
    #[sea_orm(string_value = "PRODUCTION")]
    Production,
}

/// Debris entry status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum DebrisStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "REMOVED")]
    Removed,
}
