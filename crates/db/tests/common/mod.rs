//! Shared setup for database integration tests.
//!
//! Each test gets its own in-memory `SQLite` database with the schema built from the
//! entities. The pool holds a single connection so the database lives as long as
//! the test.

#![allow(dead_code)]

use chrono::{DateTime, FixedOffset};
use quarry_core::payment::RawPaymentInput;
use quarry_db::entities::sea_orm_active_enums::{InventoryEntryType, ReceiptType};
use quarry_db::repositories::{
    CreateDebrisInput, CreateInventoryInput, CreatePartyInput, CreatePayrollInput,
    CreateReceiptInput, LedgerRepository,
};
use quarry_db::schema::create_tables;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

/// Fresh database with every table created.
pub async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open sqlite database");
    create_tables(&db).await.expect("Failed to create tables");
    db
}

/// `YYYY-MM-DD` at UTC midnight.
pub fn day(date: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(&format!("{date}T00:00:00Z")).expect("valid date")
}

/// Deserializes a request body the way the API does.
pub fn raw(body: serde_json::Value) -> RawPaymentInput {
    serde_json::from_value(body).expect("valid payment body")
}

/// Money equality within half a cent.
pub fn assert_money(actual: Decimal, expected: Decimal) {
    assert!(
        (actual - expected).abs() < dec!(0.005),
        "expected {expected}, got {actual}"
    );
}

pub async fn customer(db: &DatabaseConnection, name: &str) -> Uuid {
    LedgerRepository::new(db.clone())
        .create_customer(CreatePartyInput {
            name: name.to_string(),
            phone: None,
        })
        .await
        .expect("create customer")
        .id
}

pub async fn supplier(db: &DatabaseConnection, name: &str) -> Uuid {
    LedgerRepository::new(db.clone())
        .create_supplier(CreatePartyInput {
            name: name.to_string(),
            phone: None,
        })
        .await
        .expect("create supplier")
        .id
}

pub async fn receipt(
    db: &DatabaseConnection,
    customer_id: Option<Uuid>,
    date: &str,
    total: Decimal,
) -> Uuid {
    receipt_of_type(db, customer_id, ReceiptType::Normal, date, total).await
}

pub async fn receipt_of_type(
    db: &DatabaseConnection,
    customer_id: Option<Uuid>,
    receipt_type: ReceiptType,
    date: &str,
    total: Decimal,
) -> Uuid {
    LedgerRepository::new(db.clone())
        .create_receipt(CreateReceiptInput {
            customer_id,
            receipt_type,
            date: day(date),
            reference: None,
            total,
        })
        .await
        .expect("create receipt")
        .id
}

pub async fn purchase(db: &DatabaseConnection, supplier_id: Uuid, date: &str, total: Decimal) -> Uuid {
    LedgerRepository::new(db.clone())
        .create_inventory_entry(CreateInventoryInput {
            supplier_id: Some(supplier_id),
            entry_type: InventoryEntryType::Purchase,
            product: "Gravel 0/31.5".to_string(),
            date: day(date),
            quantity: Decimal::ONE,
            unit_cost: total,
            total_cost: None,
        })
        .await
        .expect("create purchase")
        .id
}

pub async fn payroll_entry(db: &DatabaseConnection, amount: Decimal) -> Uuid {
    LedgerRepository::new(db.clone())
        .create_payroll_entry(CreatePayrollInput {
            employee_id: Uuid::now_v7(),
            description: Some("Crusher operator".to_string()),
            period: "2024-06".to_string(),
            amount,
        })
        .await
        .expect("create payroll entry")
        .id
}

pub async fn debris_entry(db: &DatabaseConnection) -> Uuid {
    LedgerRepository::new(db.clone())
        .create_debris_entry(CreateDebrisInput {
            description: "Concrete rubble".to_string(),
            job_site: Some("North pit".to_string()),
        })
        .await
        .expect("create debris entry")
        .id
}
