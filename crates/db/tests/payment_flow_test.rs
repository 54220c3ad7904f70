//! Integration tests for the payment engine: sanitize, apply, reverse, recompute.

mod common;

use chrono::Utc;
use common::{
    assert_money, customer, day, debris_entry, payroll_entry, purchase, raw, receipt, setup,
    supplier,
};
use quarry_core::payment::CustodyPolicy;
use quarry_db::entities::{
    debris_entries, inventory_entries, payments, payroll_entries, receipt_payments, receipts,
    sea_orm_active_enums::{DebrisStatus, PaymentType},
};
use quarry_db::repositories::{PaymentFilter, PaymentRepository, ReconcileRepository};
use quarry_shared::types::PageRequest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use serde_json::json;
use uuid::Uuid;

fn open() -> CustodyPolicy {
    CustodyPolicy::unrestricted()
}

async fn receipt_row(db: &DatabaseConnection, id: Uuid) -> receipts::Model {
    receipts::Entity::find_by_id(id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
}

async fn linked_total(db: &DatabaseConnection, receipt_id: Uuid) -> Decimal {
    receipt_payments::Entity::find()
        .filter(receipt_payments::Column::ReceiptId.eq(receipt_id))
        .all(db)
        .await
        .unwrap()
        .iter()
        .map(|l| l.amount)
        .sum()
}

async fn payment_count(db: &DatabaseConnection) -> u64 {
    payments::Entity::find().count(db).await.unwrap()
}

// ============================================================================
// Customer payments
// ============================================================================

#[tokio::test]
async fn test_customer_payment_fills_oldest_receipt_first() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let c = customer(&db, "Atlas Beton").await;
    let first = receipt(&db, Some(c), "2024-01-01", dec!(100)).await;
    let second = receipt(&db, Some(c), "2024-01-05", dec!(50)).await;

    let details = repo
        .create_payment(
            &raw(json!({
                "amount": 120,
                "type": "CUSTOMER_PAYMENT",
                "customerId": c.to_string(),
            })),
            &open(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(details.receipt_links.len(), 2);
    assert_money(details.unapplied_amount, Decimal::ZERO);

    let first = receipt_row(&db, first).await;
    assert_money(first.amount_paid, dec!(100));
    assert!(first.is_paid);

    let second = receipt_row(&db, second).await;
    assert_money(second.amount_paid, dec!(20));
    assert_money(second.total - second.amount_paid, dec!(30));
    assert!(!second.is_paid);
}

#[tokio::test]
async fn test_customer_payment_ignores_drifted_paid_amount() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let c = customer(&db, "Atlas Beton").await;
    let older = receipt(&db, Some(c), "2024-01-01", dec!(100)).await;
    let newer = receipt(&db, Some(c), "2024-01-05", dec!(100)).await;

    let mut drifted: receipts::ActiveModel = receipt_row(&db, older).await.into();
    drifted.amount_paid = Set(dec!(100));
    drifted.is_paid = Set(true);
    drifted.update(&db).await.unwrap();

    repo.create_payment(
        &raw(json!({"amount": 100, "type": "CUSTOMER_PAYMENT", "customerId": c.to_string()})),
        &open(),
        None,
    )
    .await
    .unwrap();

    assert_money(linked_total(&db, older).await, dec!(100));
    assert_money(linked_total(&db, newer).await, Decimal::ZERO);
    assert!(receipt_row(&db, older).await.is_paid);
    assert_money(receipt_row(&db, newer).await.amount_paid, Decimal::ZERO);
}

#[tokio::test]
async fn test_customer_payment_keeps_remainder_as_credit() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let c = customer(&db, "Atlas Beton").await;
    receipt(&db, Some(c), "2024-01-01", dec!(40)).await;

    let details = repo
        .create_payment(
            &raw(json!({"amount": "100", "type": "CUSTOMER_PAYMENT", "customerId": c.to_string()})),
            &open(),
            None,
        )
        .await
        .unwrap();

    assert_money(details.unapplied_amount, dec!(60));
}

#[tokio::test]
async fn test_customer_payment_without_application_links_nothing() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let c = customer(&db, "Atlas Beton").await;
    let r = receipt(&db, Some(c), "2024-01-01", dec!(40)).await;

    let details = repo
        .create_payment(
            &raw(json!({
                "amount": 40,
                "type": "CUSTOMER_PAYMENT",
                "customerId": c.to_string(),
                "applyToReceipts": false,
            })),
            &open(),
            None,
        )
        .await
        .unwrap();

    assert!(details.receipt_links.is_empty());
    assert_money(receipt_row(&db, r).await.amount_paid, Decimal::ZERO);
}

// ============================================================================
// Receipt payments
// ============================================================================

#[tokio::test]
async fn test_receipt_payment_is_capped_and_infers_customer() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let c = customer(&db, "Atlas Beton").await;
    let r = receipt(&db, Some(c), "2024-01-01", dec!(100)).await;

    let details = repo
        .create_payment(
            &raw(json!({"amount": 150, "type": "RECEIPT", "receiptId": r.to_string()})),
            &open(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(details.payment.customer_id, Some(c));
    assert_eq!(details.receipt_links.len(), 1);
    assert_money(details.receipt_links[0].amount, dec!(100));
    assert_money(details.unapplied_amount, dec!(50));
    assert!(receipt_row(&db, r).await.is_paid);
}

#[tokio::test]
async fn test_receipt_payment_on_paid_receipt_creates_no_link() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let r = receipt(&db, None, "2024-01-01", dec!(30)).await;
    let body = raw(json!({"amount": 30, "type": "RECEIPT", "receiptId": r.to_string()}));

    repo.create_payment(&body, &open(), None).await.unwrap();
    let second = repo.create_payment(&body, &open(), None).await.unwrap();

    assert!(second.receipt_links.is_empty());
    assert_money(linked_total(&db, r).await, dec!(30));
}

#[tokio::test]
async fn test_edit_moves_receipt_payment_to_other_receipt() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let c = customer(&db, "Atlas Beton").await;
    let a = receipt(&db, Some(c), "2024-01-01", dec!(100)).await;
    let b = receipt(&db, Some(c), "2024-01-02", dec!(100)).await;

    let created = repo
        .create_payment(
            &raw(json!({"amount": 50, "type": "RECEIPT", "receiptId": a.to_string()})),
            &open(),
            None,
        )
        .await
        .unwrap();
    assert_money(receipt_row(&db, a).await.amount_paid, dec!(50));

    let updated = repo
        .update_payment(
            created.payment.id,
            &raw(json!({"amount": 50, "type": "RECEIPT", "receiptId": b.to_string()})),
            &open(),
        )
        .await
        .unwrap();

    assert_eq!(updated.payment.id, created.payment.id);
    assert_eq!(updated.receipt_links.len(), 1);
    assert_eq!(updated.receipt_links[0].receipt_id, b);
    assert_money(receipt_row(&db, a).await.amount_paid, Decimal::ZERO);
    assert_money(receipt_row(&db, b).await.amount_paid, dec!(50));
    assert_eq!(payment_count(&db).await, 1);
}

// ============================================================================
// Reversal
// ============================================================================

#[tokio::test]
async fn test_delete_restores_every_receipt() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let c = customer(&db, "Atlas Beton").await;
    let first = receipt(&db, Some(c), "2024-01-01", dec!(100)).await;
    let second = receipt(&db, Some(c), "2024-01-05", dec!(50)).await;

    let created = repo
        .create_payment(
            &raw(json!({"amount": 120, "type": "CUSTOMER_PAYMENT", "customerId": c.to_string()})),
            &open(),
            None,
        )
        .await
        .unwrap();
    repo.delete_payment(created.payment.id).await.unwrap();

    for id in [first, second] {
        let row = receipt_row(&db, id).await;
        assert_money(row.amount_paid, Decimal::ZERO);
        assert!(!row.is_paid);
    }
    assert_eq!(receipt_payments::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(payment_count(&db).await, 0);
}

#[tokio::test]
async fn test_delete_unknown_payment() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());

    let err = repo.delete_payment(Uuid::now_v7()).await.unwrap_err();
    assert_eq!(err.error_code(), "PAYMENT_NOT_FOUND");
    assert_eq!(err.http_status_code(), 404);
}

#[tokio::test]
async fn test_paid_equals_links_after_mixed_sequence() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let c = customer(&db, "Atlas Beton").await;
    let ids = [
        receipt(&db, Some(c), "2024-01-01", dec!(80)).await,
        receipt(&db, Some(c), "2024-01-02", dec!(60)).await,
        receipt(&db, Some(c), "2024-01-03", dec!(40)).await,
    ];

    let p1 = repo
        .create_payment(
            &raw(json!({"amount": 90, "type": "CUSTOMER_PAYMENT", "customerId": c.to_string()})),
            &open(),
            None,
        )
        .await
        .unwrap();
    let p2 = repo
        .create_payment(
            &raw(json!({"amount": 30, "type": "RECEIPT", "receiptId": ids[2].to_string()})),
            &open(),
            None,
        )
        .await
        .unwrap();
    repo.update_payment(
        p1.payment.id,
        &raw(json!({"amount": 70, "type": "CUSTOMER_PAYMENT", "customerId": c.to_string()})),
        &open(),
    )
    .await
    .unwrap();
    repo.delete_payment(p2.payment.id).await.unwrap();

    for id in ids {
        let row = receipt_row(&db, id).await;
        assert_money(row.amount_paid, linked_total(&db, id).await);
        assert!(row.amount_paid <= row.total);
    }
    assert_money(receipt_row(&db, ids[0]).await.amount_paid, dec!(70));
}

// ============================================================================
// Supplier payments
// ============================================================================

#[tokio::test]
async fn test_supplier_payment_fills_oldest_purchase_first() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let s = supplier(&db, "Sahara Fuel").await;
    let older = purchase(&db, s, "2024-01-01", dec!(60)).await;
    let newer = purchase(&db, s, "2024-01-03", dec!(40)).await;

    let details = repo
        .create_payment(
            &raw(json!({"amount": 80, "type": "SUPPLIER", "supplierId": s.to_string()})),
            &open(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(details.inventory_links.len(), 2);
    let older = inventory_entries::Entity::find_by_id(older).one(&db).await.unwrap().unwrap();
    let newer = inventory_entries::Entity::find_by_id(newer).one(&db).await.unwrap().unwrap();
    assert!(older.is_paid);
    assert_money(newer.amount_paid, dec!(20));

    repo.delete_payment(details.payment.id).await.unwrap();
    let newer = inventory_entries::Entity::find_by_id(newer.id).one(&db).await.unwrap().unwrap();
    assert_money(newer.amount_paid, Decimal::ZERO);
}

#[tokio::test]
async fn test_supplier_payment_ignores_drifted_paid_flag() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let s = supplier(&db, "Sahara Fuel").await;
    let older = purchase(&db, s, "2024-01-01", dec!(100)).await;
    let newer = purchase(&db, s, "2024-01-03", dec!(100)).await;

    let row = inventory_entries::Entity::find_by_id(older).one(&db).await.unwrap().unwrap();
    let mut drifted: inventory_entries::ActiveModel = row.into();
    drifted.amount_paid = Set(dec!(100));
    drifted.is_paid = Set(true);
    drifted.update(&db).await.unwrap();

    let details = repo
        .create_payment(
            &raw(json!({"amount": 100, "type": "SUPPLIER", "supplierId": s.to_string()})),
            &open(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(details.inventory_links.len(), 1);
    assert_eq!(details.inventory_links[0].inventory_entry_id, older);
    let newer = inventory_entries::Entity::find_by_id(newer).one(&db).await.unwrap().unwrap();
    assert!(!newer.is_paid);
    assert_money(newer.amount_paid, Decimal::ZERO);
}

// ============================================================================
// Payroll and debris
// ============================================================================

#[tokio::test]
async fn test_payroll_entry_cannot_be_paid_twice() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let entry = payroll_entry(&db, dec!(500)).await;
    let body = raw(json!({"amount": 500, "type": "PAYROLL_SALARY", "payrollEntryId": entry.to_string()}));

    let first = repo.create_payment(&body, &open(), None).await.unwrap();
    assert_eq!(
        first.payroll_entry.as_ref().and_then(|e| e.payment_id),
        Some(first.payment.id)
    );

    let err = repo.create_payment(&body, &open(), None).await.unwrap_err();
    assert_eq!(err.error_code(), "PAYROLL_ALREADY_PAID");
    assert_eq!(payment_count(&db).await, 1);

    let row = payroll_entries::Entity::find_by_id(entry).one(&db).await.unwrap().unwrap();
    assert_eq!(row.payment_id, Some(first.payment.id));

    // Editing the payment that holds the entry is allowed.
    let edited = repo
        .update_payment(
            first.payment.id,
            &raw(json!({"amount": 450, "type": "PAYROLL_SALARY", "payrollEntryId": entry.to_string()})),
            &open(),
        )
        .await
        .unwrap();
    assert_money(edited.payment.amount, dec!(450));
}

#[tokio::test]
async fn test_debris_payment_marks_removed_and_delete_resets() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let entry = debris_entry(&db).await;

    let details = repo
        .create_payment(
            &raw(json!({
                "amount": 75,
                "type": "DEBRIS_REMOVAL",
                "debrisEntryId": entry.to_string(),
                "date": "2024-03-10",
            })),
            &open(),
            None,
        )
        .await
        .unwrap();

    let removed = details.debris_entry.unwrap();
    assert_eq!(removed.status, DebrisStatus::Removed);
    assert_money(removed.removal_cost.unwrap(), dec!(75));
    assert_eq!(removed.removal_date, Some(day("2024-03-10")));
    assert_eq!(removed.removal_payment_id, Some(details.payment.id));

    repo.delete_payment(details.payment.id).await.unwrap();
    let pending = debris_entries::Entity::find_by_id(entry).one(&db).await.unwrap().unwrap();
    assert_eq!(pending.status, DebrisStatus::Pending);
    assert_eq!(pending.removal_cost, None);
    assert_eq!(pending.removal_payment_id, None);
}

// ============================================================================
// Validation and lookups
// ============================================================================

#[tokio::test]
async fn test_validation_errors_leave_no_rows() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());

    let cases = [
        (json!({"amount": 0, "type": "GENERAL_EXPENSE"}), "INVALID_AMOUNT"),
        (json!({"amount": 10, "type": "BRIBE"}), "INVALID_TYPE"),
        (json!({"amount": 10, "type": "RECEIPT"}), "RECEIPT_REQUIRED"),
        (
            json!({"amount": 10, "type": "RECEIPT", "receiptId": Uuid::now_v7().to_string()}),
            "RECEIPT_NOT_FOUND",
        ),
        (
            json!({"amount": 10, "type": "GENERAL_EXPENSE", "supplierId": Uuid::now_v7().to_string()}),
            "SUPPLIER_NOT_FOUND",
        ),
        (
            json!({"amount": 10, "type": "PAYROLL_PIECEWORK", "payrollEntryId": Uuid::now_v7().to_string()}),
            "PAYROLL_NOT_FOUND",
        ),
    ];

    for (body, code) in cases {
        let err = repo.create_payment(&raw(body), &open(), None).await.unwrap_err();
        assert_eq!(err.error_code(), code);
    }
    assert_eq!(payment_count(&db).await, 0);
}

#[tokio::test]
async fn test_custodian_must_be_configured() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let policy = CustodyPolicy::new(["Karim".to_string()]);

    let err = repo
        .create_payment(
            &raw(json!({"amount": 10, "type": "OWNER_DRAW", "custodian": "Mallory"})),
            &policy,
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CUSTODIAN");

    let ok = repo
        .create_payment(
            &raw(json!({"amount": 10, "type": "OWNER_DRAW", "custodian": " Karim "})),
            &policy,
            None,
        )
        .await
        .unwrap();
    assert_eq!(ok.payment.custodian.as_deref(), Some("Karim"));
}

#[tokio::test]
async fn test_list_payments_filters() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let entry = payroll_entry(&db, dec!(200)).await;
    let employee = payroll_entries::Entity::find_by_id(entry)
        .one(&db)
        .await
        .unwrap()
        .unwrap()
        .employee_id;

    repo.create_payment(
        &raw(json!({"amount": 200, "type": "PAYROLL_SALARY", "payrollEntryId": entry.to_string()})),
        &open(),
        None,
    )
    .await
    .unwrap();
    repo.create_payment(
        &raw(json!({"amount": 15, "type": "GENERAL_EXPENSE", "description": "Diesel for loader"})),
        &open(),
        None,
    )
    .await
    .unwrap();

    let page = PageRequest::default();

    let by_employee = repo
        .list_payments(
            &PaymentFilter {
                employee_id: Some(employee),
                ..PaymentFilter::default()
            },
            &page,
        )
        .await
        .unwrap();
    assert_eq!(by_employee.meta.total, 1);
    assert_eq!(by_employee.data[0].payment_type, PaymentType::PayrollSalary);

    let by_text = repo
        .list_payments(
            &PaymentFilter {
                description: Some("Diesel".to_string()),
                ..PaymentFilter::default()
            },
            &page,
        )
        .await
        .unwrap();
    assert_eq!(by_text.meta.total, 1);

    let all = repo.list_payments(&PaymentFilter::default(), &page).await.unwrap();
    assert_eq!(all.meta.total, 2);
}

// ============================================================================
// Recompute
// ============================================================================

#[tokio::test]
async fn test_reconcile_fixes_drift_and_is_idempotent() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let r = receipt(&db, None, "2024-01-01", dec!(100)).await;
    repo.create_payment(
        &raw(json!({"amount": 40, "type": "RECEIPT", "receiptId": r.to_string()})),
        &open(),
        None,
    )
    .await
    .unwrap();

    let mut drifted: receipts::ActiveModel = receipt_row(&db, r).await.into();
    drifted.amount_paid = Set(dec!(100));
    drifted.is_paid = Set(true);
    drifted.update(&db).await.unwrap();

    let reconcile = ReconcileRepository::new(db.clone());
    let first = reconcile.reconcile_all().await.unwrap();
    assert_eq!(first.receipts_checked, 1);
    assert_eq!(first.receipts_corrected, 1);
    assert_money(receipt_row(&db, r).await.amount_paid, dec!(40));

    let second = reconcile.reconcile_all().await.unwrap();
    assert_eq!(second.receipts_corrected, 0);
    assert_eq!(second.inventory_corrected, 0);
}

#[tokio::test]
async fn test_legacy_receipt_payment_counts_until_deleted() {
    let db = setup().await;
    let repo = PaymentRepository::new(db.clone());
    let r = receipt(&db, None, "2024-01-01", dec!(100)).await;

    let now = Utc::now().fixed_offset();
    let legacy = payments::ActiveModel {
        id: Set(Uuid::now_v7()),
        date: Set(day("2023-12-01")),
        amount: Set(dec!(30)),
        payment_type: Set(PaymentType::Receipt),
        supplier_id: Set(None),
        customer_id: Set(None),
        receipt_id: Set(Some(r)),
        description: Set(None),
        category: Set(None),
        reference: Set(None),
        custodian: Set(None),
        created_by: Set(None),
        allocation_tracked: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .unwrap();

    ReconcileRepository::new(db.clone()).reconcile_all().await.unwrap();
    assert_money(receipt_row(&db, r).await.amount_paid, dec!(30));

    repo.delete_payment(legacy.id).await.unwrap();
    assert_money(receipt_row(&db, r).await.amount_paid, Decimal::ZERO);
}
