//! Integration tests for pairing, barter settlement and merges.

mod common;

use common::{assert_money, customer, purchase, raw, receipt, setup, supplier};
use quarry_core::payment::CustodyPolicy;
use quarry_db::entities::{
    customer_supplier_links, customers, inventory_entries, payments, receipts, settlement_offsets,
    suppliers,
};
use quarry_db::repositories::{PaymentRepository, ReconcileRepository, SettlementRepository};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

#[tokio::test]
async fn test_settlement_nets_pair_without_payment_row() {
    let db = setup().await;
    let repo = SettlementRepository::new(db.clone());
    let c = customer(&db, "Oued Sand").await;
    let s = supplier(&db, "Oued Sand").await;
    let r = receipt(&db, Some(c), "2024-02-01", dec!(200)).await;
    let p = purchase(&db, s, "2024-02-03", dec!(80)).await;

    repo.pair(c, s).await.unwrap();
    let summary = repo.settle_pairs().await.unwrap();

    assert_eq!(summary.pairs.len(), 1);
    assert_money(summary.total_offset, dec!(80));

    let r = receipts::Entity::find_by_id(r).one(&db).await.unwrap().unwrap();
    assert_money(r.total - r.amount_paid, dec!(120));
    assert!(!r.is_paid);

    let p = inventory_entries::Entity::find_by_id(p).one(&db).await.unwrap().unwrap();
    assert_money(p.total_cost - p.amount_paid, dec!(0));
    assert!(p.is_paid);

    assert_eq!(payments::Entity::find().count(&db).await.unwrap(), 0);
    let offsets = settlement_offsets::Entity::find()
        .filter(settlement_offsets::Column::BatchId.eq(summary.batch_id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(offsets, 2);
}

#[tokio::test]
async fn test_settlement_survives_reconcile_and_second_run_is_empty() {
    let db = setup().await;
    let repo = SettlementRepository::new(db.clone());
    let c = customer(&db, "Oued Sand").await;
    let s = supplier(&db, "Oued Sand").await;
    let r = receipt(&db, Some(c), "2024-02-01", dec!(50)).await;
    purchase(&db, s, "2024-02-03", dec!(90)).await;

    repo.pair(c, s).await.unwrap();
    repo.settle_pairs().await.unwrap();

    let report = ReconcileRepository::new(db.clone()).reconcile_all().await.unwrap();
    assert_eq!(report.receipts_corrected, 0);
    assert_eq!(report.inventory_corrected, 0);

    let r = receipts::Entity::find_by_id(r).one(&db).await.unwrap().unwrap();
    assert!(r.is_paid);

    let again = repo.settle_pairs().await.unwrap();
    assert!(again.pairs.is_empty());
}

#[tokio::test]
async fn test_pair_replaces_existing_pairing() {
    let db = setup().await;
    let repo = SettlementRepository::new(db.clone());
    let c = customer(&db, "Oued Sand").await;
    let s1 = supplier(&db, "Oued Sand SARL").await;
    let s2 = supplier(&db, "Oued Sand Trading").await;

    repo.pair(c, s1).await.unwrap();
    let link = repo.pair(c, s2).await.unwrap();

    let pairs = repo.list_pairs().await.unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].id, link.id);
    assert_eq!(pairs[0].supplier_id, s2);
}

#[tokio::test]
async fn test_pair_and_unpair_errors() {
    let db = setup().await;
    let repo = SettlementRepository::new(db.clone());
    let c = customer(&db, "Oued Sand").await;

    let err = repo.pair(c, Uuid::now_v7()).await.unwrap_err();
    assert_eq!(err.error_code(), "SUPPLIER_NOT_FOUND");

    let err = repo.unpair(Uuid::now_v7()).await.unwrap_err();
    assert_eq!(err.error_code(), "PAIR_NOT_FOUND");
    assert_eq!(err.http_status_code(), 404);
}

#[tokio::test]
async fn test_merge_customers_moves_records_and_pairing() {
    let db = setup().await;
    let repo = SettlementRepository::new(db.clone());
    let payments_repo = PaymentRepository::new(db.clone());
    let source = customer(&db, "Atlas Beton (dup)").await;
    let target = customer(&db, "Atlas Beton").await;
    let s = supplier(&db, "Atlas Beton").await;
    let r = receipt(&db, Some(source), "2024-01-01", dec!(100)).await;
    payments_repo
        .create_payment(
            &raw(serde_json::json!({
                "amount": 25,
                "type": "CUSTOMER_PAYMENT",
                "customerId": source.to_string(),
            })),
            &CustodyPolicy::unrestricted(),
            None,
        )
        .await
        .unwrap();
    repo.pair(source, s).await.unwrap();

    let summary = repo.merge_customers(source, target).await.unwrap();

    assert_eq!(summary.receipts_moved, 1);
    assert_eq!(summary.payments_moved, 1);
    assert!(summary.pair_moved);
    assert!(customers::Entity::find_by_id(source).one(&db).await.unwrap().is_none());

    let r = receipts::Entity::find_by_id(r).one(&db).await.unwrap().unwrap();
    assert_eq!(r.customer_id, Some(target));
    let link = customer_supplier_links::Entity::find()
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(link.customer_id, target);
}

#[tokio::test]
async fn test_merge_suppliers_drops_source_pairing_when_target_paired() {
    let db = setup().await;
    let repo = SettlementRepository::new(db.clone());
    let c1 = customer(&db, "Sahara Fuel A").await;
    let c2 = customer(&db, "Sahara Fuel B").await;
    let source = supplier(&db, "Sahara Fuel (dup)").await;
    let target = supplier(&db, "Sahara Fuel").await;
    let p = purchase(&db, source, "2024-01-01", dec!(40)).await;
    repo.pair(c1, source).await.unwrap();
    repo.pair(c2, target).await.unwrap();

    let summary = repo.merge_suppliers(source, target).await.unwrap();

    assert_eq!(summary.inventory_entries_moved, 1);
    assert!(summary.pair_dropped);
    assert!(suppliers::Entity::find_by_id(source).one(&db).await.unwrap().is_none());
    let p = inventory_entries::Entity::find_by_id(p).one(&db).await.unwrap().unwrap();
    assert_eq!(p.supplier_id, Some(target));
    assert_eq!(repo.list_pairs().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_self_merge_is_rejected() {
    let db = setup().await;
    let repo = SettlementRepository::new(db.clone());
    let c = customer(&db, "Atlas Beton").await;

    let err = repo.merge_customers(c, c).await.unwrap_err();
    assert_eq!(err.error_code(), "SELF_MERGE");
    assert_eq!(err.http_status_code(), 400);
    assert!(customers::Entity::find_by_id(c).one(&db).await.unwrap().is_some());
}
