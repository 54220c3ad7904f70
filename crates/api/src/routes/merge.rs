//! Pairing, settlement and duplicate-merge routes.
//!
//! Pair management is open to any authenticated user. Settling pairs and merging
//! records rewrite balances across many rows, so they are admin only.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{delete, get, post},
};
use quarry_db::{
    SettlementRepository,
    repositories::{MergeSummary, PairSettlement, SettlementSummary},
};
use quarry_shared::AuditEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::audit;
use crate::{
    AppState,
    dto::{PairBody, money},
    error::ApiResult,
    middleware::AuthUser,
};

/// Creates the merge routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/merge/pairs", get(list_pairs).post(create_pair))
        .route("/merge/pairs/{id}", delete(delete_pair))
        .route("/merge/settle-pairs", post(settle_pairs))
        .route("/merge/customers", post(merge_customers))
        .route("/merge/suppliers", post(merge_suppliers))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body for pairing a customer with a supplier.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairRequest {
    /// Customer side.
    pub customer_id: Uuid,
    /// Supplier side.
    pub supplier_id: Uuid,
}

/// Body for merging a duplicate into a kept record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    /// Record to fold in and delete.
    pub source_id: Uuid,
    /// Record to keep.
    pub target_id: Uuid,
}

/// One settled pair.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairSettlementBody {
    /// Pairing id.
    pub link_id: Uuid,
    /// Customer side.
    pub customer_id: Uuid,
    /// Supplier side.
    pub supplier_id: Uuid,
    /// Amount netted on each side.
    pub offset: String,
    /// Receipts touched.
    pub receipts_settled: usize,
    /// Purchases touched.
    pub purchases_settled: usize,
}

impl From<PairSettlement> for PairSettlementBody {
    fn from(p: PairSettlement) -> Self {
        Self {
            link_id: p.link_id,
            customer_id: p.customer_id,
            supplier_id: p.supplier_id,
            offset: money(p.offset),
            receipts_settled: p.receipts_settled,
            purchases_settled: p.purchases_settled,
        }
    }
}

/// Result of a settle-pairs run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementBody {
    /// Batch shared by the offsets written in this run.
    pub batch_id: Uuid,
    /// Pairs with a non-zero offset.
    pub pairs: Vec<PairSettlementBody>,
    /// Sum of the offsets.
    pub total_offset: String,
}

impl From<SettlementSummary> for SettlementBody {
    fn from(s: SettlementSummary) -> Self {
        Self {
            batch_id: s.batch_id,
            pairs: s.pairs.into_iter().map(Into::into).collect(),
            total_offset: money(s.total_offset),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/merge/pairs` - List customer/supplier pairings.
async fn list_pairs(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<Vec<PairBody>>> {
    let repo = SettlementRepository::new((*state.db).clone());
    let pairs = repo.list_pairs().await?;
    Ok(Json(pairs.into_iter().map(Into::into).collect()))
}

/// POST `/merge/pairs` - Pair a customer with a supplier.
async fn create_pair(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<PairRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PairBody>)> {
    let Json(body) = payload?;

    let repo = SettlementRepository::new((*state.db).clone());
    let link = repo.pair(body.customer_id, body.supplier_id).await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("PAIR", "customer_supplier_link", "Customer paired with supplier")
            .entity(link.id)
            .metadata(json!({
                "customerId": link.customer_id,
                "supplierId": link.supplier_id,
            })),
    );

    Ok((StatusCode::CREATED, Json(link.into())))
}

/// DELETE `/merge/pairs/{id}` - Remove a pairing.
async fn delete_pair(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = SettlementRepository::new((*state.db).clone());
    let link = repo.unpair(id).await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("UNPAIR", "customer_supplier_link", "Pairing removed")
            .entity(id)
            .metadata(json!({
                "customerId": link.customer_id,
                "supplierId": link.supplier_id,
            })),
    );

    Ok(StatusCode::NO_CONTENT)
}

/// POST `/merge/settle-pairs` - Net every pair's receivable against its payable.
async fn settle_pairs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<SettlementBody>> {
    auth.require_admin()?;

    let repo = SettlementRepository::new((*state.db).clone());
    let summary = repo.settle_pairs().await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("SETTLE", "customer_supplier_link", "Pairs settled")
            .entity(summary.batch_id)
            .metadata(json!({
                "pairs": summary.pairs.len(),
                "totalOffset": money(summary.total_offset),
            })),
    );

    Ok(Json(summary.into()))
}

/// POST `/merge/customers` - Fold a duplicate customer into another.
async fn merge_customers(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> ApiResult<Json<MergeSummary>> {
    auth.require_admin()?;
    let Json(body) = payload?;

    let repo = SettlementRepository::new((*state.db).clone());
    let summary = repo.merge_customers(body.source_id, body.target_id).await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("MERGE", "customer", "Customers merged")
            .entity(summary.target_id)
            .metadata(json!({ "sourceId": summary.source_id })),
    );

    Ok(Json(summary))
}

/// POST `/merge/suppliers` - Fold a duplicate supplier into another.
async fn merge_suppliers(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> ApiResult<Json<MergeSummary>> {
    auth.require_admin()?;
    let Json(body) = payload?;

    let repo = SettlementRepository::new((*state.db).clone());
    let summary = repo.merge_suppliers(body.source_id, body.target_id).await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("MERGE", "supplier", "Suppliers merged")
            .entity(summary.target_id)
            .metadata(json!({ "sourceId": summary.source_id })),
    );

    Ok(Json(summary))
}

#[cfg(test)]
mod integration_tests {
    use axum::http::Method;
    use serde_json::json;

    use crate::test_support::{admin_token, body_json, clerk_token, create_id, send, test_app};

    #[tokio::test]
    async fn test_settle_pairs_is_admin_only() {
        let (app, state) = test_app().await;
        let clerk = clerk_token(&state);

        let response = send(&app, Method::POST, "/api/v1/merge/settle-pairs", Some(&clerk), None).await;
        assert_eq!(response.status(), 403);
        assert_eq!(body_json(response).await["error"], "FORBIDDEN");

        let response = send(
            &app,
            Method::POST,
            "/api/v1/merge/customers",
            Some(&clerk),
            Some(json!({"sourceId": uuid::Uuid::now_v7(), "targetId": uuid::Uuid::now_v7()})),
        )
        .await;
        assert_eq!(response.status(), 403);
    }

    #[tokio::test]
    async fn test_pair_and_settle() {
        let (app, state) = test_app().await;
        let admin = admin_token(&state);

        let customer = create_id(&app, &admin, "/api/v1/customers", json!({"name": "Hamid"})).await;
        let supplier = create_id(&app, &admin, "/api/v1/suppliers", json!({"name": "Hamid"})).await;
        let receipt = create_id(
            &app,
            &admin,
            "/api/v1/receipts",
            json!({"customerId": customer, "date": "2024-05-01", "total": 200}),
        )
        .await;
        let purchase = create_id(
            &app,
            &admin,
            "/api/v1/inventory",
            json!({
                "supplierId": supplier,
                "product": "Sand",
                "date": "2024-05-02",
                "quantity": 1,
                "unitCost": 80,
            }),
        )
        .await;

        let response = send(
            &app,
            Method::POST,
            "/api/v1/merge/pairs",
            Some(&admin),
            Some(json!({"customerId": customer, "supplierId": supplier})),
        )
        .await;
        assert_eq!(response.status(), 201);

        let response = send(&app, Method::POST, "/api/v1/merge/settle-pairs", Some(&admin), None).await;
        assert_eq!(response.status(), 200);
        let body = body_json(response).await;
        assert_eq!(body["totalOffset"], "80.00");
        assert_eq!(body["pairs"][0]["offset"], "80.00");

        let response = send(
            &app,
            Method::GET,
            &format!("/api/v1/receipts/{receipt}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(body_json(response).await["outstanding"], "120.00");

        let response = send(
            &app,
            Method::GET,
            &format!("/api/v1/inventory/{purchase}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(body_json(response).await["isPaid"], true);

        let response = send(&app, Method::GET, "/api/v1/payments", Some(&admin), None).await;
        assert_eq!(body_json(response).await["meta"]["total"], 0);
    }

    #[tokio::test]
    async fn test_pair_errors_and_self_merge() {
        let (app, state) = test_app().await;
        let admin = admin_token(&state);
        let ghost = uuid::Uuid::now_v7();

        let response = send(
            &app,
            Method::DELETE,
            &format!("/api/v1/merge/pairs/{ghost}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(response.status(), 404);
        assert_eq!(body_json(response).await["error"], "PAIR_NOT_FOUND");

        let customer = create_id(&app, &admin, "/api/v1/customers", json!({"name": "Nadia"})).await;
        let response = send(
            &app,
            Method::POST,
            "/api/v1/merge/customers",
            Some(&admin),
            Some(json!({"sourceId": customer, "targetId": customer})),
        )
        .await;
        assert_eq!(response.status(), 400);
        assert_eq!(body_json(response).await["error"], "SELF_MERGE");
    }

    #[tokio::test]
    async fn test_merge_customers_moves_receipts() {
        let (app, state) = test_app().await;
        let admin = admin_token(&state);

        let keep = create_id(&app, &admin, "/api/v1/customers", json!({"name": "Sarl Atlas"})).await;
        let duplicate =
            create_id(&app, &admin, "/api/v1/customers", json!({"name": "SARL ATLAS"})).await;
        create_id(
            &app,
            &admin,
            "/api/v1/receipts",
            json!({"customerId": duplicate, "date": "2024-01-10", "total": 60}),
        )
        .await;

        let response = send(
            &app,
            Method::POST,
            "/api/v1/merge/customers",
            Some(&admin),
            Some(json!({"sourceId": duplicate, "targetId": keep})),
        )
        .await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(response).await["receiptsMoved"], 1);

        let response = send(
            &app,
            Method::GET,
            &format!("/api/v1/customers/{duplicate}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(response.status(), 404);

        let response = send(
            &app,
            Method::GET,
            &format!("/api/v1/receipts?customerId={keep}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(body_json(response).await["meta"]["total"], 1);
    }
}
