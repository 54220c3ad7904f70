//! Balance reports and the reconcile trigger.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use quarry_db::{
    ReconcileRepository, ReportRepository,
    repositories::{OutstandingSummary, ReconcileReport},
};
use quarry_shared::AuditEvent;
use serde::Serialize;
use uuid::Uuid;

use super::audit;
use crate::{
    AppState,
    dto::{CustomerBalanceBody, money},
    error::ApiResult,
    middleware::AuthUser,
};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/outstanding", get(outstanding))
        .route("/customers/{id}/balance", get(customer_balance))
        .route("/reconcile", post(reconcile))
}

/// Company-wide open balances.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingBody {
    /// Owed by customers.
    pub receivables: String,
    /// Owed to suppliers.
    pub payables: String,
    /// Customer cash not yet applied to receipts.
    pub unapplied_customer_credit: String,
    /// Netted by pair settlements.
    pub settlement_offsets: String,
    /// Receipts with something still owed.
    pub open_receipts: usize,
    /// Purchases with something still owed.
    pub open_purchases: usize,
    /// Drift fixed by the recompute run before the report.
    pub reconcile: ReconcileReport,
}

impl From<OutstandingSummary> for OutstandingBody {
    fn from(s: OutstandingSummary) -> Self {
        Self {
            receivables: money(s.receivables),
            payables: money(s.payables),
            unapplied_customer_credit: money(s.unapplied_customer_credit),
            settlement_offsets: money(s.settlement_offsets),
            open_receipts: s.open_receipts,
            open_purchases: s.open_purchases,
            reconcile: s.reconcile,
        }
    }
}

/// GET `/reports/outstanding` - Recompute, then summarise open balances.
async fn outstanding(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<Json<OutstandingBody>> {
    let repo = ReportRepository::new((*state.db).clone());
    Ok(Json(repo.outstanding_summary().await?.into()))
}

/// GET `/customers/{id}/balance` - Open receipts and unapplied credit.
async fn customer_balance(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CustomerBalanceBody>> {
    let repo = ReportRepository::new((*state.db).clone());
    Ok(Json(repo.customer_balance(id).await?.into()))
}

/// POST `/reconcile` - Re-derive every paid field from the link rows.
async fn reconcile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ReconcileReport>> {
    auth.require_admin()?;

    let repo = ReconcileRepository::new((*state.db).clone());
    let report = repo.reconcile_all().await.map_err(quarry_db::RepoError::from)?;

    audit(
        &state,
        &auth,
        AuditEvent::new("RECONCILE", "ledger", "Balances reconciled").metadata(
            serde_json::to_value(&report).unwrap_or_default(),
        ),
    );

    Ok(Json(report))
}
