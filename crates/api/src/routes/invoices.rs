//! Invoice routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use quarry_core::payment::PaymentSanitizer;
use quarry_db::{InvoiceRepository, repositories::InvoicePayment};
use quarry_shared::AuditEvent;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use super::{PageQuery, audit, parse_uuid};
use crate::{
    AppState,
    dto::{InvoiceBody, InvoiceDetailsBody, PageBody, PaymentBody, ReceiptLinkBody, money},
    error::ApiResult,
    middleware::AuthUser,
};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/{id}", get(get_invoice))
        .route("/invoices/{id}/mark-paid", post(mark_paid))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body for grouping receipts into an invoice.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    /// Receipts to invoice.
    #[serde(default)]
    pub receipt_ids: Vec<Uuid>,
    /// Invoice date; now when absent.
    pub date: Option<Value>,
}

/// Query parameters for listing invoices.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesQuery {
    /// Customer filter.
    pub customer_id: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Result of marking an invoice paid.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePaymentBody {
    /// Invoice after the payment.
    pub invoice: InvoiceDetailsBody,
    /// The customer payment created for it.
    pub payment: PaymentBody,
    /// Slices applied to the invoice's receipts.
    pub receipt_links: Vec<ReceiptLinkBody>,
}

impl From<InvoicePayment> for InvoicePaymentBody {
    fn from(p: InvoicePayment) -> Self {
        Self {
            invoice: p.invoice.into(),
            payment: p.payment.into(),
            receipt_links: p.receipt_links.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/invoices` - Group receipts of one customer into an invoice.
async fn create_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InvoiceDetailsBody>)> {
    let Json(body) = payload?;
    let date = match body.date.as_ref() {
        None | Some(Value::Null) => None,
        Some(value) => Some(PaymentSanitizer::parse_date(
            Some(value),
            Utc::now().fixed_offset(),
        )?),
    };

    let repo = InvoiceRepository::new((*state.db).clone());
    let details = repo
        .create_invoice(&body.receipt_ids, date, state.vat_rate)
        .await?;

    audit(
        &state,
        &auth,
        AuditEvent::new(
            "CREATE",
            "invoice",
            format!("Invoice {} created", details.invoice.invoice_number),
        )
        .entity(details.invoice.id)
        .metadata(json!({
            "receipts": details.receipts.iter().map(|r| r.id).collect::<Vec<_>>(),
            "total": money(details.invoice.total),
        })),
    );

    Ok((StatusCode::CREATED, Json(details.into())))
}

/// GET `/invoices` - List invoices, newest first.
async fn list_invoices(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListInvoicesQuery>,
) -> ApiResult<Json<PageBody<InvoiceBody>>> {
    let customer_id = parse_uuid(query.customer_id.as_deref(), "INVALID_CUSTOMER")?;
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .to_request();

    let repo = InvoiceRepository::new((*state.db).clone());
    Ok(Json(repo.list_invoices(customer_id, &page).await?.into()))
}

/// GET `/invoices/{id}` - Invoice with its receipts.
async fn get_invoice(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<InvoiceDetailsBody>> {
    let repo = InvoiceRepository::new((*state.db).clone());
    Ok(Json(repo.get_invoice(id).await?.into()))
}

/// POST `/invoices/{id}/mark-paid` - Pay the rest of an invoice in one payment.
async fn mark_paid(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<InvoicePaymentBody>> {
    let repo = InvoiceRepository::new((*state.db).clone());
    let paid = repo.mark_paid(id, Some(auth.user_id())).await?;

    audit(
        &state,
        &auth,
        AuditEvent::new(
            "MARK_PAID",
            "invoice",
            format!("Invoice {} marked paid", paid.invoice.invoice.invoice_number),
        )
        .entity(id)
        .metadata(json!({
            "paymentId": paid.payment.id,
            "amount": money(paid.payment.amount),
        })),
    );

    Ok(Json(paid.into()))
}
