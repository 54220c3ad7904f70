//! Payment routes.
//!
//! Creating, editing and deleting a payment each run as one repository
//! transaction: validation, effect reversal, effect application and the balance
//! recompute either all commit or none do.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use quarry_core::payment::{PaymentType, RawPaymentInput};
use quarry_db::{
    PaymentRepository,
    entities::sea_orm_active_enums::PaymentType as PaymentTypeColumn,
    repositories::{PaymentDetails, PaymentFilter},
};
use quarry_shared::AuditEvent;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{PageQuery, audit, parse_uuid};
use crate::{
    AppState,
    dto::{PageBody, PaymentBody, PaymentDetailsBody, money},
    error::ApiResult,
    middleware::AuthUser,
};

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments).post(create_payment))
        .route(
            "/payments/{id}",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing payments.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentsQuery {
    /// Payment type name, e.g. `CUSTOMER_PAYMENT`.
    #[serde(rename = "type")]
    pub payment_type: Option<String>,
    /// Supplier id.
    pub supplier_id: Option<String>,
    /// Customer id.
    pub customer_id: Option<String>,
    /// Receipt id.
    pub receipt_id: Option<String>,
    /// Employee id, matched through payroll entries.
    pub employee_id: Option<String>,
    /// Substring of the description.
    pub description: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

impl ListPaymentsQuery {
    fn to_filter(&self) -> ApiResult<PaymentFilter> {
        let payment_type = match self.payment_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => Some(PaymentTypeColumn::from(PaymentType::from_str(name)?)),
        };

        Ok(PaymentFilter {
            payment_type,
            supplier_id: parse_uuid(self.supplier_id.as_deref(), "INVALID_SUPPLIER")?,
            customer_id: parse_uuid(self.customer_id.as_deref(), "INVALID_CUSTOMER")?,
            receipt_id: parse_uuid(self.receipt_id.as_deref(), "INVALID_RECEIPT")?,
            employee_id: parse_uuid(self.employee_id.as_deref(), "INVALID_EMPLOYEE")?,
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        })
    }

    const fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/payments` - List payments, newest first.
async fn list_payments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListPaymentsQuery>,
) -> ApiResult<Json<PageBody<PaymentBody>>> {
    let filter = query.to_filter()?;
    let page = query.page_query().to_request();

    let repo = PaymentRepository::new((*state.db).clone());
    let payments = repo.list_payments(&filter, &page).await?;
    Ok(Json(payments.into()))
}

/// GET `/payments/{id}` - Payment with its links and the rows it pays.
async fn get_payment(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PaymentDetailsBody>> {
    let repo = PaymentRepository::new((*state.db).clone());
    let details = repo.get_payment(id).await?;
    Ok(Json(details.into()))
}

/// POST `/payments` - Validate, persist and apply a payment.
async fn create_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<RawPaymentInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PaymentDetailsBody>)> {
    let Json(raw) = payload?;

    let repo = PaymentRepository::new((*state.db).clone());
    let details = repo
        .create_payment(&raw, &state.custody, Some(auth.user_id()))
        .await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("CREATE", "payment", "Payment created")
            .entity(details.payment.id)
            .metadata(effects_metadata(&details)),
    );

    Ok((StatusCode::CREATED, Json(details.into())))
}

/// PUT `/payments/{id}` - Replace a payment, moving its effects.
async fn update_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<RawPaymentInput>, JsonRejection>,
) -> ApiResult<Json<PaymentDetailsBody>> {
    let Json(raw) = payload?;

    let repo = PaymentRepository::new((*state.db).clone());
    let details = repo.update_payment(id, &raw, &state.custody).await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("UPDATE", "payment", "Payment updated")
            .entity(id)
            .metadata(effects_metadata(&details)),
    );

    Ok(Json(details.into()))
}

/// DELETE `/payments/{id}` - Reverse a payment's effects and delete it.
async fn delete_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = PaymentRepository::new((*state.db).clone());
    let deleted = repo.delete_payment(id).await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("DELETE", "payment", "Payment deleted")
            .entity(id)
            .metadata(json!({
                "type": deleted.payment_type,
                "amount": money(deleted.amount),
            })),
    );

    Ok(StatusCode::NO_CONTENT)
}

fn effects_metadata(details: &PaymentDetails) -> serde_json::Value {
    json!({
        "type": details.payment.payment_type,
        "amount": money(details.payment.amount),
        "receipts": details.receipt_links.iter().map(|l| l.receipt_id).collect::<Vec<_>>(),
        "inventoryEntries": details
            .inventory_links
            .iter()
            .map(|l| l.inventory_entry_id)
            .collect::<Vec<_>>(),
        "unapplied": money(details.unapplied_amount),
    })
}
