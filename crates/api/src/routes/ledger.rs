//! Ledger record routes: customers, suppliers, receipts, inventory, payroll and
//! debris entries.
//!
//! These only create and read. Paid fields on receipts and inventory entries are
//! owned by the payment routes and the recompute pass.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use quarry_core::payment::PaymentSanitizer;
use quarry_db::{
    LedgerRepository,
    entities::sea_orm_active_enums::{DebrisStatus, InventoryEntryType, ReceiptType},
    repositories::{
        CreateDebrisInput, CreateInventoryInput, CreatePartyInput, CreatePayrollInput,
        CreateReceiptInput,
    },
};
use quarry_shared::AuditEvent;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

use super::{PageQuery, audit, parse_uuid};
use crate::{
    AppState,
    dto::{
        DebrisEntryBody, InventoryEntryBody, PageBody, PartyBody, PayrollEntryBody, ReceiptBody,
    },
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};

/// Creates the ledger record routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/{id}", get(get_customer))
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route("/suppliers/{id}", get(get_supplier))
        .route("/receipts", get(list_receipts).post(create_receipt))
        .route("/receipts/{id}", get(get_receipt))
        .route("/inventory", get(list_inventory).post(create_inventory))
        .route("/inventory/{id}", get(get_inventory))
        .route("/payroll-entries", get(list_payroll).post(create_payroll))
        .route("/payroll-entries/{id}", get(get_payroll))
        .route("/debris-entries", get(list_debris).post(create_debris))
        .route("/debris-entries/{id}", get(get_debris))
}

// ============================================================================
// Request Types
// ============================================================================

/// Body for creating a customer or supplier.
#[derive(Debug, Deserialize)]
pub struct CreatePartyRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Phone number.
    pub phone: Option<String>,
}

/// Body for creating a receipt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceiptRequest {
    /// Customer; absent for a walk-in sale.
    pub customer_id: Option<Uuid>,
    /// NORMAL (default) or TVA.
    pub receipt_type: Option<ReceiptType>,
    /// Sale date; today when absent.
    pub date: Option<Value>,
    /// Free-form reference.
    pub reference: Option<String>,
    /// Receipt total, number or numeric string.
    pub total: Option<Value>,
}

/// Body for creating an inventory entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInventoryRequest {
    /// Supplier for purchases.
    pub supplier_id: Option<Uuid>,
    /// PURCHASE (default) or PRODUCTION.
    pub entry_type: Option<InventoryEntryType>,
    /// Product name.
    #[serde(default)]
    pub product: String,
    /// Entry date; today when absent.
    pub date: Option<Value>,
    /// Quantity.
    pub quantity: Option<Value>,
    /// Cost per unit.
    pub unit_cost: Option<Value>,
    /// Total cost; `quantity * unitCost` when absent.
    pub total_cost: Option<Value>,
}

/// Body for creating a payroll entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayrollRequest {
    /// Employee being paid.
    pub employee_id: Option<Uuid>,
    /// Description.
    pub description: Option<String>,
    /// Pay period label.
    #[serde(default)]
    pub period: String,
    /// Amount owed.
    pub amount: Option<Value>,
}

/// Body for creating a debris entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDebrisRequest {
    /// What has to be removed.
    #[serde(default)]
    pub description: String,
    /// Where it is.
    pub job_site: Option<String>,
}

/// List query with an optional owner filter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerListQuery {
    /// Customer filter for receipts.
    pub customer_id: Option<String>,
    /// Supplier filter for inventory entries.
    pub supplier_id: Option<String>,
    /// Employee filter for payroll entries.
    pub employee_id: Option<String>,
    /// Status filter for debris entries.
    pub status: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

impl LedgerListQuery {
    const fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }

    fn debris_status(&self) -> ApiResult<Option<DebrisStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some("PENDING") => Ok(Some(DebrisStatus::Pending)),
            Some("REMOVED") => Ok(Some(DebrisStatus::Removed)),
            Some(other) => Err(ApiError::bad_request(
                "INVALID_STATUS",
                format!("Unknown debris status: {other}"),
            )),
        }
    }
}

/// Reads a decimal given as a JSON number or numeric string. Sign is checked by
/// the repository.
fn decimal_field(value: Option<&Value>, field: &str) -> ApiResult<Option<Decimal>> {
    let text = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => {
            return Err(ApiError::bad_request(
                "INVALID_AMOUNT",
                format!("{field} must be a number"),
            ));
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|_| ApiError::bad_request("INVALID_AMOUNT", format!("{field} must be a number")))
}

fn required_decimal(value: Option<&Value>, field: &str) -> ApiResult<Decimal> {
    decimal_field(value, field)?
        .ok_or_else(|| ApiError::bad_request("INVALID_AMOUNT", format!("{field} is required")))
}

fn repo(state: &AppState) -> LedgerRepository {
    LedgerRepository::new((*state.db).clone())
}

// ============================================================================
// Customers & Suppliers
// ============================================================================

/// POST `/customers` - Create a customer.
async fn create_customer(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreatePartyRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PartyBody>)> {
    let Json(body) = payload?;
    let customer = repo(&state)
        .create_customer(CreatePartyInput {
            name: body.name,
            phone: body.phone,
        })
        .await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("CREATE", "customer", format!("Customer {} created", customer.name))
            .entity(customer.id),
    );
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// GET `/customers` - List customers by name.
async fn list_customers(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageBody<PartyBody>>> {
    let page = repo(&state).list_customers(&query.to_request()).await?;
    Ok(Json(page.into()))
}

/// GET `/customers/{id}` - Get a customer.
async fn get_customer(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PartyBody>> {
    Ok(Json(repo(&state).get_customer(id).await?.into()))
}

/// POST `/suppliers` - Create a supplier.
async fn create_supplier(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreatePartyRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PartyBody>)> {
    let Json(body) = payload?;
    let supplier = repo(&state)
        .create_supplier(CreatePartyInput {
            name: body.name,
            phone: body.phone,
        })
        .await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("CREATE", "supplier", format!("Supplier {} created", supplier.name))
            .entity(supplier.id),
    );
    Ok((StatusCode::CREATED, Json(supplier.into())))
}

/// GET `/suppliers` - List suppliers by name.
async fn list_suppliers(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageBody<PartyBody>>> {
    let page = repo(&state).list_suppliers(&query.to_request()).await?;
    Ok(Json(page.into()))
}

/// GET `/suppliers/{id}` - Get a supplier.
async fn get_supplier(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PartyBody>> {
    Ok(Json(repo(&state).get_supplier(id).await?.into()))
}

// ============================================================================
// Receipts & Inventory
// ============================================================================

/// POST `/receipts` - Record a sale.
async fn create_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateReceiptRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ReceiptBody>)> {
    let Json(body) = payload?;
    let date = PaymentSanitizer::parse_date(body.date.as_ref(), Utc::now().fixed_offset())?;
    let total = required_decimal(body.total.as_ref(), "total")?;

    let receipt = repo(&state)
        .create_receipt(CreateReceiptInput {
            customer_id: body.customer_id,
            receipt_type: body.receipt_type.unwrap_or(ReceiptType::Normal),
            date,
            reference: body.reference,
            total,
        })
        .await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("CREATE", "receipt", "Receipt created").entity(receipt.id),
    );
    Ok((StatusCode::CREATED, Json(receipt.into())))
}

/// GET `/receipts` - List receipts, optionally for one customer.
async fn list_receipts(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<LedgerListQuery>,
) -> ApiResult<Json<PageBody<ReceiptBody>>> {
    let customer_id = parse_uuid(query.customer_id.as_deref(), "INVALID_CUSTOMER")?;
    let page = repo(&state)
        .list_receipts(customer_id, &query.page_query().to_request())
        .await?;
    Ok(Json(page.into()))
}

/// GET `/receipts/{id}` - Get a receipt with its balance.
async fn get_receipt(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReceiptBody>> {
    Ok(Json(repo(&state).get_receipt(id).await?.into()))
}

/// POST `/inventory` - Record a purchase or a production run.
async fn create_inventory(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateInventoryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InventoryEntryBody>)> {
    let Json(body) = payload?;
    let date = PaymentSanitizer::parse_date(body.date.as_ref(), Utc::now().fixed_offset())?;

    let entry = repo(&state)
        .create_inventory_entry(CreateInventoryInput {
            supplier_id: body.supplier_id,
            entry_type: body.entry_type.unwrap_or(InventoryEntryType::Purchase),
            product: body.product,
            date,
            quantity: required_decimal(body.quantity.as_ref(), "quantity")?,
            unit_cost: required_decimal(body.unit_cost.as_ref(), "unitCost")?,
            total_cost: decimal_field(body.total_cost.as_ref(), "totalCost")?,
        })
        .await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("CREATE", "inventory_entry", "Inventory entry created").entity(entry.id),
    );
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// GET `/inventory` - List inventory entries, optionally for one supplier.
async fn list_inventory(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<LedgerListQuery>,
) -> ApiResult<Json<PageBody<InventoryEntryBody>>> {
    let supplier_id = parse_uuid(query.supplier_id.as_deref(), "INVALID_SUPPLIER")?;
    let page = repo(&state)
        .list_inventory_entries(supplier_id, &query.page_query().to_request())
        .await?;
    Ok(Json(page.into()))
}

/// GET `/inventory/{id}` - Get an inventory entry with its balance.
async fn get_inventory(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<InventoryEntryBody>> {
    Ok(Json(repo(&state).get_inventory_entry(id).await?.into()))
}

// ============================================================================
// Payroll & Debris
// ============================================================================

/// POST `/payroll-entries` - Record pay owed to an employee.
async fn create_payroll(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreatePayrollRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PayrollEntryBody>)> {
    let Json(body) = payload?;
    let employee_id = body
        .employee_id
        .ok_or_else(|| ApiError::bad_request("INVALID_EMPLOYEE", "employeeId is required"))?;

    let entry = repo(&state)
        .create_payroll_entry(CreatePayrollInput {
            employee_id,
            description: body.description,
            period: body.period,
            amount: required_decimal(body.amount.as_ref(), "amount")?,
        })
        .await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("CREATE", "payroll_entry", "Payroll entry created").entity(entry.id),
    );
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// GET `/payroll-entries` - List payroll entries, optionally for one employee.
async fn list_payroll(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<LedgerListQuery>,
) -> ApiResult<Json<PageBody<PayrollEntryBody>>> {
    let employee_id = parse_uuid(query.employee_id.as_deref(), "INVALID_EMPLOYEE")?;
    let page = repo(&state)
        .list_payroll_entries(employee_id, &query.page_query().to_request())
        .await?;
    Ok(Json(page.into()))
}

/// GET `/payroll-entries/{id}` - Get a payroll entry.
async fn get_payroll(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PayrollEntryBody>> {
    Ok(Json(repo(&state).get_payroll_entry(id).await?.into()))
}

/// POST `/debris-entries` - Record a debris pile awaiting removal.
async fn create_debris(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateDebrisRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DebrisEntryBody>)> {
    let Json(body) = payload?;
    let entry = repo(&state)
        .create_debris_entry(CreateDebrisInput {
            description: body.description,
            job_site: body.job_site,
        })
        .await?;

    audit(
        &state,
        &auth,
        AuditEvent::new("CREATE", "debris_entry", "Debris entry created").entity(entry.id),
    );
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// GET `/debris-entries` - List debris entries, optionally by status.
async fn list_debris(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<LedgerListQuery>,
) -> ApiResult<Json<PageBody<DebrisEntryBody>>> {
    let status = query.debris_status()?;
    let page = repo(&state)
        .list_debris_entries(status, &query.page_query().to_request())
        .await?;
    Ok(Json(page.into()))
}

/// GET `/debris-entries/{id}` - Get a debris entry.
async fn get_debris(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DebrisEntryBody>> {
    Ok(Json(repo(&state).get_debris_entry(id).await?.into()))
}
