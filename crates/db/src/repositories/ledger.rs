//! Plain records the payment engine works against: customers, suppliers,
//! receipts, inventory entries, payroll entries and debris entries.
//!
//! Paid fields start at zero and are owned by the recompute pass from then on.

use chrono::{DateTime, FixedOffset, Utc};
use quarry_shared::types::{
    MAX_QUANTITY, PageRequest, PageResponse, fits_money_column, round_money,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use tracing::info;
use uuid::Uuid;

use super::error::RepoError;
use crate::entities::{
    customers, debris_entries, inventory_entries, payroll_entries, receipts,
    sea_orm_active_enums::{DebrisStatus, InventoryEntryType, ReceiptType},
    suppliers,
};

/// Input for creating a customer or supplier.
#[derive(Debug, Clone)]
pub struct CreatePartyInput {
    /// Display name.
    pub name: String,
    /// Optional phone number.
    pub phone: Option<String>,
}

/// Input for creating a receipt.
#[derive(Debug, Clone)]
pub struct CreateReceiptInput {
    /// Customer; `None` for a walk-in sale.
    pub customer_id: Option<Uuid>,
    /// NORMAL or TVA.
    pub receipt_type: ReceiptType,
    /// Sale date.
    pub date: DateTime<FixedOffset>,
    /// Free-form reference.
    pub reference: Option<String>,
    /// Receipt total.
    pub total: Decimal,
}

/// Input for creating an inventory entry.
#[derive(Debug, Clone)]
pub struct CreateInventoryInput {
    /// Supplier, required for purchases in practice but not enforced.
    pub supplier_id: Option<Uuid>,
    /// PURCHASE or PRODUCTION.
    pub entry_type: InventoryEntryType,
    /// Product name.
    pub product: String,
    /// Entry date.
    pub date: DateTime<FixedOffset>,
    /// Quantity.
    pub quantity: Decimal,
    /// Cost per unit.
    pub unit_cost: Decimal,
    /// Total cost; `unit_cost * quantity` when absent.
    pub total_cost: Option<Decimal>,
}

/// Input for creating a payroll entry.
#[derive(Debug, Clone)]
pub struct CreatePayrollInput {
    /// Employee being paid.
    pub employee_id: Uuid,
    /// Description.
    pub description: Option<String>,
    /// Pay period label, e.g. `2024-06`.
    pub period: String,
    /// Amount owed.
    pub amount: Decimal,
}

/// Input for creating a debris entry.
#[derive(Debug, Clone)]
pub struct CreateDebrisInput {
    /// What has to be removed.
    pub description: String,
    /// Where it is.
    pub job_site: Option<String>,
}

/// Ledger record repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a customer.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_NAME` for a blank name, or a database error.
    pub async fn create_customer(
        &self,
        input: CreatePartyInput,
    ) -> Result<customers::Model, RepoError> {
        let name = required_name(&input.name)?;
        let customer = customers::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name),
            phone: Set(clean(input.phone)),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await?;

        info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Loads a customer.
    ///
    /// # Errors
    ///
    /// Returns `CUSTOMER_NOT_FOUND` or a database error.
    pub async fn get_customer(&self, id: Uuid) -> Result<customers::Model, RepoError> {
        customers::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepoError::NotFound {
                entity: "customer",
                id,
            })
    }

    /// Lists customers by name.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_customers(
        &self,
        page: &PageRequest,
    ) -> Result<PageResponse<customers::Model>, RepoError> {
        let query = customers::Entity::find()
            .order_by_asc(customers::Column::Name)
            .order_by_asc(customers::Column::Id);
        fetch_page(&self.db, query, page).await
    }

    /// Creates a supplier.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_NAME` for a blank name, or a database error.
    pub async fn create_supplier(
        &self,
        input: CreatePartyInput,
    ) -> Result<suppliers::Model, RepoError> {
        let name = required_name(&input.name)?;
        let supplier = suppliers::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name),
            phone: Set(clean(input.phone)),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await?;

        info!(supplier_id = %supplier.id, "Supplier created");
        Ok(supplier)
    }

    /// Loads a supplier.
    ///
    /// # Errors
    ///
    /// Returns `SUPPLIER_NOT_FOUND` or a database error.
    pub async fn get_supplier(&self, id: Uuid) -> Result<suppliers::Model, RepoError> {
        suppliers::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepoError::NotFound {
                entity: "supplier",
                id,
            })
    }

    /// Lists suppliers by name.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_suppliers(
        &self,
        page: &PageRequest,
    ) -> Result<PageResponse<suppliers::Model>, RepoError> {
        let query = suppliers::Entity::find()
            .order_by_asc(suppliers::Column::Name)
            .order_by_asc(suppliers::Column::Id);
        fetch_page(&self.db, query, page).await
    }

    /// Creates a receipt.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_AMOUNT` for a negative total, `CUSTOMER_NOT_FOUND`, or a
    /// database error.
    pub async fn create_receipt(
        &self,
        input: CreateReceiptInput,
    ) -> Result<receipts::Model, RepoError> {
        let total = round_money(input.total);
        if total < Decimal::ZERO || !fits_money_column(total) {
            return Err(RepoError::invalid(
                "INVALID_AMOUNT",
                "Receipt total must be a non-negative amount within range",
            ));
        }
        if let Some(customer_id) = input.customer_id {
            self.get_customer(customer_id).await?;
        }

        let now = Utc::now().fixed_offset();
        let receipt = receipts::ActiveModel {
            id: Set(Uuid::now_v7()),
            customer_id: Set(input.customer_id),
            receipt_type: Set(input.receipt_type),
            date: Set(input.date),
            reference: Set(clean(input.reference)),
            total: Set(total),
            amount_paid: Set(Decimal::ZERO),
            is_paid: Set(total.is_zero()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(receipt_id = %receipt.id, total = %receipt.total, "Receipt created");
        Ok(receipt)
    }

    /// Loads a receipt.
    ///
    /// # Errors
    ///
    /// Returns `RECEIPT_NOT_FOUND` or a database error.
    pub async fn get_receipt(&self, id: Uuid) -> Result<receipts::Model, RepoError> {
        receipts::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepoError::NotFound {
                entity: "receipt",
                id,
            })
    }

    /// Lists receipts oldest first, optionally for one customer.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_receipts(
        &self,
        customer_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<PageResponse<receipts::Model>, RepoError> {
        let mut query = receipts::Entity::find();
        if let Some(customer_id) = customer_id {
            query = query.filter(receipts::Column::CustomerId.eq(customer_id));
        }
        let query = query
            .order_by_asc(receipts::Column::Date)
            .order_by_asc(receipts::Column::Id);
        fetch_page(&self.db, query, page).await
    }

    /// Creates an inventory entry.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_AMOUNT` for negative or out-of-range costs or quantity,
    /// `SUPPLIER_NOT_FOUND`, or a database error.
    pub async fn create_inventory_entry(
        &self,
        input: CreateInventoryInput,
    ) -> Result<inventory_entries::Model, RepoError> {
        let out_of_range = || {
            RepoError::invalid(
                "INVALID_AMOUNT",
                "Quantity and costs must be non-negative and within range",
            )
        };
        let unit_cost = round_money(input.unit_cost);
        let total_cost = match input.total_cost {
            Some(total) => total,
            None => unit_cost
                .checked_mul(input.quantity)
                .ok_or_else(out_of_range)?,
        };
        let total_cost = round_money(total_cost);
        if input.quantity < Decimal::ZERO
            || input.quantity > MAX_QUANTITY
            || unit_cost < Decimal::ZERO
            || total_cost < Decimal::ZERO
            || !fits_money_column(unit_cost)
            || !fits_money_column(total_cost)
        {
            return Err(out_of_range());
        }
        if let Some(supplier_id) = input.supplier_id {
            self.get_supplier(supplier_id).await?;
        }

        let now = Utc::now().fixed_offset();
        let entry = inventory_entries::ActiveModel {
            id: Set(Uuid::now_v7()),
            supplier_id: Set(input.supplier_id),
            entry_type: Set(input.entry_type),
            product: Set(input.product.trim().to_string()),
            date: Set(input.date),
            quantity: Set(input.quantity),
            unit_cost: Set(unit_cost),
            total_cost: Set(total_cost),
            amount_paid: Set(Decimal::ZERO),
            is_paid: Set(total_cost.is_zero()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(
            inventory_entry_id = %entry.id,
            total_cost = %entry.total_cost,
            "Inventory entry created"
        );
        Ok(entry)
    }

    /// Loads an inventory entry.
    ///
    /// # Errors
    ///
    /// Returns `INVENTORY_ENTRY_NOT_FOUND` or a database error.
    pub async fn get_inventory_entry(
        &self,
        id: Uuid,
    ) -> Result<inventory_entries::Model, RepoError> {
        inventory_entries::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepoError::NotFound {
                entity: "inventory entry",
                id,
            })
    }

    /// Lists inventory entries oldest first, optionally for one supplier.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_inventory_entries(
        &self,
        supplier_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<PageResponse<inventory_entries::Model>, RepoError> {
        let mut query = inventory_entries::Entity::find();
        if let Some(supplier_id) = supplier_id {
            query = query.filter(inventory_entries::Column::SupplierId.eq(supplier_id));
        }
        let query = query
            .order_by_asc(inventory_entries::Column::Date)
            .order_by_asc(inventory_entries::Column::Id);
        fetch_page(&self.db, query, page).await
    }

    /// Creates a payroll entry.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_AMOUNT` for a non-positive amount, or a database error.
    pub async fn create_payroll_entry(
        &self,
        input: CreatePayrollInput,
    ) -> Result<payroll_entries::Model, RepoError> {
        let amount = round_money(input.amount);
        if amount <= Decimal::ZERO || !fits_money_column(amount) {
            return Err(RepoError::invalid(
                "INVALID_AMOUNT",
                "Payroll amount must be positive and within range",
            ));
        }

        let entry = payroll_entries::ActiveModel {
            id: Set(Uuid::now_v7()),
            employee_id: Set(input.employee_id),
            description: Set(clean(input.description)),
            period: Set(input.period.trim().to_string()),
            amount: Set(amount),
            payment_id: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await?;

        info!(payroll_entry_id = %entry.id, employee_id = %entry.employee_id, "Payroll entry created");
        Ok(entry)
    }

    /// Loads a payroll entry.
    ///
    /// # Errors
    ///
    /// Returns `PAYROLL_NOT_FOUND` or a database error.
    pub async fn get_payroll_entry(&self, id: Uuid) -> Result<payroll_entries::Model, RepoError> {
        payroll_entries::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepoError::NotFound {
                entity: "payroll entry",
                id,
            })
    }

    /// Lists payroll entries, newest first, optionally for one employee.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_payroll_entries(
        &self,
        employee_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<PageResponse<payroll_entries::Model>, RepoError> {
        let mut query = payroll_entries::Entity::find();
        if let Some(employee_id) = employee_id {
            query = query.filter(payroll_entries::Column::EmployeeId.eq(employee_id));
        }
        let query = query.order_by_desc(payroll_entries::Column::Id);
        fetch_page(&self.db, query, page).await
    }

    /// Creates a pending debris entry.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_DESCRIPTION` for a blank description, or a database error.
    pub async fn create_debris_entry(
        &self,
        input: CreateDebrisInput,
    ) -> Result<debris_entries::Model, RepoError> {
        let description = input.description.trim();
        if description.is_empty() {
            return Err(RepoError::invalid(
                "INVALID_DESCRIPTION",
                "Description is required",
            ));
        }

        let entry = debris_entries::ActiveModel {
            id: Set(Uuid::now_v7()),
            description: Set(description.to_string()),
            job_site: Set(clean(input.job_site)),
            status: Set(DebrisStatus::Pending),
            removal_cost: Set(None),
            removal_date: Set(None),
            removal_payment_id: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await?;

        info!(debris_entry_id = %entry.id, "Debris entry created");
        Ok(entry)
    }

    /// Loads a debris entry.
    ///
    /// # Errors
    ///
    /// Returns `DEBRIS_NOT_FOUND` or a database error.
    pub async fn get_debris_entry(&self, id: Uuid) -> Result<debris_entries::Model, RepoError> {
        debris_entries::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RepoError::NotFound {
                entity: "debris entry",
                id,
            })
    }

    /// Lists debris entries, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_debris_entries(
        &self,
        status: Option<DebrisStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<debris_entries::Model>, RepoError> {
        let mut query = debris_entries::Entity::find();
        if let Some(status) = status {
            query = query.filter(debris_entries::Column::Status.eq(status));
        }
        let query = query.order_by_desc(debris_entries::Column::Id);
        fetch_page(&self.db, query, page).await
    }
}

async fn fetch_page<C, E>(
    conn: &C,
    query: Select<E>,
    page: &PageRequest,
) -> Result<PageResponse<E::Model>, RepoError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
{
    let total = query.clone().count(conn).await?;
    let data = query
        .offset(page.offset())
        .limit(page.limit())
        .all(conn)
        .await?;
    Ok(PageResponse::new(data, page, total))
}

fn required_name(name: &str) -> Result<String, RepoError> {
    let name = name.trim();
    if name.is_empty() {
        Err(RepoError::invalid("INVALID_NAME", "Name is required"))
    } else {
        Ok(name.to_string())
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
