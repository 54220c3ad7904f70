//! `SeaORM` Entity for payments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PaymentType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub date: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    pub payment_type: PaymentType,
    pub supplier_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub receipt_id: Option<Uuid>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub reference: Option<String>,
    pub custodian: Option<String>,
    pub created_by: Option<Uuid>,
    /// False only for rows written before receipt links existed.
    pub allocation_tracked: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::suppliers::Entity",
        from = "Column::SupplierId",
        to = "super::suppliers::Column::Id"
    )]
    Suppliers,
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customers,
    #[sea_orm(
        belongs_to = "super::receipts::Entity",
        from = "Column::ReceiptId",
        to = "super::receipts::Column::Id"
    )]
    Receipts,
    #[sea_orm(has_many = "super::receipt_payments::Entity")]
    ReceiptPayments,
    #[sea_orm(has_many = "super::inventory_payments::Entity")]
    InventoryPayments,
}

impl Related<super::receipt_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptPayments.def()
    }
}

impl Related<super::inventory_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
