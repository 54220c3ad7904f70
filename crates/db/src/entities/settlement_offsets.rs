//! `SeaORM` Entity for settlement_offsets table.
//!
//! One row per slice of a barter settlement. Exactly one of `receipt_id` and
//! `inventory_entry_id` is set. `link_id` is kept without a foreign key so the
//! history survives unpairing.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "settlement_offsets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub batch_id: Uuid,
    pub link_id: Uuid,
    pub receipt_id: Option<Uuid>,
    pub inventory_entry_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::receipts::Entity",
        from = "Column::ReceiptId",
        to = "super::receipts::Column::Id"
    )]
    Receipts,
    #[sea_orm(
        belongs_to = "super::inventory_entries::Entity",
        from = "Column::InventoryEntryId",
        to = "super::inventory_entries::Column::Id"
    )]
    InventoryEntries,
}

impl ActiveModelBehavior for ActiveModel {}
