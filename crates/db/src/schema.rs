//! Schema built directly from the entity definitions.
//!
//! Used for `SQLite` test databases, where the `PostgreSQL` migration does not apply.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};

use crate::entities::{
    customer_supplier_links, customers, debris_entries, inventory_entries, inventory_payments,
    invoice_receipts, invoices, payments, payroll_entries, receipt_payments, receipts,
    settlement_offsets, suppliers,
};

/// Creates every table in foreign-key order.
///
/// # Errors
///
/// Returns an error if a `CREATE TABLE` statement fails.
pub async fn create_tables<C>(db: &C) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    create(db, customers::Entity).await?;
    create(db, suppliers::Entity).await?;
    create(db, receipts::Entity).await?;
    create(db, inventory_entries::Entity).await?;
    create(db, payments::Entity).await?;
    create(db, receipt_payments::Entity).await?;
    create(db, inventory_payments::Entity).await?;
    create(db, payroll_entries::Entity).await?;
    create(db, debris_entries::Entity).await?;
    create(db, invoices::Entity).await?;
    create(db, invoice_receipts::Entity).await?;
    create(db, customer_supplier_links::Entity).await?;
    create(db, settlement_offsets::Entity).await?;
    Ok(())
}

async fn create<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let stmt = schema.create_table_from_entity(entity);
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
