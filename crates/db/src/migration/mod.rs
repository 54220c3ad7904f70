//! `PostgreSQL` migrations for the payment ledger.
//!
//! Run through the `migrator` binary. Tests build their `SQLite` schema from the
//! entities instead, see [`crate::schema`].

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_initial;

/// Ordered list of ledger migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240101_000001_initial::Migration)]
    }
}
