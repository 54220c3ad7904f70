//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the payment ledger
//! - Repositories that run payment, invoice and settlement mutations in one
//!   transaction each
//! - The recompute pass that owns every derived paid field
//! - Database migrations, plus a schema builder for `SQLite` test databases

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod schema;

pub use repositories::{
    InvoiceRepository, LedgerRepository, PaymentRepository, ReconcileRepository, RepoError,
    ReportRepository, SettlementRepository,
};

use std::time::Duration;

use quarry_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
