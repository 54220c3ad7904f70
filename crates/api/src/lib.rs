//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for payments, invoices, pairing/merges, ledger records and reports
//! - JWT authentication middleware and the admin check
//! - Mapping from domain errors to `{"error", "message"}` JSON responses

pub mod dto;
pub mod error;
pub mod middleware;
pub mod routes;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use axum::Router;
use quarry_core::payment::CustodyPolicy;
use quarry_shared::{AuditSink, JwtService};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Where audit events go.
    pub audit: Arc<dyn AuditSink>,
    /// Employees allowed to hold cash custody.
    pub custody: Arc<CustodyPolicy>,
    /// VAT rate for TVA invoices.
    pub vat_rate: Decimal,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
