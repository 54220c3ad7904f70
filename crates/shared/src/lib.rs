//! Shared types, errors, and configuration for Quarry.
//!
//! This crate provides common types used across all other crates:
//! - Money rounding and the settlement epsilon
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and the audit side channel

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use audit::{AuditError, AuditEvent, AuditSink, TracingAuditSink, log_audit};
pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
