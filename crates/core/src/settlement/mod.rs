//! Customer/supplier barter netting.
//!
//! When a customer is also a supplier, what they owe on receipts and what is owed
//! to them on purchases can be offset against each other without cash changing hands.

pub mod error;
pub mod service;

#[cfg(test)]
mod service_props;

pub use error::SettlementError;
pub use service::{SettlementPlan, SettlementService};
