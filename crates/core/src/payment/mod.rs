//! Payment rules.
//!
//! This module implements the pure half of payment handling:
//! - Payment types and the raw request shape
//! - Field validation and normalization (`PaymentSanitizer`)
//! - Cash custody policy
//! - Receipt allocation planning for customer payments
//! - Unapplied customer credit arithmetic
//!
//! Referential checks and persistence live in the database crate, which calls into
//! these functions inside its transactions.

pub mod credit;
pub mod custody;
pub mod error;
pub mod sanitizer;
pub mod types;

#[cfg(test)]
mod sanitizer_props;

pub use credit::unapplied_credit;
pub use custody::CustodyPolicy;
pub use error::PaymentError;
pub use sanitizer::PaymentSanitizer;
pub use types::{PaymentDraft, PaymentTarget, PaymentType, RawPaymentInput};
