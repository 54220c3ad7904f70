//! Invoices built from sales receipts.
//!
//! An invoice groups receipts of one customer and one receipt kind and carries a
//! snapshot of their totals. The snapshot is refreshed when the invoice is paid.

pub mod error;
pub mod service;
pub mod types;

pub use error::InvoiceError;
pub use service::InvoiceService;
pub use types::{InvoiceCandidate, InvoiceTotals, ReceiptKind};
