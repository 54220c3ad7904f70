//! Repository abstractions for data access.
//!
//! Repositories own their database transactions and hide the `SeaORM` details from
//! the HTTP layer. The payment effect helpers are public so invoices and tests can
//! drive them inside their own transactions.

pub mod error;
pub mod invoice;
pub mod ledger;
pub mod payment;
pub mod payment_apply;
pub mod payment_reverse;
pub mod reconcile;
pub mod report;
pub mod settlement;

pub use error::RepoError;
pub use invoice::{InvoiceDetails, InvoicePayment, InvoiceRepository};
pub use ledger::{
    CreateDebrisInput, CreateInventoryInput, CreatePartyInput, CreatePayrollInput,
    CreateReceiptInput, LedgerRepository,
};
pub use payment::{
    PaymentDetails, PaymentFilter, PaymentRepository, SanitizedPayment, sanitize_payment,
};
pub use payment_apply::{AppliedEffects, apply_payment_effects};
pub use payment_reverse::{PaymentLinks, ReversedEffects, load_links, reverse_payment_effects};
pub use reconcile::{
    ReconcileReport, ReconcileRepository, Recomputed, reconcile_all_in,
    recompute_inventory_entries, recompute_receipts,
};
pub use report::{CustomerBalance, OutstandingSummary, ReportRepository};
pub use settlement::{MergeSummary, PairSettlement, SettlementRepository, SettlementSummary};
