//! `SeaORM` entity definitions.

pub mod customer_supplier_links;
pub mod customers;
pub mod debris_entries;
pub mod inventory_entries;
pub mod inventory_payments;
pub mod invoice_receipts;
pub mod invoices;
pub mod payments;
pub mod payroll_entries;
pub mod receipt_payments;
pub mod receipts;
pub mod sea_orm_active_enums;
pub mod settlement_offsets;
pub mod suppliers;
