//! Initial schema: parties, sales receipts, inventory, payments and their links,
//! payroll and debris entries, invoices, pairings, and settlement offsets.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(PARTIES_SQL).await?;
        db.execute_unprepared(DOCUMENTS_SQL).await?;
        db.execute_unprepared(PAYMENTS_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(SETTLEMENT_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const PARTIES_SQL: &str = r"
CREATE TABLE customers (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    phone VARCHAR(50),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE suppliers (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    phone VARCHAR(50),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const DOCUMENTS_SQL: &str = r"
CREATE TABLE receipts (
    id UUID PRIMARY KEY,
    customer_id UUID REFERENCES customers(id),
    receipt_type VARCHAR(16) NOT NULL DEFAULT 'NORMAL'
        CHECK (receipt_type IN ('NORMAL', 'TVA')),
    date TIMESTAMPTZ NOT NULL,
    reference VARCHAR(100),
    total NUMERIC(14, 2) NOT NULL CHECK (total >= 0),
    amount_paid NUMERIC(14, 2) NOT NULL DEFAULT 0,
    is_paid BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Oldest-first scans per customer
CREATE INDEX idx_receipts_customer_date ON receipts(customer_id, date, id);

CREATE TABLE inventory_entries (
    id UUID PRIMARY KEY,
    supplier_id UUID REFERENCES suppliers(id),
    entry_type VARCHAR(16) NOT NULL CHECK (entry_type IN ('PURCHASE', 'PRODUCTION')),
    product VARCHAR(255) NOT NULL,
    date TIMESTAMPTZ NOT NULL,
    quantity NUMERIC(14, 3) NOT NULL,
    unit_cost NUMERIC(14, 2) NOT NULL,
    total_cost NUMERIC(14, 2) NOT NULL CHECK (total_cost >= 0),
    amount_paid NUMERIC(14, 2) NOT NULL DEFAULT 0,
    is_paid BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Unpaid purchases per supplier, oldest first
CREATE INDEX idx_inventory_supplier_unpaid ON inventory_entries(supplier_id, date, id)
    WHERE entry_type = 'PURCHASE' AND is_paid = false;
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY,
    date TIMESTAMPTZ NOT NULL,
    amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
    payment_type VARCHAR(32) NOT NULL CHECK (payment_type IN (
        'SUPPLIER', 'RECEIPT', 'CUSTOMER_PAYMENT', 'PAYROLL_SALARY', 'PAYROLL_PIECEWORK',
        'DEBRIS_REMOVAL', 'GENERAL_EXPENSE', 'OWNER_DRAW', 'PAYROLL_RUN'
    )),
    supplier_id UUID REFERENCES suppliers(id),
    customer_id UUID REFERENCES customers(id),
    receipt_id UUID REFERENCES receipts(id),
    description TEXT,
    category VARCHAR(100),
    reference VARCHAR(100),
    custodian VARCHAR(100),
    created_by UUID,
    allocation_tracked BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_payments_type_date ON payments(payment_type, date DESC);
CREATE INDEX idx_payments_customer ON payments(customer_id) WHERE customer_id IS NOT NULL;
CREATE INDEX idx_payments_supplier ON payments(supplier_id) WHERE supplier_id IS NOT NULL;
CREATE INDEX idx_payments_receipt ON payments(receipt_id) WHERE receipt_id IS NOT NULL;

CREATE TABLE receipt_payments (
    id UUID PRIMARY KEY,
    payment_id UUID NOT NULL REFERENCES payments(id),
    receipt_id UUID NOT NULL REFERENCES receipts(id),
    amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_receipt_payments_payment ON receipt_payments(payment_id);
CREATE INDEX idx_receipt_payments_receipt ON receipt_payments(receipt_id);

CREATE TABLE inventory_payments (
    id UUID PRIMARY KEY,
    payment_id UUID NOT NULL REFERENCES payments(id),
    inventory_entry_id UUID NOT NULL REFERENCES inventory_entries(id),
    amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_inventory_payments_payment ON inventory_payments(payment_id);
CREATE INDEX idx_inventory_payments_entry ON inventory_payments(inventory_entry_id);

CREATE TABLE payroll_entries (
    id UUID PRIMARY KEY,
    employee_id UUID NOT NULL,
    description TEXT,
    period VARCHAR(20) NOT NULL,
    amount NUMERIC(14, 2) NOT NULL CHECK (amount >= 0),
    payment_id UUID UNIQUE REFERENCES payments(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_payroll_employee ON payroll_entries(employee_id);

CREATE TABLE debris_entries (
    id UUID PRIMARY KEY,
    description TEXT NOT NULL,
    job_site VARCHAR(255),
    status VARCHAR(16) NOT NULL DEFAULT 'PENDING' CHECK (status IN ('PENDING', 'REMOVED')),
    removal_cost NUMERIC(14, 2),
    removal_date TIMESTAMPTZ,
    removal_payment_id UUID UNIQUE REFERENCES payments(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_debris_removed CHECK (
        (status = 'PENDING' AND removal_payment_id IS NULL)
        OR (status = 'REMOVED' AND removal_payment_id IS NOT NULL)
    )
);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    invoice_number VARCHAR(32) NOT NULL UNIQUE,
    customer_id UUID NOT NULL REFERENCES customers(id),
    receipt_type VARCHAR(16) NOT NULL CHECK (receipt_type IN ('NORMAL', 'TVA')),
    date TIMESTAMPTZ NOT NULL,
    subtotal NUMERIC(14, 2) NOT NULL,
    vat_amount NUMERIC(14, 2) NOT NULL DEFAULT 0,
    total NUMERIC(14, 2) NOT NULL,
    amount_paid NUMERIC(14, 2) NOT NULL DEFAULT 0,
    outstanding NUMERIC(14, 2) NOT NULL,
    is_paid BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE invoice_receipts (
    id UUID PRIMARY KEY,
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    receipt_id UUID NOT NULL UNIQUE REFERENCES receipts(id)
);

CREATE INDEX idx_invoice_receipts_invoice ON invoice_receipts(invoice_id);
";

const SETTLEMENT_SQL: &str = r"
CREATE TABLE customer_supplier_links (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL UNIQUE REFERENCES customers(id),
    supplier_id UUID NOT NULL UNIQUE REFERENCES suppliers(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- link_id has no foreign key: offsets outlive the pairing that produced them
CREATE TABLE settlement_offsets (
    id UUID PRIMARY KEY,
    batch_id UUID NOT NULL,
    link_id UUID NOT NULL,
    receipt_id UUID REFERENCES receipts(id),
    inventory_entry_id UUID REFERENCES inventory_entries(id),
    amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_offset_target CHECK (
        (receipt_id IS NULL) <> (inventory_entry_id IS NULL)
    )
);

CREATE INDEX idx_offsets_receipt ON settlement_offsets(receipt_id) WHERE receipt_id IS NOT NULL;
CREATE INDEX idx_offsets_inventory ON settlement_offsets(inventory_entry_id)
    WHERE inventory_entry_id IS NOT NULL;
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS settlement_offsets CASCADE;
DROP TABLE IF EXISTS customer_supplier_links CASCADE;
DROP TABLE IF EXISTS invoice_receipts CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS debris_entries CASCADE;
DROP TABLE IF EXISTS payroll_entries CASCADE;
DROP TABLE IF EXISTS inventory_payments CASCADE;
DROP TABLE IF EXISTS receipt_payments CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS inventory_entries CASCADE;
DROP TABLE IF EXISTS receipts CASCADE;
DROP TABLE IF EXISTS suppliers CASCADE;
DROP TABLE IF EXISTS customers CASCADE;
";
