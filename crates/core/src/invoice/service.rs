//! Invoice rules: which receipts may be grouped and what the invoice totals are.

use quarry_shared::types::round_money;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::InvoiceError;
use super::types::{InvoiceCandidate, InvoiceTotals, ReceiptKind};
use crate::allocation::PaidState;

/// Stateless invoice rules.
pub struct InvoiceService;

impl InvoiceService {
    /// Checks that the receipts can form one invoice and returns the shared
    /// customer and receipt kind.
    ///
    /// # Errors
    ///
    /// - `NoReceipts` for an empty list
    /// - `WalkInReceipt` when a receipt has no customer
    /// - `MixedCustomers` / `MixedReceiptTypes` when receipts disagree
    /// - `ReceiptAlreadyInvoiced` when a receipt is on another invoice
    pub fn validate_candidates(
        candidates: &[InvoiceCandidate],
    ) -> Result<(Uuid, ReceiptKind), InvoiceError> {
        let first = candidates.first().ok_or(InvoiceError::NoReceipts)?;

        let mut customer = None;
        for candidate in candidates {
            let Some(id) = candidate.customer_id else {
                return Err(InvoiceError::WalkInReceipt(candidate.receipt_id));
            };
            match customer {
                None => customer = Some(id),
                Some(existing) if existing != id => return Err(InvoiceError::MixedCustomers),
                Some(_) => {}
            }
        }

        if candidates.iter().any(|c| c.kind != first.kind) {
            return Err(InvoiceError::MixedReceiptTypes);
        }

        if let Some(taken) = candidates.iter().find(|c| c.already_invoiced) {
            return Err(InvoiceError::ReceiptAlreadyInvoiced(taken.receipt_id));
        }

        let customer = customer.ok_or(InvoiceError::NoReceipts)?;
        Ok((customer, first.kind))
    }

    /// Computes the invoice snapshot.
    ///
    /// For TVA invoices the total is VAT inclusive:
    /// `subtotal = round(total / (1 + vat_rate))`, `vat = total - subtotal`.
    #[must_use]
    pub fn compute_totals(
        kind: ReceiptKind,
        candidates: &[InvoiceCandidate],
        vat_rate: Decimal,
    ) -> InvoiceTotals {
        let total = round_money(candidates.iter().map(|c| c.total).sum());
        let paid = PaidState::derive(total, candidates.iter().map(|c| c.amount_paid));

        let (subtotal, vat_amount) = match kind {
            ReceiptKind::Normal => (total, Decimal::ZERO),
            ReceiptKind::Tva => {
                let subtotal = round_money(total / (Decimal::ONE + vat_rate));
                (subtotal, total - subtotal)
            }
        };

        InvoiceTotals {
            subtotal,
            vat_amount,
            total,
            amount_paid: paid.amount_paid,
            outstanding: paid.outstanding,
            is_paid: paid.is_paid,
        }
    }

    /// Formats the sequential invoice number.
    #[must_use]
    pub fn invoice_number(sequence: u64) -> String {
        format!("INV-{sequence:05}")
    }

    /// Amount a mark-paid must cover: the sum of the receipts' outstanding.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceAlreadyPaid` when nothing is owed.
    pub fn payable_amount<I>(invoice_id: Uuid, outstanding: I) -> Result<Decimal, InvoiceError>
    where
        I: IntoIterator<Item = Decimal>,
    {
        let owed = round_money(outstanding.into_iter().sum());
        if owed > Decimal::ZERO {
            Ok(owed)
        } else {
            Err(InvoiceError::InvoiceAlreadyPaid(invoice_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candidate(customer: Option<Uuid>, kind: ReceiptKind, total: Decimal) -> InvoiceCandidate {
        InvoiceCandidate {
            receipt_id: Uuid::now_v7(),
            customer_id: customer,
            kind,
            total,
            amount_paid: Decimal::ZERO,
            already_invoiced: false,
        }
    }

    #[test]
    fn test_validate_ok() {
        let customer = Uuid::now_v7();
        let receipts = vec![
            candidate(Some(customer), ReceiptKind::Tva, dec!(100)),
            candidate(Some(customer), ReceiptKind::Tva, dec!(19)),
        ];

        let (found, kind) = InvoiceService::validate_candidates(&receipts).unwrap();
        assert_eq!(found, customer);
        assert_eq!(kind, ReceiptKind::Tva);
    }

    #[test]
    fn test_validate_empty() {
        assert!(matches!(
            InvoiceService::validate_candidates(&[]),
            Err(InvoiceError::NoReceipts)
        ));
    }

    #[test]
    fn test_validate_walk_in() {
        let receipts = vec![candidate(None, ReceiptKind::Normal, dec!(10))];
        assert!(matches!(
            InvoiceService::validate_candidates(&receipts),
            Err(InvoiceError::WalkInReceipt(_))
        ));
    }

    #[test]
    fn test_validate_mixed_customers() {
        let receipts = vec![
            candidate(Some(Uuid::now_v7()), ReceiptKind::Normal, dec!(10)),
            candidate(Some(Uuid::now_v7()), ReceiptKind::Normal, dec!(10)),
        ];
        assert!(matches!(
            InvoiceService::validate_candidates(&receipts),
            Err(InvoiceError::MixedCustomers)
        ));
    }

    #[test]
    fn test_validate_mixed_kinds() {
        let customer = Some(Uuid::now_v7());
        let receipts = vec![
            candidate(customer, ReceiptKind::Normal, dec!(10)),
            candidate(customer, ReceiptKind::Tva, dec!(10)),
        ];
        assert!(matches!(
            InvoiceService::validate_candidates(&receipts),
            Err(InvoiceError::MixedReceiptTypes)
        ));
    }

    #[test]
    fn test_validate_already_invoiced() {
        let customer = Some(Uuid::now_v7());
        let mut taken = candidate(customer, ReceiptKind::Normal, dec!(10));
        taken.already_invoiced = true;
        let id = taken.receipt_id;

        let receipts = vec![candidate(customer, ReceiptKind::Normal, dec!(10)), taken];
        assert!(matches!(
            InvoiceService::validate_candidates(&receipts),
            Err(InvoiceError::ReceiptAlreadyInvoiced(found)) if found == id
        ));
    }

    #[test]
    fn test_totals_tva() {
        let customer = Some(Uuid::now_v7());
        let receipts = vec![
            candidate(customer, ReceiptKind::Tva, dec!(100)),
            candidate(customer, ReceiptKind::Tva, dec!(19)),
        ];

        let totals = InvoiceService::compute_totals(ReceiptKind::Tva, &receipts, dec!(0.19));
        assert_eq!(totals.total, dec!(119));
        assert_eq!(totals.subtotal, dec!(100.00));
        assert_eq!(totals.vat_amount, dec!(19.00));
        assert_eq!(totals.outstanding, dec!(119));
        assert!(!totals.is_paid);
    }

    #[test]
    fn test_totals_normal_with_payments() {
        let customer = Some(Uuid::now_v7());
        let mut paid = candidate(customer, ReceiptKind::Normal, dec!(60));
        paid.amount_paid = dec!(60);
        let receipts = vec![paid, candidate(customer, ReceiptKind::Normal, dec!(40))];

        let totals = InvoiceService::compute_totals(ReceiptKind::Normal, &receipts, dec!(0.19));
        assert_eq!(totals.subtotal, dec!(100));
        assert_eq!(totals.vat_amount, dec!(0));
        assert_eq!(totals.amount_paid, dec!(60));
        assert_eq!(totals.outstanding, dec!(40));
    }

    #[test]
    fn test_totals_vat_split_sums_to_total() {
        let customer = Some(Uuid::now_v7());
        let receipts = vec![candidate(customer, ReceiptKind::Tva, dec!(33.33))];

        let totals = InvoiceService::compute_totals(ReceiptKind::Tva, &receipts, dec!(0.19));
        assert_eq!(totals.subtotal + totals.vat_amount, totals.total);
        assert_eq!(totals.subtotal, dec!(28.01));
    }

    #[test]
    fn test_invoice_number() {
        assert_eq!(InvoiceService::invoice_number(7), "INV-00007");
        assert_eq!(InvoiceService::invoice_number(123_456), "INV-123456");
    }

    #[test]
    fn test_payable_amount() {
        let id = Uuid::now_v7();
        assert_eq!(
            InvoiceService::payable_amount(id, [dec!(10), dec!(5.5)]).unwrap(),
            dec!(15.5)
        );
        assert!(matches!(
            InvoiceService::payable_amount(id, [dec!(0)]),
            Err(InvoiceError::InvoiceAlreadyPaid(_))
        ));
    }
}
