//! Payment validation and normalization.
//!
//! Checks run in a fixed order so the first failure reported is stable:
//! amount, type, date, ids, custodian, then the reference the type requires.
//! Nothing here touches storage; referential checks are done by the caller with
//! the draft this produces.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use quarry_shared::types::{fits_money_column, is_positive_money, round_money};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use super::custody::CustodyPolicy;
use super::error::PaymentError;
use super::types::{PaymentDraft, PaymentTarget, PaymentType, RawPaymentInput};
use crate::allocation::{OpenItem, WaterfallResult, apply_waterfall, sort_oldest_first};

/// Stateless payment validator.
pub struct PaymentSanitizer;

impl PaymentSanitizer {
    /// Validates a raw payment using the current time for a missing date.
    ///
    /// # Errors
    ///
    /// Returns the first `PaymentError` in validation order.
    pub fn sanitize(
        raw: &RawPaymentInput,
        custody: &CustodyPolicy,
    ) -> Result<PaymentDraft, PaymentError> {
        Self::sanitize_at(raw, custody, Utc::now().fixed_offset())
    }

    /// Validates a raw payment, defaulting a missing date to `now`.
    ///
    /// # Errors
    ///
    /// Returns the first `PaymentError` in validation order.
    pub fn sanitize_at(
        raw: &RawPaymentInput,
        custody: &CustodyPolicy,
        now: DateTime<FixedOffset>,
    ) -> Result<PaymentDraft, PaymentError> {
        let amount = Self::parse_amount(raw.amount.as_ref())?;

        let type_name = raw.payment_type.as_deref().unwrap_or_default();
        let payment_type = PaymentType::from_str(type_name)?;

        let date = Self::parse_date(raw.date.as_ref(), now)?;

        let supplier_id = parse_id(raw.supplier_id.as_ref(), PaymentError::InvalidSupplier)?;
        let customer_id = parse_id(raw.customer_id.as_ref(), PaymentError::InvalidCustomer)?;
        let receipt_id = parse_id(raw.receipt_id.as_ref(), PaymentError::InvalidReceipt)?;
        let payroll_entry_id =
            parse_id(raw.payroll_entry_id.as_ref(), PaymentError::InvalidPayroll)?;
        let debris_entry_id = parse_id(raw.debris_entry_id.as_ref(), PaymentError::InvalidDebris)?;

        let custodian = clean_text(raw.custodian.as_deref());
        if let Some(name) = custodian.as_deref()
            && !custody.allows(name)
        {
            return Err(PaymentError::InvalidCustodian(name.to_string()));
        }

        let apply_to_receipts = raw.apply_to_receipts.unwrap_or(true);
        let apply_to_purchases = raw.apply_to_purchases.unwrap_or(true);

        let target = match payment_type {
            PaymentType::Supplier => PaymentTarget::Supplier {
                supplier_id: supplier_id.ok_or(PaymentError::SupplierRequired)?,
                apply_to_purchases,
            },
            PaymentType::Receipt => PaymentTarget::Receipt {
                receipt_id: receipt_id.ok_or(PaymentError::ReceiptRequired)?,
            },
            PaymentType::PayrollSalary | PaymentType::PayrollPiecework => PaymentTarget::Payroll {
                entry_id: payroll_entry_id.ok_or(PaymentError::PayrollRequired)?,
            },
            PaymentType::DebrisRemoval => PaymentTarget::Debris {
                entry_id: debris_entry_id.ok_or(PaymentError::DebrisRequired)?,
            },
            PaymentType::CustomerPayment => PaymentTarget::Customer {
                customer_id: customer_id.ok_or(PaymentError::CustomerRequired)?,
                apply_to_receipts,
            },
            PaymentType::GeneralExpense | PaymentType::OwnerDraw | PaymentType::PayrollRun => {
                PaymentTarget::Unlinked
            }
        };

        Ok(PaymentDraft {
            amount,
            payment_type,
            date,
            description: clean_text(raw.description.as_deref()),
            category: clean_text(raw.category.as_deref()),
            reference: clean_text(raw.reference.as_deref()),
            custodian,
            supplier_id,
            customer_id,
            receipt_id,
            payroll_entry_id,
            debris_entry_id,
            apply_to_receipts,
            apply_to_purchases,
            target,
        })
    }

    /// Parses an amount given as a JSON number or numeric string.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` when missing or non-numeric, when not
    /// positive after rounding to cents, or when wider than the amount column.
    pub fn parse_amount(value: Option<&Value>) -> Result<Decimal, PaymentError> {
        let text = match value {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.trim().to_string(),
            _ => return Err(PaymentError::InvalidAmount),
        };

        let amount = Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| PaymentError::InvalidAmount)?;

        if !is_positive_money(amount) || !fits_money_column(amount) {
            return Err(PaymentError::InvalidAmount);
        }
        Ok(round_money(amount))
    }

    /// Parses a payment date. Accepts RFC 3339, `YYYY-MM-DD`, and
    /// `YYYY-MM-DDTHH:MM:SS` (read as UTC). A missing or blank date is `now`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidDate` for anything else.
    pub fn parse_date(
        value: Option<&Value>,
        now: DateTime<FixedOffset>,
    ) -> Result<DateTime<FixedOffset>, PaymentError> {
        let text = match value {
            None | Some(Value::Null) => return Ok(now),
            Some(Value::String(s)) => s.trim(),
            Some(other) => return Err(PaymentError::InvalidDate(other.to_string())),
        };
        if text.is_empty() {
            return Ok(now);
        }

        if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
            return Ok(instant);
        }
        if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(day.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset());
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(local) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(local.and_utc().fixed_offset());
            }
        }

        Err(PaymentError::InvalidDate(text.to_string()))
    }

    /// Fails when the payroll entry is already settled by a payment other than
    /// the one being edited.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::PayrollAlreadyPaid`.
    pub fn ensure_payroll_available(
        entry_id: Uuid,
        linked_payment: Option<Uuid>,
        editing: Option<Uuid>,
    ) -> Result<(), PaymentError> {
        match linked_payment {
            Some(current) if Some(current) != editing => {
                Err(PaymentError::PayrollAlreadyPaid(entry_id))
            }
            _ => Ok(()),
        }
    }

    /// Fails when the debris entry is already settled by a payment other than
    /// the one being edited.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::DebrisAlreadyPaid`.
    pub fn ensure_debris_available(
        entry_id: Uuid,
        linked_payment: Option<Uuid>,
        editing: Option<Uuid>,
    ) -> Result<(), PaymentError> {
        match linked_payment {
            Some(current) if Some(current) != editing => {
                Err(PaymentError::DebrisAlreadyPaid(entry_id))
            }
            _ => Ok(()),
        }
    }

    /// Plans how a customer payment spreads over the customer's receipts,
    /// oldest first. The plan is advisory: the applier clamps each slice again
    /// against live balances.
    #[must_use]
    pub fn plan_receipt_allocation(amount: Decimal, mut receipts: Vec<OpenItem>) -> WaterfallResult {
        sort_oldest_first(&mut receipts);
        apply_waterfall(amount, &receipts)
    }
}

fn parse_id<T>(value: Option<&Value>, invalid: PaymentError) -> Result<Option<T>, PaymentError>
where
    T: FromStr,
{
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid),
        Some(_) => Err(invalid),
    }
}

fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
