//! Invoice status derivation.
//!
//! Statuses are never stored; they are derived from the summed amounts of all invoices a
//! student has in a month.

use crate::models::Invoice;
use std::{collections::BTreeMap, fmt};

/// Payment status of a month (or of one billing code within a month)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    /// Nothing outstanding
    Paid,
    /// Partially paid
    NotFull,
    /// Nothing paid
    NotPaid,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paid => write!(f, "Paid"),
            Self::NotFull => write!(f, "Not Full"),
            Self::NotPaid => write!(f, "Not Paid"),
        }
    }
}

/// Summed amounts and derived status for a set of invoices
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceSummary {
    /// Year covered
    pub year: i32,
    /// Month covered
    pub month: u32,
    /// Sum of required amounts
    pub required: f64,
    /// Sum of paid amounts
    pub paid: f64,
    /// Sum of remaining amounts
    pub remaining: f64,
    /// Number of invoices summed
    pub invoice_count: usize,
    /// Derived status
    pub status: InvoiceStatus,
}

impl InvoiceSummary {
    /// Share of the required amount already paid, in percent.
    #[must_use]
    pub fn percent_paid(&self) -> f64 {
        percent_paid(self.required, self.paid)
    }
}

fn percent_paid(required: f64, paid: f64) -> f64 {
    if required > 0.0 {
        paid / required * 100.0
    } else {
        0.0
    }
}

/// Status for summed amounts: Paid when nothing remains or everything required is paid,
/// Not Full when something was paid, Not Paid otherwise.
#[must_use]
pub fn derive_status(required: f64, paid: f64, remaining: f64) -> InvoiceStatus {
    if remaining <= 0.0 || percent_paid(required, paid) >= 100.0 {
        InvoiceStatus::Paid
    } else if paid > 0.0 {
        InvoiceStatus::NotFull
    } else {
        InvoiceStatus::NotPaid
    }
}

fn summarize<'a>(
    year: i32,
    month: u32,
    invoices: impl Iterator<Item = &'a Invoice>,
) -> Option<InvoiceSummary> {
    let mut count = 0;
    let (mut required, mut paid, mut remaining) = (0.0, 0.0, 0.0);
    for invoice in invoices {
        count += 1;
        required += invoice.required_amount;
        paid += invoice.paid_amount;
        remaining += invoice.remaining_amount;
    }
    (count > 0).then(|| InvoiceSummary {
        year,
        month,
        required,
        paid,
        remaining,
        invoice_count: count,
        status: derive_status(required, paid, remaining),
    })
}

/// Summarises every invoice in (`year`, `month`); `None` when the month has no invoices.
#[must_use]
pub fn summarize_month(invoices: &[Invoice], year: i32, month: u32) -> Option<InvoiceSummary> {
    summarize(
        year,
        month,
        invoices
            .iter()
            .filter(|i| i.year == year && i.month == month),
    )
}

/// Summarises (`year`, `month`) separately for each billing code, ordered by billing id.
#[must_use]
pub fn summarize_month_by_billing(
    invoices: &[Invoice],
    year: i32,
    month: u32,
) -> Vec<(i64, InvoiceSummary)> {
    let mut by_billing: BTreeMap<i64, Vec<&Invoice>> = BTreeMap::new();
    for invoice in invoices
        .iter()
        .filter(|i| i.year == year && i.month == month)
    {
        by_billing.entry(invoice.billing_id).or_default().push(invoice);
    }

    by_billing
        .into_iter()
        .filter_map(|(billing_id, group)| {
            summarize(year, month, group.into_iter()).map(|s| (billing_id, s))
        })
        .collect()
}

/// One summary per month of `year` that has invoices, January first.
#[must_use]
pub fn summarize_year(invoices: &[Invoice], year: i32) -> Vec<InvoiceSummary> {
    (1..=12)
        .filter_map(|month| summarize_month(invoices, year, month))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::invoice;

    #[test]
    fn test_status_for_reference_amounts() {
        let paid = [invoice(1, 10, 2026, 3, 100.0, 100.0)];
        let partial = [invoice(1, 10, 2026, 3, 100.0, 40.0)];
        let unpaid = [invoice(1, 10, 2026, 3, 100.0, 0.0)];

        assert_eq!(
            summarize_month(&paid, 2026, 3).unwrap().status,
            InvoiceStatus::Paid
        );
        assert_eq!(
            summarize_month(&partial, 2026, 3).unwrap().status,
            InvoiceStatus::NotFull
        );
        assert_eq!(
            summarize_month(&unpaid, 2026, 3).unwrap().status,
            InvoiceStatus::NotPaid
        );
    }

    #[test]
    fn test_month_sums_across_billing_codes() {
        let invoices = [
            invoice(1, 10, 2026, 3, 2600.0, 2600.0),
            invoice(2, 20, 2026, 3, 500.0, 0.0),
            invoice(3, 10, 2026, 4, 2600.0, 0.0),
        ];
        let summary = summarize_month(&invoices, 2026, 3).unwrap();
        assert_eq!(summary.invoice_count, 2);
        assert_eq!(summary.required, 3100.0);
        assert_eq!(summary.paid, 2600.0);
        assert_eq!(summary.remaining, 500.0);
        assert_eq!(summary.status, InvoiceStatus::NotFull);
        assert!((summary.percent_paid() - 83.87).abs() < 0.01);
    }

    #[test]
    fn test_empty_month_has_no_status() {
        let invoices = [invoice(1, 10, 2026, 3, 100.0, 0.0)];
        assert!(summarize_month(&invoices, 2026, 5).is_none());
        assert!(summarize_month(&[], 2026, 3).is_none());
    }

    #[test]
    fn test_overpaid_or_zero_remaining_is_paid() {
        assert_eq!(derive_status(100.0, 120.0, -20.0), InvoiceStatus::Paid);
        assert_eq!(derive_status(100.0, 0.0, 0.0), InvoiceStatus::Paid);
        assert_eq!(derive_status(0.0, 0.0, 0.0), InvoiceStatus::Paid);
    }

    #[test]
    fn test_breakdown_and_year() {
        let invoices = [
            invoice(1, 20, 2026, 3, 500.0, 500.0),
            invoice(2, 10, 2026, 3, 2600.0, 0.0),
            invoice(3, 10, 2026, 1, 2600.0, 2600.0),
            invoice(4, 10, 2025, 12, 2600.0, 0.0),
        ];

        let breakdown = summarize_month_by_billing(&invoices, 2026, 3);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].0, 10);
        assert_eq!(breakdown[0].1.status, InvoiceStatus::NotPaid);
        assert_eq!(breakdown[1].1.status, InvoiceStatus::Paid);

        let year = summarize_year(&invoices, 2026);
        assert_eq!(year.iter().map(|s| s.month).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_display() {
        assert_eq!(InvoiceStatus::NotFull.to_string(), "Not Full");
    }
}
