//! Discount windows and percentage aggregation.

use crate::models::Discount;
use chrono::NaiveDate;

/// Upper bound for an aggregated discount
pub const MAX_PERCENT: f64 = 100.0;

/// Whether `discount` applies on `today`. Absent bounds do not constrain.
#[must_use]
pub fn is_active(discount: &Discount, today: NaiveDate) -> bool {
    discount.start_date.is_none_or(|start| start <= today)
        && discount.end_date.is_none_or(|end| today <= end)
}

/// Total percentage of the active discounts for a group/billing pair, capped at 100.
#[must_use]
pub fn aggregate_percent(
    discounts: &[Discount],
    group_id: i64,
    billing_id: i64,
    today: NaiveDate,
) -> f64 {
    discounts
        .iter()
        .filter(|d| d.group_id == group_id && d.billing_id == billing_id)
        .filter(|d| is_active(d, today))
        .map(|d| d.percent)
        .sum::<f64>()
        .clamp(0.0, MAX_PERCENT)
}

/// `amount` reduced by `percent`, never below zero.
#[must_use]
pub fn apply_discount(amount: f64, percent: f64) -> f64 {
    (amount * (1.0 - percent.clamp(0.0, MAX_PERCENT) / 100.0)).max(0.0)
}

/// Display string: `15%`, `15% (until 2026-06-30)`, `15% (from 2026-09-01)`, `15% (expired)`.
#[must_use]
pub fn display(discount: &Discount, today: NaiveDate) -> String {
    let percent = format!("{}%", discount.percent);
    match (discount.start_date, discount.end_date) {
        (_, Some(end)) if end < today => format!("{percent} (expired)"),
        (Some(start), _) if today < start => format!("{percent} (from {start})"),
        (_, Some(end)) => format!("{percent} (until {end})"),
        _ => percent,
    }
}
