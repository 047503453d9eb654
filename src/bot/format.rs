//! Reply formatting helpers shared by the commands.

use crate::{
    api::PageInfo,
    core::invoice::{InvoiceStatus, InvoiceSummary},
    models::{BillingCode, Student},
};

/// Discord limits a message to 2000 characters
pub const MESSAGE_LIMIT: usize = 2000;

/// Generates a text progress bar like `[████████░░] 80.0%`.
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: usize) -> String {
    let clamped = progress_percent.clamp(0.0, 100.0);

    // clamped ∈ [0, 100] and bar_length is small, so the product fits in usize.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped / 100.0) * bar_length as f64).round() as usize;
    let empty = bar_length.saturating_sub(filled);

    format!(
        "[{}{}] {progress_percent:.1}%",
        "█".repeat(filled),
        "░".repeat(empty)
    )
}

/// Emoji for an invoice status.
#[must_use]
pub const fn status_emoji(status: InvoiceStatus) -> &'static str {
    match status {
        InvoiceStatus::Paid => "🟢",
        InvoiceStatus::NotFull => "🟡",
        InvoiceStatus::NotPaid => "🔴",
    }
}

/// `🟡 2026-03: 1000 / 2600 (Not Full) [████░░░░░░] 38.5%`
#[must_use]
pub fn format_invoice_summary(summary: &InvoiceSummary) -> String {
    format!(
        "{} {}-{:02}: {:.0} / {:.0} ({}) {}",
        status_emoji(summary.status),
        summary.year,
        summary.month,
        summary.paid,
        summary.required,
        summary.status,
        format_progress_bar(summary.percent_paid(), 10)
    )
}

/// `#42 **Aru** (4-A) · 2 billing codes`
#[must_use]
pub fn format_student_line(student: &Student) -> String {
    let class = student.class_name().unwrap_or("no class");
    let count = student.billings.len();
    format!(
        "#{} **{}** ({class}) · {count} billing code{}",
        student.id,
        student.name,
        if count == 1 { "" } else { "s" }
    )
}

/// `` `tuition/2600` 2600 (tuition) `` with an inactive marker when needed.
#[must_use]
pub fn format_billing_code(code: &BillingCode) -> String {
    let inactive = if code.active { "" } else { " _inactive_" };
    format!(
        "`{}` {:.0} ({}){inactive}",
        code.code, code.amount, code.category
    )
}

/// Footer for a list: `Showing 10 of 23` or `Page 2 of 5`, plus a hint naming
/// `more_command` when further pages exist.
#[must_use]
pub fn format_page_footer(
    shown: usize,
    meta: Option<&PageInfo>,
    has_more: bool,
    more_command: &str,
) -> String {
    let position = match meta {
        Some(PageInfo::Range { to, total, .. }) => format!("Showing {to} of {total}"),
        Some(PageInfo::Numbered { current, last, .. }) => format!("Page {current} of {last}"),
        None => format!("Showing {shown}"),
    };
    if has_more {
        format!("{position} · use `{more_command}` for the next page")
    } else {
        position
    }
}

fn join_within<I>(header: &str, lines: I, limit: usize) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut out = String::from(header);
    for line in lines {
        // Room for the newline and a trailing ellipsis line.
        if out.len() + line.len() + 6 > limit {
            out.push_str("\n…");
            break;
        }
        out.push('\n');
        out.push_str(&line);
    }
    out
}

/// Joins `lines` under `header`, stopping before the Discord message limit.
#[must_use]
pub fn join_lines<I>(header: &str, lines: I) -> String
where
    I: IntoIterator<Item = String>,
{
    join_within(header, lines, MESSAGE_LIMIT)
}

/// Like [`join_lines`], but keeps room for `footer`, which always ends the message.
#[must_use]
pub fn join_lines_with_footer<I>(header: &str, lines: I, footer: &str) -> String
where
    I: IntoIterator<Item = String>,
{
    let budget = MESSAGE_LIMIT.saturating_sub(footer.len() + 1);
    let mut out = join_within(header, lines, budget);
    out.push('\n');
    out.push_str(footer);
    out
}

/// Cuts `text` at a line boundary so it fits in one message.
#[must_use]
pub fn truncate(text: String) -> String {
    if text.len() <= MESSAGE_LIMIT {
        return text;
    }
    let mut lines = text.lines();
    let header = lines.next().unwrap_or_default().to_string();
    join_lines(&header, lines.map(str::to_string))
}
