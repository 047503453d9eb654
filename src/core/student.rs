//! Student mutations.
//!
//! Each mutation validates locally, sends one request, and only changes the in-memory
//! student once the backend has acknowledged it. A rejected request leaves the student
//! exactly as it was.

use super::billing::{BillingAction, TuitionPolicy, plan_billing_toggle};
use crate::{
    api::ApiClient,
    errors::Result,
    models::{BillingCode, NewPayment, Payment, Student},
};
use tracing::info;

/// Acknowledged change to a student's billing assignments
#[derive(Debug, Clone, PartialEq)]
pub enum BillingChange {
    /// The code was assigned; carries the assignment as stored by the backend
    Assigned(BillingCode),
    /// The code with this id was removed
    Unassigned(i64),
}

/// Toggles `code` on `student`: assigns it when absent, removes it when present.
///
/// Tuition codes whose amount does not match the student's class are rejected before any
/// request is made.
pub async fn toggle_billing(
    api: &ApiClient,
    student: &mut Student,
    code: &BillingCode,
    policy: &TuitionPolicy,
) -> Result<BillingChange> {
    match plan_billing_toggle(student, code, policy)? {
        BillingAction::Assign => {
            let assigned = api.assign_billing(student.id, code.id).await?;
            student.billings.push(assigned.clone());
            info!(student_id = student.id, code = %assigned.code, "Assigned billing code");
            Ok(BillingChange::Assigned(assigned))
        }
        BillingAction::Unassign => {
            api.unassign_billing(student.id, code.id).await?;
            student.billings.retain(|b| b.id != code.id);
            info!(student_id = student.id, code = %code.code, "Unassigned billing code");
            Ok(BillingChange::Unassigned(code.id))
        }
    }
}

/// Records a payment for `student`.
///
/// Once acknowledged, the payment is appended and, when it targets one of the student's
/// invoices, that invoice's paid and remaining amounts are moved by the paid amount.
pub async fn record_payment(
    api: &ApiClient,
    student: &mut Student,
    payment: &NewPayment,
) -> Result<Payment> {
    let recorded = api.create_payment(payment).await?;

    if let Some(invoice_id) = recorded.invoice_id {
        if let Some(invoice) = student.invoices.iter_mut().find(|i| i.id == invoice_id) {
            invoice.paid_amount += recorded.amount;
            invoice.remaining_amount = (invoice.required_amount - invoice.paid_amount).max(0.0);
        }
    }
    student.payments.push(recorded.clone());
    info!(
        student_id = student.id,
        amount = recorded.amount,
        "Recorded payment"
    );
    Ok(recorded)
}
