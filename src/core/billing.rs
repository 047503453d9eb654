//! Billing-code rules.
//!
//! Tuition codes embed their monthly amount (`tuition/2600`). The amount a student may be
//! billed depends only on whether the student's class pair is in the special set. Every
//! other code is a plain toggle.

use crate::{
    errors::{Error, Result},
    models::{BillingCode, Student},
};

/// Prefix shared by all tuition billing codes
pub const TUITION_PREFIX: &str = "tuition/";

const AMOUNT_TOLERANCE: f64 = 0.005;

/// Tuition amounts by class pair
#[derive(Debug, Clone, PartialEq)]
pub struct TuitionPolicy {
    special_classes: Vec<String>,
    special_amount: f64,
    default_amount: f64,
}

impl TuitionPolicy {
    /// Creates a policy where `special_classes` are billed `special_amount` and every other
    /// class `default_amount`.
    pub fn new<I, S>(special_classes: I, special_amount: f64, default_amount: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            special_classes: special_classes
                .into_iter()
                .map(|c| normalize_class_pair(c.as_ref()))
                .collect(),
            special_amount,
            default_amount,
        }
    }

    /// Whether `class` belongs to the special set.
    #[must_use]
    pub fn is_special(&self, class: &str) -> bool {
        let class = normalize_class_pair(class);
        self.special_classes.contains(&class)
    }

    /// Monthly tuition allowed for a student in `class`.
    #[must_use]
    pub fn allowed_tuition_amount(&self, class: &str) -> f64 {
        if self.is_special(class) {
            self.special_amount
        } else {
            self.default_amount
        }
    }
}

/// Canonical form of a class pair: whitespace removed, upper-cased (`" 4 - a"` → `"4-A"`).
#[must_use]
pub fn normalize_class_pair(class: &str) -> String {
    class
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Whether `code` is a tuition code.
#[must_use]
pub fn is_tuition_code(code: &str) -> bool {
    code.starts_with(TUITION_PREFIX)
}

/// Amount embedded in a tuition code; `None` for other codes or a non-numeric suffix.
#[must_use]
pub fn extract_tuition_amount_from_code(code: &str) -> Option<f64> {
    code.strip_prefix(TUITION_PREFIX)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
}

/// Category implied by a code: the part before the first `/` (`meal/500` → `meal`).
#[must_use]
pub fn category_of(code: &str) -> &str {
    code.split_once('/').map_or(code, |(category, _)| category).trim()
}

/// What toggling a billing code on a student will do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingAction {
    /// Add the code
    Assign,
    /// Remove the code
    Unassign,
}

/// Decides what toggling `code` on `student` means and whether it is allowed.
///
/// A code already assigned is removed. A tuition code is only assigned when its embedded
/// amount equals the amount allowed for the student's class; a student without a class
/// cannot receive tuition. Inactive codes can still be removed but never assigned.
pub fn plan_billing_toggle(
    student: &Student,
    code: &BillingCode,
    policy: &TuitionPolicy,
) -> Result<BillingAction> {
    if student.has_billing(code.id) {
        return Ok(BillingAction::Unassign);
    }

    if !code.active {
        return Err(Error::validation(
            "code",
            format!("{} is inactive and cannot be assigned", code.code),
        ));
    }

    if let Some(amount) = extract_tuition_amount_from_code(&code.code) {
        let class = student.class_name().ok_or_else(|| {
            Error::validation(
                "class",
                format!("{} has no class, tuition cannot be assigned", student.name),
            )
        })?;
        let allowed = policy.allowed_tuition_amount(class);
        if (amount - allowed).abs() > AMOUNT_TOLERANCE {
            return Err(Error::TuitionMismatch {
                code: code.code.clone(),
                class: class.to_string(),
                allowed,
            });
        }
    }

    Ok(BillingAction::Assign)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{billing_code, student_in};

    fn policy() -> TuitionPolicy {
        TuitionPolicy::new(["11-A", "11-B"], 3000.0, 2600.0)
    }

    #[test]
    fn test_allowed_amount_by_class_membership() {
        let policy = policy();
        for class in ["11-A", "11-B", " 11 - a", "11-b"] {
            assert_eq!(policy.allowed_tuition_amount(class), 3000.0, "{class}");
        }
        for class in ["4-A", "11-C", "1-A", ""] {
            assert_eq!(policy.allowed_tuition_amount(class), 2600.0, "{class}");
        }
    }

    #[test]
    fn test_extract_tuition_amount() {
        assert_eq!(extract_tuition_amount_from_code("tuition/2600"), Some(2600.0));
        assert_eq!(extract_tuition_amount_from_code("tuition/3000"), Some(3000.0));
        assert_eq!(extract_tuition_amount_from_code("tuition/"), None);
        assert_eq!(extract_tuition_amount_from_code("tuition/abc"), None);
        assert_eq!(extract_tuition_amount_from_code("tuition/NaN"), None);
        assert_eq!(extract_tuition_amount_from_code("meal/500"), None);
        assert_eq!(extract_tuition_amount_from_code("Tuition/2600"), None);
    }

    #[test]
    fn test_tuition_mismatch_is_rejected() {
        let student = student_in(1, "Aru", "4-A");
        let code = billing_code(10, "tuition/3000", 3000.0);

        let result = plan_billing_toggle(&student, &code, &policy());
        match result {
            Err(Error::TuitionMismatch { allowed, class, .. }) => {
                assert_eq!(allowed, 2600.0);
                assert_eq!(class, "4-A");
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_matching_tuition_is_assigned() {
        let student = student_in(1, "Aru", "11-B");
        let code = billing_code(10, "tuition/3000", 3000.0);
        assert_eq!(
            plan_billing_toggle(&student, &code, &policy()).ok(),
            Some(BillingAction::Assign)
        );
    }

    #[test]
    fn test_tuition_requires_class() {
        let mut student = student_in(1, "Aru", "4-A");
        student.group = None;
        let code = billing_code(10, "tuition/2600", 2600.0);
        assert!(matches!(
            plan_billing_toggle(&student, &code, &policy()),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_non_tuition_code_toggles() {
        let mut student = student_in(1, "Aru", "4-A");
        let code = billing_code(20, "meal/500", 500.0);

        assert_eq!(
            plan_billing_toggle(&student, &code, &policy()).ok(),
            Some(BillingAction::Assign)
        );
        student.billings.push(code.clone());
        assert_eq!(
            plan_billing_toggle(&student, &code, &policy()).ok(),
            Some(BillingAction::Unassign)
        );
    }

    #[test]
    fn test_inactive_code_cannot_be_assigned() {
        let mut student = student_in(1, "Aru", "4-A");
        let mut code = billing_code(20, "meal/500", 500.0);
        code.active = false;

        assert!(matches!(
            plan_billing_toggle(&student, &code, &policy()),
            Err(Error::Validation { .. })
        ));

        student.billings.push(code.clone());
        assert_eq!(
            plan_billing_toggle(&student, &code, &policy()).ok(),
            Some(BillingAction::Unassign)
        );
    }

    #[test]
    fn test_category_of() {
        assert_eq!(category_of("meal/500"), "meal");
        assert_eq!(category_of("tuition/2600"), "tuition");
        assert_eq!(category_of("transport"), "transport");
    }
}
