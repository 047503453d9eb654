//! Form validation run before any request is sent.
//!
//! Each function checks required fields, numeric ranges and string lengths and returns the
//! first problem as [`Error::Validation`].

use super::billing::{extract_tuition_amount_from_code, is_tuition_code};
use chrono::NaiveDate;
use crate::{
    errors::{Error, Result},
    models::{
        BillingCodePatch, Credentials, DiscountPatch, InvoicePatch, NewBillingCode, NewDiscount,
        NewInvoice, NewPayment, NewUser, UserPatch,
    },
};

/// Longest accepted billing code string
pub const MAX_CODE_LEN: usize = 64;
/// Longest accepted description
pub const MAX_DESCRIPTION_LEN: usize = 255;
/// Largest amount accepted for a single charge or payment
pub const MAX_AMOUNT: f64 = 10_000_000.0;
/// Longest accepted person name
pub const MAX_NAME_LEN: usize = 100;
/// Shortest accepted password
pub const MIN_PASSWORD_LEN: usize = 8;
/// Largest accepted timetable upload in bytes (5 MiB)
pub const MAX_TIMETABLE_BYTES: usize = 5 * 1024 * 1024;
/// Accepted timetable file extensions
pub const TIMETABLE_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "csv", "pdf"];

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "is required"));
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

fn amount_in_range(field: &str, amount: f64, allow_zero: bool) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 || (!allow_zero && amount <= 0.0) {
        let bound = if allow_zero { "zero or more" } else { "greater than zero" };
        return Err(Error::validation(field, format!("must be {bound}")));
    }
    if amount > MAX_AMOUNT {
        return Err(Error::validation(
            field,
            format!("must not exceed {MAX_AMOUNT:.0}"),
        ));
    }
    Ok(())
}

fn percent_in_range(percent: f64) -> Result<()> {
    if !percent.is_finite() || percent <= 0.0 || percent > 100.0 {
        return Err(Error::validation(
            "percent",
            "must be greater than 0 and at most 100",
        ));
    }
    Ok(())
}

fn email(value: &str) -> Result<()> {
    required("email", value)?;
    let valid = value
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(Error::validation("email", "is not a valid address"));
    }
    max_len("email", value, MAX_DESCRIPTION_LEN)
}

/// Parses an optional `YYYY-MM-DD` form field; blank input means "not set".
pub fn parse_optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| Error::validation(field, "must be a date like 2026-09-01")),
    }
}

/// Validates a login form.
pub fn validate_credentials(credentials: &Credentials) -> Result<()> {
    required("username", &credentials.username)?;
    required("password", &credentials.password)
}

/// Validates a new billing code; tuition codes must carry their own amount.
pub fn validate_new_billing_code(code: &NewBillingCode) -> Result<()> {
    required("code", &code.code)?;
    max_len("code", &code.code, MAX_CODE_LEN)?;
    required("category", &code.category)?;
    max_len("category", &code.category, MAX_CODE_LEN)?;
    if let Some(description) = &code.description {
        max_len("description", description, MAX_DESCRIPTION_LEN)?;
    }
    amount_in_range("amount", code.amount, true)?;

    if is_tuition_code(&code.code) {
        let embedded = extract_tuition_amount_from_code(&code.code).ok_or_else(|| {
            Error::validation("code", "tuition codes must look like tuition/<amount>")
        })?;
        if (embedded - code.amount).abs() > 0.005 {
            return Err(Error::validation(
                "amount",
                format!("must equal the amount in the code ({embedded:.0})"),
            ));
        }
    }
    Ok(())
}

/// Validates a billing-code update.
pub fn validate_billing_patch(patch: &BillingCodePatch) -> Result<()> {
    if let Some(description) = &patch.description {
        max_len("description", description, MAX_DESCRIPTION_LEN)?;
    }
    if let Some(amount) = patch.amount {
        amount_in_range("amount", amount, true)?;
    }
    Ok(())
}

/// Validates a new discount.
pub fn validate_new_discount(discount: &NewDiscount) -> Result<()> {
    percent_in_range(discount.percent)?;
    if let (Some(start), Some(end)) = (discount.start_date, discount.end_date) {
        if start > end {
            return Err(Error::validation("end_date", "must not be before start_date"));
        }
    }
    Ok(())
}

/// Validates a discount update.
pub fn validate_discount_patch(patch: &DiscountPatch) -> Result<()> {
    if let Some(percent) = patch.percent {
        percent_in_range(percent)?;
    }
    if let (Some(start), Some(end)) = (patch.start_date, patch.end_date) {
        if start > end {
            return Err(Error::validation("end_date", "must not be before start_date"));
        }
    }
    Ok(())
}

/// Validates a new invoice.
pub fn validate_new_invoice(invoice: &NewInvoice) -> Result<()> {
    if !(1..=12).contains(&invoice.month) {
        return Err(Error::validation("month", "must be between 1 and 12"));
    }
    if !(2000..=2100).contains(&invoice.year) {
        return Err(Error::validation("year", "must be between 2000 and 2100"));
    }
    amount_in_range("required_amount", invoice.required_amount, true)
}

/// Validates an invoice update.
pub fn validate_invoice_patch(patch: &InvoicePatch) -> Result<()> {
    if let Some(required) = patch.required_amount {
        amount_in_range("required_amount", required, true)?;
    }
    if let Some(paid) = patch.paid_amount {
        amount_in_range("paid_amount", paid, true)?;
    }
    Ok(())
}

/// Validates a payment.
pub fn validate_new_payment(payment: &NewPayment) -> Result<()> {
    amount_in_range("amount", payment.amount, false)?;
    if let Some(method) = &payment.method {
        max_len("method", method, MAX_CODE_LEN)?;
    }
    Ok(())
}

/// Validates a new staff account.
pub fn validate_new_user(user: &NewUser) -> Result<()> {
    required("name", &user.name)?;
    max_len("name", &user.name, MAX_NAME_LEN)?;
    email(&user.email)?;
    required("role", &user.role)?;
    if user.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

/// Validates a staff account update.
pub fn validate_user_patch(patch: &UserPatch) -> Result<()> {
    if let Some(name) = &patch.name {
        required("name", name)?;
        max_len("name", name, MAX_NAME_LEN)?;
    }
    if let Some(address) = &patch.email {
        email(address)?;
    }
    Ok(())
}

/// Validates a timetable upload by name and size.
pub fn validate_timetable_file(file_name: &str, size: usize) -> Result<()> {
    required("file", file_name)?;
    if size == 0 {
        return Err(Error::validation("file", "is empty"));
    }
    if size > MAX_TIMETABLE_BYTES {
        return Err(Error::validation("file", "must be at most 5 MiB"));
    }
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !TIMETABLE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Error::validation(
            "file",
            format!("must be one of: {}", TIMETABLE_EXTENSIONS.join(", ")),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_code(code: &str, amount: f64) -> NewBillingCode {
        NewBillingCode {
            code: code.to_string(),
            category: "tuition".to_string(),
            description: None,
            amount,
            active: true,
        }
    }

    fn field_of(result: Result<()>) -> Option<String> {
        match result {
            Err(Error::Validation { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_billing_code_rules() {
        assert!(validate_new_billing_code(&new_code("tuition/2600", 2600.0)).is_ok());
        assert!(validate_new_billing_code(&new_code("meal/500", 450.0)).is_ok());
        assert_eq!(
            field_of(validate_new_billing_code(&new_code("tuition/2600", 3000.0))),
            Some("amount".to_string())
        );
        assert_eq!(
            field_of(validate_new_billing_code(&new_code("tuition/x", 3000.0))),
            Some("code".to_string())
        );
        assert_eq!(
            field_of(validate_new_billing_code(&new_code("", 1.0))),
            Some("code".to_string())
        );
        assert_eq!(
            field_of(validate_new_billing_code(&new_code(&"x".repeat(65), 1.0))),
            Some("code".to_string())
        );
        assert_eq!(
            field_of(validate_new_billing_code(&new_code("meal/1", -1.0))),
            Some("amount".to_string())
        );
    }

    #[test]
    fn test_discount_window_and_percent() {
        let start = NaiveDate::from_ymd_opt(2026, 6, 1);
        let end = NaiveDate::from_ymd_opt(2026, 1, 1);
        let mut discount = NewDiscount {
            group_id: 1,
            billing_id: 2,
            percent: 10.0,
            start_date: start,
            end_date: end,
        };
        assert_eq!(
            field_of(validate_new_discount(&discount)),
            Some("end_date".to_string())
        );

        discount.end_date = None;
        assert!(validate_new_discount(&discount).is_ok());

        discount.percent = 0.0;
        assert_eq!(
            field_of(validate_new_discount(&discount)),
            Some("percent".to_string())
        );
        discount.percent = 100.5;
        assert!(validate_new_discount(&discount).is_err());
    }

    #[test]
    fn test_payment_must_be_positive() {
        let mut payment = NewPayment {
            student_id: 1,
            invoice_id: None,
            amount: 0.0,
            method: None,
        };
        assert!(validate_new_payment(&payment).is_err());
        payment.amount = f64::NAN;
        assert!(validate_new_payment(&payment).is_err());
        payment.amount = 250.0;
        assert!(validate_new_payment(&payment).is_ok());
        payment.amount = MAX_AMOUNT + 1.0;
        assert!(validate_new_payment(&payment).is_err());
    }

    #[test]
    fn test_invoice_month_range() {
        let mut invoice = NewInvoice {
            student_id: 1,
            billing_id: 2,
            year: 2026,
            month: 13,
            required_amount: 100.0,
        };
        assert_eq!(
            field_of(validate_new_invoice(&invoice)),
            Some("month".to_string())
        );
        invoice.month = 12;
        assert!(validate_new_invoice(&invoice).is_ok());
    }

    #[test]
    fn test_user_rules() {
        let mut user = NewUser {
            name: "Madina Serik".to_string(),
            email: "madina@school.kz".to_string(),
            role: "teacher".to_string(),
            phone: None,
            password: "longenough".to_string(),
        };
        assert!(validate_new_user(&user).is_ok());

        user.email = "madina".to_string();
        assert_eq!(
            field_of(validate_new_user(&user)),
            Some("email".to_string())
        );

        user.email = "madina@school.kz".to_string();
        user.password = "short".to_string();
        assert_eq!(
            field_of(validate_new_user(&user)),
            Some("password".to_string())
        );

        let patch = UserPatch {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(validate_user_patch(&patch).is_err());
    }

    #[test]
    fn test_timetable_file_rules() {
        assert!(validate_timetable_file("week1.XLSX", 1024).is_ok());
        assert!(validate_timetable_file("week1.xlsx", 0).is_err());
        assert!(validate_timetable_file("week1.docx", 10).is_err());
        assert!(validate_timetable_file("noext", 10).is_err());
        assert!(validate_timetable_file("big.pdf", MAX_TIMETABLE_BYTES + 1).is_err());
    }

    #[test]
    fn test_credentials_required() {
        let creds = Credentials {
            username: "admin".to_string(),
            password: String::new(),
        };
        assert!(validate_credentials(&creds).is_err());
    }

    #[test]
    fn test_parse_optional_date() {
        assert_eq!(parse_optional_date("start_date", None).ok(), Some(None));
        assert_eq!(parse_optional_date("start_date", Some("  ")).ok(), Some(None));
        assert_eq!(
            parse_optional_date("start_date", Some("2026-09-01")).ok(),
            Some(NaiveDate::from_ymd_opt(2026, 9, 1))
        );
        assert!(matches!(
            parse_optional_date("end_date", Some("01.09.2026")),
            Err(Error::Validation { ref field, .. }) if field == "end_date"
        ));
    }
}
