//! Backend records and request bodies.
//!
//! These types are the single typed schema for every endpoint the client talks to. Field
//! names follow the backend's JSON; optional collections default to empty so a summary
//! listing and a full detail fetch share one type.

use crate::core::paging::Keyed;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reference to a student's class pair, embedded in student records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    /// Group identifier
    pub id: i64,
    /// Class pair name such as `4-A`
    pub name: String,
}

/// A class pair (grade and section)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group identifier
    pub id: i64,
    /// Class pair name such as `4-A`
    pub name: String,
    /// Homeroom teacher, if one is assigned
    #[serde(default)]
    pub teacher_id: Option<i64>,
    /// Number of enrolled students as reported by the backend
    #[serde(default)]
    pub student_count: Option<u32>,
}

/// A reusable fee definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingCode {
    /// Billing code identifier
    pub id: i64,
    /// Code string, e.g. `tuition/2600`
    pub code: String,
    /// Category such as `tuition`, `meal`, `transport`
    pub category: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Amount charged per month
    pub amount: f64,
    /// Inactive codes stay visible but cannot be newly assigned
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Per-student, per-month, per-billing-code record of money owed and paid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice identifier
    pub id: i64,
    /// Owning student
    pub student_id: i64,
    /// Billing code the invoice was raised for
    pub billing_id: i64,
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
    /// Amount owed
    pub required_amount: f64,
    /// Amount already paid
    pub paid_amount: f64,
    /// Amount still outstanding
    pub remaining_amount: f64,
}

/// Money received from or on behalf of a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment identifier
    pub id: i64,
    /// Paying student
    pub student_id: i64,
    /// Invoice the payment settles, if targeted
    #[serde(default)]
    pub invoice_id: Option<i64>,
    /// Amount paid
    pub amount: f64,
    /// Date the payment was recorded
    pub paid_at: NaiveDate,
    /// Payment method (cash, transfer, wallet)
    #[serde(default)]
    pub method: Option<String>,
}

/// Time-bounded percentage reduction for a group/billing pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    /// Discount identifier
    pub id: i64,
    /// Student group the discount applies to
    pub group_id: i64,
    /// Billing code the discount applies to
    pub billing_id: i64,
    /// Percentage, 0-100
    pub percent: f64,
    /// First day the discount applies
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Last day the discount applies
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// A student record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Student identifier
    pub id: i64,
    /// Full name
    pub name: String,
    /// Class pair the student belongs to
    #[serde(default)]
    pub group: Option<GroupRef>,
    /// Billing codes currently assigned
    #[serde(default)]
    pub billings: Vec<BillingCode>,
    /// Invoices raised for the student
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    /// Payments recorded for the student
    #[serde(default)]
    pub payments: Vec<Payment>,
    /// Discounts applicable to the student's group
    #[serde(default)]
    pub discounts: Vec<Discount>,
    /// Prepaid wallet balance
    #[serde(default)]
    pub wallet_balance: f64,
}

impl Student {
    /// Class pair name, if the student is placed in a group.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.group.as_ref().map(|g| g.name.as_str())
    }

    /// Whether `billing_id` is currently assigned to the student.
    #[must_use]
    pub fn has_billing(&self, billing_id: i64) -> bool {
        self.billings.iter().any(|b| b.id == billing_id)
    }
}

/// A student living in the dormitory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DormStudent {
    /// Student identifier
    pub id: i64,
    /// Full name
    pub name: String,
    /// Room label
    #[serde(default)]
    pub room: Option<String>,
    /// Class pair the student belongs to
    #[serde(default)]
    pub group: Option<GroupRef>,
}

/// Staff account (teachers and administrators)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login e-mail
    pub email: String,
    /// Role, e.g. `teacher` or `admin`
    pub role: String,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
}

/// Acknowledgement of an uploaded timetable file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableUpload {
    /// Upload identifier
    pub id: i64,
    /// Stored file name
    pub file_name: String,
    /// Group the timetable belongs to, if scoped
    #[serde(default)]
    pub group_id: Option<i64>,
}

/// Login form
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    /// Login name or e-mail
    pub username: String,
    /// Password
    pub password: String,
}

/// Body for creating a billing code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBillingCode {
    /// Code string
    pub code: String,
    /// Category
    pub category: String,
    /// Description
    pub description: Option<String>,
    /// Amount
    pub amount: f64,
    /// Active flag
    pub active: bool,
}

/// Partial update of a billing code; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BillingCodePatch {
    /// New description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// New active flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Body for creating a discount
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDiscount {
    /// Target group
    pub group_id: i64,
    /// Target billing code
    pub billing_id: i64,
    /// Percentage
    pub percent: f64,
    /// Window start
    pub start_date: Option<NaiveDate>,
    /// Window end
    pub end_date: Option<NaiveDate>,
}

/// Partial update of a discount
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscountPatch {
    /// New percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    /// New window start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// New window end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// Body for raising an invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewInvoice {
    /// Student
    pub student_id: i64,
    /// Billing code
    pub billing_id: i64,
    /// Year
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
    /// Amount owed
    pub required_amount: f64,
}

/// Partial update of an invoice
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvoicePatch {
    /// New amount owed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_amount: Option<f64>,
    /// New amount paid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<f64>,
}

/// Body for recording a payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPayment {
    /// Paying student
    pub student_id: i64,
    /// Invoice settled, if any
    pub invoice_id: Option<i64>,
    /// Amount
    pub amount: f64,
    /// Payment method
    pub method: Option<String>,
}

/// Body for creating a staff account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Login e-mail
    pub email: String,
    /// Role
    pub role: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Initial password
    pub password: String,
}

/// Partial update of a staff account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserPatch {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New e-mail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New phone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

const fn default_true() -> bool {
    true
}

impl Keyed for Student {
    type Key = i64;
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for DormStudent {
    type Key = i64;
    fn key(&self) -> i64 {
        self.id
    }
}
