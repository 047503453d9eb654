//! Typed backend endpoints.
//!
//! [`ApiClient`] is cheap to clone and shared across the application. Create and update
//! methods run the matching form validation first, so invalid input never reaches the
//! network. Every request can be cancelled through a [`CancelToken`].

use super::{
    cancel::CancelToken,
    schema::{
        DataEnvelope, ListEnvelope, Page, decode_numbered_page, decode_range_page,
        decode_records, error_message, parse_body,
    },
    transport::{ApiRequest, ApiResponse, FilePart, Transport},
};
use crate::{
    core::validation,
    errors::{Error, Result},
    models::{
        BillingCode, BillingCodePatch, Credentials, Discount, DiscountPatch, DormStudent, Group,
        Invoice, InvoicePatch, NewBillingCode, NewDiscount, NewInvoice, NewPayment, NewUser,
        Payment, Student, TimetableUpload, User, UserPatch,
    },
};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Filters for the student listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    /// Restrict to one class pair
    pub group_id: Option<i64>,
    /// Name search
    pub search: Option<String>,
}

/// Filters for the invoice listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    /// Restrict to one student
    pub student_id: Option<i64>,
    /// Restrict to one year
    pub year: Option<i32>,
    /// Restrict to one month
    pub month: Option<u32>,
}

/// Client for the school-management REST backend
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(Into::into)
}

impl ApiClient {
    /// Wraps a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Sends a request, racing it against `cancel`, and maps non-2xx statuses to errors.
    pub async fn send(&self, request: ApiRequest, cancel: &CancelToken) -> Result<ApiResponse> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let response = tokio::select! {
            () = cancel.cancelled() => return Err(Error::Cancelled),
            response = self.transport.send(request) => response?,
        };

        match response.status {
            _ if response.is_success() => Ok(response),
            401 => Err(Error::Unauthorized),
            status => {
                let message = error_message(&response.body);
                warn!(status, %message, "Backend rejected request");
                Err(Error::Api { status, message })
            }
        }
    }

    async fn fetch_data<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(request, &CancelToken::new()).await?;
        let envelope: DataEnvelope<T> = parse_body(&response.body)?;
        Ok(envelope.data)
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        kind: &str,
    ) -> Result<Vec<T>> {
        let response = self.send(request, &CancelToken::new()).await?;
        let envelope: ListEnvelope = parse_body(&response.body)?;
        let (items, rejected) = decode_records(envelope.data, kind);
        if rejected > 0 {
            warn!(kind, rejected, "Dropped records from listing");
        }
        Ok(items)
    }

    async fn execute(&self, request: ApiRequest) -> Result<()> {
        self.send(request, &CancelToken::new()).await.map(|_| ())
    }

    // --- Session ---

    /// Logs in; the backend answers with the session cookie and the user record.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        validation::validate_credentials(credentials)?;
        self.fetch_data(ApiRequest::post("/auth/login", to_json(credentials)?))
            .await
    }

    /// Asks the backend whether the current session cookie is valid.
    ///
    /// `Ok(false)` for an invalid session; transport failures are errors.
    #[instrument(skip(self))]
    pub async fn validate_session(&self) -> Result<bool> {
        match self.execute(ApiRequest::get("/auth/validate")).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_unauthorized() || matches!(e, Error::Api { status: 403, .. }) => {
                debug!("Session is not valid");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Revokes the session cookie.
    #[instrument(skip(self))]
    pub async fn revoke_session(&self) -> Result<()> {
        self.execute(ApiRequest::post("/auth/revoke", serde_json::json!({})))
            .await
    }

    // --- Students ---

    /// Fetches one page of the student listing.
    #[instrument(skip(self, cancel))]
    pub async fn list_students(
        &self,
        filter: &StudentFilter,
        page: u32,
        per_page: u32,
        cancel: &CancelToken,
    ) -> Result<Page<Student>> {
        let request = ApiRequest::get("/students")
            .with_query("page", page)
            .with_query("per_page", per_page)
            .with_optional_query("group_id", filter.group_id)
            .with_optional_query("search", filter.search.as_deref());
        let response = self.send(request, cancel).await?;
        decode_range_page(&response.body, "student")
    }

    /// Fetches one page of the dormitory listing.
    #[instrument(skip(self, cancel))]
    pub async fn list_dorm_students(
        &self,
        page: u32,
        per_page: u32,
        cancel: &CancelToken,
    ) -> Result<Page<DormStudent>> {
        let request = ApiRequest::get("/dorm-students")
            .with_query("page", page)
            .with_query("per_page", per_page);
        let response = self.send(request, cancel).await?;
        decode_numbered_page(&response.body, "dorm_student")
    }

    /// Fetches a student with billings, invoices, payments and discounts.
    #[instrument(skip(self))]
    pub async fn get_student(&self, id: i64) -> Result<Student> {
        match self.fetch_data(ApiRequest::get(format!("/students/{id}"))).await {
            Err(Error::Api { status: 404, .. }) => Err(Error::StudentNotFound { id }),
            other => other,
        }
    }

    /// Assigns a billing code; returns the assignment as acknowledged by the backend.
    #[instrument(skip(self))]
    pub async fn assign_billing(&self, student_id: i64, billing_id: i64) -> Result<BillingCode> {
        self.fetch_data(ApiRequest::post(
            format!("/students/{student_id}/billings"),
            serde_json::json!({ "billing_id": billing_id }),
        ))
        .await
    }

    /// Removes a billing code from a student.
    #[instrument(skip(self))]
    pub async fn unassign_billing(&self, student_id: i64, billing_id: i64) -> Result<()> {
        self.execute(ApiRequest::delete(format!(
            "/students/{student_id}/billings/{billing_id}"
        )))
        .await
    }

    // --- Billing codes ---

    /// Lists billing codes.
    pub async fn list_billing_codes(&self) -> Result<Vec<BillingCode>> {
        self.fetch_list(ApiRequest::get("/billings"), "billing_code")
            .await
    }

    /// Creates a billing code.
    #[instrument(skip(self))]
    pub async fn create_billing_code(&self, code: &NewBillingCode) -> Result<BillingCode> {
        validation::validate_new_billing_code(code)?;
        self.fetch_data(ApiRequest::post("/billings", to_json(code)?))
            .await
    }

    /// Updates a billing code.
    #[instrument(skip(self))]
    pub async fn update_billing_code(
        &self,
        id: i64,
        patch: &BillingCodePatch,
    ) -> Result<BillingCode> {
        validation::validate_billing_patch(patch)?;
        self.fetch_data(ApiRequest::patch(format!("/billings/{id}"), to_json(patch)?))
            .await
    }

    /// Deletes a billing code.
    #[instrument(skip(self))]
    pub async fn delete_billing_code(&self, id: i64) -> Result<()> {
        self.execute(ApiRequest::delete(format!("/billings/{id}")))
            .await
    }

    // --- Discounts ---

    /// Lists discounts, optionally for one group.
    pub async fn list_discounts(&self, group_id: Option<i64>) -> Result<Vec<Discount>> {
        self.fetch_list(
            ApiRequest::get("/discounts").with_optional_query("group_id", group_id),
            "discount",
        )
        .await
    }

    /// Creates a discount.
    #[instrument(skip(self))]
    pub async fn create_discount(&self, discount: &NewDiscount) -> Result<Discount> {
        validation::validate_new_discount(discount)?;
        self.fetch_data(ApiRequest::post("/discounts", to_json(discount)?))
            .await
    }

    /// Updates a discount.
    #[instrument(skip(self))]
    pub async fn update_discount(&self, id: i64, patch: &DiscountPatch) -> Result<Discount> {
        validation::validate_discount_patch(patch)?;
        self.fetch_data(ApiRequest::patch(format!("/discounts/{id}"), to_json(patch)?))
            .await
    }

    /// Deletes a discount.
    #[instrument(skip(self))]
    pub async fn delete_discount(&self, id: i64) -> Result<()> {
        self.execute(ApiRequest::delete(format!("/discounts/{id}")))
            .await
    }

    // --- Invoices and payments ---

    /// Lists invoices matching `filter`.
    pub async fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        let request = ApiRequest::get("/invoices")
            .with_optional_query("student_id", filter.student_id)
            .with_optional_query("year", filter.year)
            .with_optional_query("month", filter.month);
        self.fetch_list(request, "invoice").await
    }

    /// Raises an invoice.
    #[instrument(skip(self))]
    pub async fn create_invoice(&self, invoice: &NewInvoice) -> Result<Invoice> {
        validation::validate_new_invoice(invoice)?;
        self.fetch_data(ApiRequest::post("/invoices", to_json(invoice)?))
            .await
    }

    /// Updates an invoice's amounts.
    #[instrument(skip(self))]
    pub async fn update_invoice(&self, id: i64, patch: &InvoicePatch) -> Result<Invoice> {
        validation::validate_invoice_patch(patch)?;
        self.fetch_data(ApiRequest::patch(format!("/invoices/{id}"), to_json(patch)?))
            .await
    }

    /// Records a payment.
    #[instrument(skip(self))]
    pub async fn create_payment(&self, payment: &NewPayment) -> Result<Payment> {
        validation::validate_new_payment(payment)?;
        self.fetch_data(ApiRequest::post("/payments", to_json(payment)?))
            .await
    }

    // --- Groups and staff ---

    /// Lists class pairs.
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        self.fetch_list(ApiRequest::get("/groups"), "group").await
    }

    /// Lists staff accounts, optionally restricted to one role.
    pub async fn list_users(&self, role: Option<&str>) -> Result<Vec<User>> {
        self.fetch_list(
            ApiRequest::get("/users").with_optional_query("role", role),
            "user",
        )
        .await
    }

    /// Creates a staff account.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        validation::validate_new_user(user)?;
        self.fetch_data(ApiRequest::post("/users", to_json(user)?))
            .await
    }

    /// Updates a staff account.
    #[instrument(skip(self))]
    pub async fn update_user(&self, id: i64, patch: &UserPatch) -> Result<User> {
        validation::validate_user_patch(patch)?;
        self.fetch_data(ApiRequest::patch(format!("/users/{id}"), to_json(patch)?))
            .await
    }

    /// Deletes a staff account.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        self.execute(ApiRequest::delete(format!("/users/{id}")))
            .await
    }

    /// Uploads a timetable file, optionally scoped to a group.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_timetable(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        group_id: Option<i64>,
    ) -> Result<TimetableUpload> {
        validation::validate_timetable_file(file_name, bytes.len())?;
        let fields = group_id
            .map(|id| vec![("group_id".to_string(), id.to_string())])
            .unwrap_or_default();
        let file = FilePart {
            field: "file".to_string(),
            file_name: file_name.to_string(),
            bytes,
            fields,
        };
        self.fetch_data(ApiRequest::upload("/timetables", file))
            .await
    }
}
