//! Shared test utilities for `SchoolDesk`.
//!
//! This module provides an in-memory snapshot database, a scripted backend transport, and
//! builders for records with sensible defaults.

use crate::{
    api::{ApiClient, ApiRequest, ApiResponse, Transport},
    errors::{Error, Result},
    models::{BillingCode, Discount, GroupRef, Invoice, Student},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};
use tracing_subscriber::EnvFilter;

/// Routes tracing output to the test harness; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Transport that answers from a queue of scripted responses and records every request.
///
/// Running out of scripted responses is reported as a transport failure.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    /// Creates a transport with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a JSON response.
    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push(ApiResponse {
            status,
            body: body.to_string(),
        });
    }

    /// Queues a response with an empty body.
    pub fn push_empty(&self, status: u16) {
        self.push(ApiResponse {
            status,
            body: String::new(),
        });
    }

    fn push(&self, response: ApiResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests sent so far.
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let path = request.path.clone();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| Error::Http {
                message: format!("no scripted response for {path}"),
            })
    }
}

/// Client over a shared mock transport.
pub fn mock_client(transport: &Arc<MockTransport>) -> ApiClient {
    init_test_tracing();
    ApiClient::new(Arc::clone(transport) as Arc<dyn Transport>)
}

/// A student in class `class` (group id 1) with no billings, invoices or payments.
pub fn student_in(id: i64, name: &str, class: &str) -> Student {
    Student {
        id,
        name: name.to_string(),
        group: Some(GroupRef {
            id: 1,
            name: class.to_string(),
        }),
        billings: Vec::new(),
        invoices: Vec::new(),
        payments: Vec::new(),
        discounts: Vec::new(),
        wallet_balance: 0.0,
    }
}

/// An active billing code; the category is the code's prefix before `/`.
pub fn billing_code(id: i64, code: &str, amount: f64) -> BillingCode {
    let category = crate::core::billing::category_of(code).to_string();
    BillingCode {
        id,
        code: code.to_string(),
        category,
        description: None,
        amount,
        active: true,
    }
}

/// An invoice for student 1; the remaining amount is `required - paid`.
pub fn invoice(
    id: i64,
    billing_id: i64,
    year: i32,
    month: u32,
    required: f64,
    paid: f64,
) -> Invoice {
    Invoice {
        id,
        student_id: 1,
        billing_id,
        year,
        month,
        required_amount: required,
        paid_amount: paid,
        remaining_amount: required - paid,
    }
}

/// A discount for `group_id` on `billing_id`.
pub fn discount(
    id: i64,
    group_id: i64,
    billing_id: i64,
    percent: f64,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Discount {
    Discount {
        id,
        group_id,
        billing_id,
        percent,
        start_date,
        end_date,
    }
}
