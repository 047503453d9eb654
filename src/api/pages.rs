//! Page sources backed by the REST client.

use super::{
    cancel::CancelToken,
    client::{ApiClient, StudentFilter},
    schema::Page,
};
use crate::{
    core::paging::PageSource,
    errors::Result,
    models::{DormStudent, Student},
};
use async_trait::async_trait;

/// Student listing with a fixed filter
#[derive(Debug, Clone)]
pub struct StudentPages {
    client: ApiClient,
    filter: StudentFilter,
    per_page: u32,
}

impl StudentPages {
    /// Source for `filter`, `per_page` students at a time.
    #[must_use]
    pub const fn new(client: ApiClient, filter: StudentFilter, per_page: u32) -> Self {
        Self {
            client,
            filter,
            per_page,
        }
    }
}

#[async_trait]
impl PageSource<Student> for StudentPages {
    async fn fetch_page(&self, page: u32, cancel: &CancelToken) -> Result<Page<Student>> {
        self.client
            .list_students(&self.filter, page, self.per_page, cancel)
            .await
    }
}

/// Dormitory listing
#[derive(Debug, Clone)]
pub struct DormStudentPages {
    client: ApiClient,
    per_page: u32,
}

impl DormStudentPages {
    /// Source returning `per_page` dormitory students at a time.
    #[must_use]
    pub const fn new(client: ApiClient, per_page: u32) -> Self {
        Self { client, per_page }
    }
}

#[async_trait]
impl PageSource<DormStudent> for DormStudentPages {
    async fn fetch_page(&self, page: u32, cancel: &CancelToken) -> Result<Page<DormStudent>> {
        self.client
            .list_dorm_students(page, self.per_page, cancel)
            .await
    }
}
