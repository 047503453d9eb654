//! REST backend access.
//!
//! The [`transport`] seam turns an [`ApiRequest`] into an [`ApiResponse`]; [`client`] layers
//! typed endpoints, status handling and the validating decode boundary on top of it.

/// Cancellation tokens honoured by every request
pub mod cancel;
/// Typed endpoint methods
pub mod client;
/// Page sources feeding the paginated list controller
pub mod pages;
/// Response envelopes and pagination metadata
pub mod schema;
/// HTTP transport abstraction and the `reqwest` implementation
pub mod transport;

pub use cancel::CancelToken;
pub use client::{ApiClient, InvoiceFilter, StudentFilter};
pub use pages::{DormStudentPages, StudentPages};
pub use schema::{Page, PageInfo};
pub use transport::{ApiRequest, ApiResponse, Body, FilePart, HttpTransport, Method, Transport};
