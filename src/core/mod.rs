//! Core business logic - framework-agnostic billing rules, invoice and discount
//! derivation, paginated list state, the auth gate and persisted snapshots.

/// Tuition and billing-code rules
pub mod billing;
/// Discount windows and aggregation
pub mod discount;
/// Invoice status derivation
pub mod invoice;
/// Paginated list-fetch/merge
pub mod paging;
/// Auth gate and expiry policy
pub mod session;
/// Persisted snapshots
pub mod snapshot;
/// Acknowledge-then-apply student mutations
pub mod student;
/// Form validation
pub mod validation;
