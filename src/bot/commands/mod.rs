//! Discord command implementations organized by screen.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Session commands
pub mod auth;

/// Billing-code commands
pub mod billing;

/// Discount commands
pub mod discounts;

/// General utility commands
pub mod general;

/// Invoice and payment commands
pub mod invoices;

/// Class, teacher and timetable commands
pub mod staff;

/// Student roster commands
pub mod students;

// Export commands
pub use auth::*;
pub use billing::*;
pub use discounts::*;
pub use general::*;
pub use invoices::*;
pub use staff::*;
pub use students::*;
