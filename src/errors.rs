//! Unified error types for `SchoolDesk`.
//!
//! Every fallible operation in the crate returns [`Result`]. Validation errors are raised
//! before any request leaves the process; backend and transport failures are wrapped so the
//! presentation layer can render a single user-facing message.

use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Snapshot database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The request never produced an HTTP response (connection, timeout, TLS)
    #[error("Network error: {message}")]
    Http {
        /// Transport error description
        message: String,
    },

    /// The backend answered with a non-success status
    #[error("Server rejected the request ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body, if any
        message: String,
    },

    /// The session is missing, expired or revoked
    #[error("Not logged in or session expired")]
    Unauthorized,

    /// The response body did not match the expected schema
    #[error("Invalid response from server: {message}")]
    InvalidResponse {
        /// Deserialization failure description
        message: String,
    },

    /// Local form validation failed; nothing was sent
    #[error("{field}: {message}")]
    Validation {
        /// Name of the offending field
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// A tuition code does not carry the amount allowed for the student's class
    #[error(
        "Tuition code {code} does not match the allowed amount {allowed:.0} for class {class}"
    )]
    TuitionMismatch {
        /// The rejected billing code
        code: String,
        /// The student's class pair
        class: String,
        /// Amount allowed for that class
        allowed: f64,
    },

    /// Student lookup failed
    #[error("Student not found: {id}")]
    StudentNotFound {
        /// Student identifier
        id: i64,
    },

    /// The owning view was torn down before the request completed
    #[error("Request cancelled")]
    Cancelled,

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Formatting failure while building a reply
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Http {
            message: value.to_string(),
        }
    }
}

impl Error {
    /// Builds a [`Error::Validation`] for `field`.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Whether the failure means the user has to log in again.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Api { status: 401, .. })
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
