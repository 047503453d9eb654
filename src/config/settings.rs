//! Application settings loaded from config.toml
//!
//! Every section is optional; missing values fall back to defaults so a bare
//! `[api] base_url = "..."` file is enough to start. `SCHOOL_API_URL` overrides the
//! configured base URL.

use crate::core::{
    billing::TuitionPolicy,
    session::{DEFAULT_AUTH_TTL, ExpiryPolicy},
};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{path::Path, time::Duration};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend connection
    pub api: ApiConfig,
    /// List page sizes
    pub paging: PagingConfig,
    /// Auth gate settings
    pub auth: AuthConfig,
    /// Tuition amounts by class
    pub tuition: TuitionConfig,
}

/// `[api]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST backend, e.g. `https://school.example/api`
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

/// `[paging]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Records requested per page
    pub per_page: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self { per_page: 10 }
    }
}

/// `[auth]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// How long a positive session validation is trusted
    pub cache_ttl_secs: u64,
    /// Where users are sent to log in
    pub login_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_AUTH_TTL.as_secs(),
            login_path: "/login".to_string(),
        }
    }
}

impl AuthConfig {
    /// Expiry policy for the auth gate.
    #[must_use]
    pub const fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy::new(Duration::from_secs(self.cache_ttl_secs))
    }
}

/// `[tuition]` section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TuitionConfig {
    /// Class pairs billed the special amount
    pub special_classes: Vec<String>,
    /// Monthly tuition for special classes
    pub special_amount: f64,
    /// Monthly tuition for every other class
    pub default_amount: f64,
}

impl Default for TuitionConfig {
    fn default() -> Self {
        Self {
            special_classes: vec!["11-A".to_string(), "11-B".to_string()],
            special_amount: 3000.0,
            default_amount: 2600.0,
        }
    }
}

impl TuitionConfig {
    /// Tuition policy built from this section.
    #[must_use]
    pub fn policy(&self) -> TuitionPolicy {
        TuitionPolicy::new(&self.special_classes, self.special_amount, self.default_amount)
    }
}

impl AppConfig {
    fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::Config {
                message: "api.base_url must not be empty".to_string(),
            });
        }
        if self.paging.per_page == 0 {
            return Err(Error::Config {
                message: "paging.per_page must be at least 1".to_string(),
            });
        }
        if self.tuition.special_amount < 0.0 || self.tuition.default_amount < 0.0 {
            return Err(Error::Config {
                message: "tuition amounts must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Applies environment overrides (`SCHOOL_API_URL`).
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("SCHOOL_API_URL") {
            self.api.base_url = url;
        }
        self
    }
}

/// Parses and validates configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value is out of range
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `CONFIG_PATH` (default `./config.toml`) and applies
/// environment overrides. A missing default file yields the built-in defaults.
pub fn load_app_configuration() -> Result<AppConfig> {
    let config = match std::env::var("CONFIG_PATH") {
        Ok(path) => load_config(path)?,
        Err(_) if Path::new("config.toml").exists() => load_config("config.toml")?,
        Err(_) => {
            tracing::warn!("No config.toml found, using defaults");
            AppConfig::default()
        }
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [api]
            base_url = "https://school.example/api"
            timeout_secs = 10

            [paging]
            per_page = 25

            [auth]
            cache_ttl_secs = 120
            login_path = "/signin"

            [tuition]
            special_classes = ["12-A", "12-B"]
            special_amount = 3500
            default_amount = 2800
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.paging.per_page, 25);
        assert_eq!(config.auth.expiry_policy().ttl(), Duration::from_secs(120));
        assert_eq!(config.auth.login_path, "/signin");

        let policy = config.tuition.policy();
        assert_eq!(policy.allowed_tuition_amount("12-b"), 3500.0);
        assert_eq!(policy.allowed_tuition_amount("4-A"), 2800.0);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = parse_config("[api]\nbase_url = \"http://x\"\n").unwrap();
        assert_eq!(config.paging.per_page, 10);
        assert_eq!(config.auth.cache_ttl_secs, 300);
        assert_eq!(config.tuition.default_amount, 2600.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            parse_config("[paging]\nper_page = 0\n"),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            parse_config("[api]\nbase_url = \"\"\n"),
            Err(Error::Config { .. })
        ));
        assert!(parse_config("[api\n").is_err());
    }
}
