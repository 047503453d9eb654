//! Auth gate.
//!
//! Screens ask the gate before rendering. A positive validation is cached for the
//! [`ExpiryPolicy`] TTL so route changes do not hit the validation endpoint every time. A
//! failed check produces a [`LoginRedirect`] that remembers the requested path, which the
//! gate hands back after the next successful login.

use crate::{api::ApiClient, errors::Result};
use async_trait::async_trait;
use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default lifetime of a positive validation
pub const DEFAULT_AUTH_TTL: Duration = Duration::from_secs(5 * 60);

/// How long a positive validation stays trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    ttl: Duration,
}

impl ExpiryPolicy {
    /// Trust validations for `ttl`.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// The configured lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether a validation made at `checked_at` is still trusted at `now`.
    #[must_use]
    pub fn is_fresh(&self, checked_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(checked_at) < self.ttl
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_AUTH_TTL)
    }
}

/// Checks whether the current session is valid
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// `Ok(true)` for a valid session, `Ok(false)` for an invalid one.
    async fn validate(&self) -> Result<bool>;
}

#[async_trait]
impl SessionValidator for ApiClient {
    async fn validate(&self) -> Result<bool> {
        self.validate_session().await
    }
}

/// Where to send the user to log in, and where to return afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    /// Login screen path
    pub login_path: String,
    /// Path the user originally asked for
    pub return_to: String,
}

impl LoginRedirect {
    /// `login_path?next=<return_to>` with the return path percent-encoded.
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}?next={}", self.login_path, encode_path(&self.return_to))
    }
}

fn encode_path(path: &str) -> String {
    path.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                char::from(b).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

/// Outcome of a gate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The session is valid
    Allowed,
    /// The user must log in first
    LoginRequired(LoginRedirect),
}

#[derive(Debug, Default)]
struct GateState {
    validated_at: Option<Instant>,
    pending_return: Option<String>,
}

/// Session gate owned by the application context
#[derive(Debug)]
pub struct AuthGate {
    policy: ExpiryPolicy,
    login_path: String,
    state: Mutex<GateState>,
}

impl AuthGate {
    /// Creates a gate with nothing cached.
    #[must_use]
    pub fn new(policy: ExpiryPolicy, login_path: impl Into<String>) -> Self {
        Self {
            policy,
            login_path: login_path.into(),
            state: Mutex::new(GateState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a cached positive validation is still fresh.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.lock()
            .validated_at
            .is_some_and(|at| self.policy.is_fresh(at, Instant::now()))
    }

    /// Checks the session before showing `requested_path`.
    ///
    /// Uses the cached result while fresh; otherwise asks `validator`. Validation errors
    /// are treated like an invalid session.
    pub async fn check<V>(&self, validator: &V, requested_path: &str) -> GateDecision
    where
        V: SessionValidator + ?Sized,
    {
        if self.is_cached() {
            debug!(path = requested_path, "Session valid (cached)");
            return GateDecision::Allowed;
        }

        let valid = match validator.validate().await {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "Session validation failed");
                false
            }
        };

        let mut state = self.lock();
        if valid {
            state.validated_at = Some(Instant::now());
            GateDecision::Allowed
        } else {
            state.validated_at = None;
            state.pending_return = Some(requested_path.to_string());
            info!(path = requested_path, "Login required");
            GateDecision::LoginRequired(LoginRedirect {
                login_path: self.login_path.clone(),
                return_to: requested_path.to_string(),
            })
        }
    }

    /// Marks the session valid after a login and returns the path to go back to, if any.
    pub fn record_login(&self) -> Option<String> {
        let mut state = self.lock();
        state.validated_at = Some(Instant::now());
        state.pending_return.take()
    }

    /// Drops the cached validation after the backend rejected the session mid-request,
    /// remembering `return_to` for the next login.
    pub fn expire(&self, return_to: &str) {
        let mut state = self.lock();
        state.validated_at = None;
        state.pending_return = Some(return_to.to_string());
        info!(path = return_to, "Session expired");
    }

    /// Forgets the cached validation and any pending return path.
    pub fn clear(&self) {
        *self.lock() = GateState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingValidator {
        answer: Option<bool>,
        calls: AtomicUsize,
    }

    impl CountingValidator {
        const fn new(answer: Option<bool>) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SessionValidator for CountingValidator {
        async fn validate(&self) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.ok_or_else(|| Error::Http {
                message: "offline".to_string(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_positive_result_cached_for_ttl() {
        let gate = AuthGate::new(ExpiryPolicy::default(), "/login");
        let validator = CountingValidator::new(Some(true));

        assert_eq!(gate.check(&validator, "/students").await, GateDecision::Allowed);
        assert_eq!(gate.check(&validator, "/billings").await, GateDecision::Allowed);
        assert_eq!(validator.calls(), 1);

        tokio::time::advance(Duration::from_secs(299)).await;
        gate.check(&validator, "/students").await;
        assert_eq!(validator.calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        gate.check(&validator, "/students").await;
        assert_eq!(validator.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_redirects_with_requested_path() {
        let gate = AuthGate::new(ExpiryPolicy::default(), "/login");
        let validator = CountingValidator::new(Some(false));

        let decision = gate.check(&validator, "/students/42").await;
        let GateDecision::LoginRequired(redirect) = decision else {
            panic!("expected redirect");
        };
        assert_eq!(redirect.return_to, "/students/42");
        assert_eq!(redirect.location(), "/login?next=%2Fstudents%2F42");

        assert_eq!(gate.record_login().as_deref(), Some("/students/42"));
        assert!(gate.is_cached());
        assert_eq!(gate.record_login(), None);
    }

    #[tokio::test]
    async fn test_validation_error_is_not_cached() {
        let gate = AuthGate::new(ExpiryPolicy::default(), "/login");
        let validator = CountingValidator::new(None);

        assert!(matches!(
            gate.check(&validator, "/").await,
            GateDecision::LoginRequired(_)
        ));
        assert!(!gate.is_cached());
    }

    #[tokio::test]
    async fn test_clear_forgets_session() {
        let gate = AuthGate::new(ExpiryPolicy::new(Duration::from_secs(60)), "/login");
        let validator = CountingValidator::new(Some(true));
        gate.check(&validator, "/").await;
        assert!(gate.is_cached());

        gate.clear();
        assert!(!gate.is_cached());
        gate.check(&validator, "/").await;
        assert_eq!(validator.calls(), 2);
    }

    #[tokio::test]
    async fn test_expire_remembers_return_path() {
        let gate = AuthGate::new(ExpiryPolicy::default(), "/login");
        let validator = CountingValidator::new(Some(true));
        gate.check(&validator, "/billing/toggle").await;
        assert!(gate.is_cached());

        gate.expire("/billing/toggle");
        assert!(!gate.is_cached());
        assert_eq!(gate.record_login().as_deref(), Some("/billing/toggle"));
    }
}
