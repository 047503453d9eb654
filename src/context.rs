//! Application context.
//!
//! [`AppContext`] replaces process-wide globals: it is built once at start-up, passed to
//! every screen, and reset on logout. It owns the backend client, the auth gate, the
//! snapshot database and the configured billing rules.

use crate::{
    api::{ApiClient, DormStudentPages, HttpTransport, StudentFilter, StudentPages, Transport},
    config::{AppConfig, PagingConfig},
    core::{
        billing::TuitionPolicy,
        paging::{LoadOutcome, PagedList},
        session::{AuthGate, GateDecision},
        snapshot::{self, SnapshotKey},
    },
    errors::Result,
    models::{BillingCode, Credentials, DormStudent, Group, Student, User},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{info, warn};

/// Student list driven by the paginated controller
pub type StudentRoster = PagedList<Student, StudentPages>;

/// Dormitory list driven by the paginated controller
pub type DormRoster = PagedList<DormStudent, DormStudentPages>;

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// The signed-in user
    pub user: User,
    /// Path the user was redirected away from, if any
    pub return_to: Option<String>,
}

/// Data needed by the billing overview, fetched concurrently
#[derive(Debug, Clone, PartialEq)]
pub struct BillingOverview {
    /// All billing codes
    pub billing_codes: Vec<BillingCode>,
    /// All class pairs
    pub groups: Vec<Group>,
    /// Number of students reported by the first listing page
    pub student_total: Option<u64>,
}

/// Shared state for the whole application
#[derive(Debug)]
pub struct AppContext {
    /// Backend client
    pub api: ApiClient,
    /// Session gate
    pub auth: AuthGate,
    /// Snapshot database
    pub db: DatabaseConnection,
    /// Tuition amounts by class
    pub tuition: TuitionPolicy,
    /// Page sizes
    pub paging: PagingConfig,
}

impl AppContext {
    /// Builds the context with the HTTP transport described by `config`.
    pub fn init(config: &AppConfig, db: DatabaseConnection) -> Result<Self> {
        let transport = HttpTransport::new(&config.api)?;
        info!(base_url = %config.api.base_url, "Backend client ready");
        Ok(Self::with_transport(config, Arc::new(transport), db))
    }

    /// Builds the context over an arbitrary transport.
    #[must_use]
    pub fn with_transport(
        config: &AppConfig,
        transport: Arc<dyn Transport>,
        db: DatabaseConnection,
    ) -> Self {
        Self {
            api: ApiClient::new(transport),
            auth: AuthGate::new(config.auth.expiry_policy(), config.auth.login_path.clone()),
            db,
            tuition: config.tuition.policy(),
            paging: config.paging,
        }
    }

    /// Gate check before showing `path`.
    pub async fn ensure_authenticated(&self, path: &str) -> GateDecision {
        self.auth.check(&self.api, path).await
    }

    /// Logs in, caches the user snapshot and returns the pending return path.
    ///
    /// The gate only opens once the snapshot is stored.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        let user = self.api.login(credentials).await?;
        snapshot::save(&self.db, SnapshotKey::User, &user).await?;
        let return_to = self.auth.record_login();
        info!(user_id = user.id, "Logged in");
        Ok(LoginOutcome { user, return_to })
    }

    /// Revokes the session and clears every piece of per-session state.
    ///
    /// Local state is cleared even when the revoke request fails.
    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self.api.revoke_session().await {
            warn!(error = %e, "Failed to revoke session, clearing local state anyway");
        }
        self.auth.clear();
        snapshot::clear_all(&self.db).await?;
        info!("Logged out");
        Ok(())
    }

    /// The signed-in user as last stored.
    pub async fn current_user(&self) -> Result<Option<User>> {
        snapshot::load(&self.db, SnapshotKey::User).await
    }

    /// New student list for `filter`; nothing is fetched until it is refreshed.
    #[must_use]
    pub fn student_roster(&self, filter: StudentFilter) -> StudentRoster {
        PagedList::new(StudentPages::new(
            self.api.clone(),
            filter,
            self.paging.per_page,
        ))
    }

    /// New dormitory list; nothing is fetched until it is refreshed.
    #[must_use]
    pub fn dorm_roster(&self) -> DormRoster {
        PagedList::new(DormStudentPages::new(self.api.clone(), self.paging.per_page))
    }

    /// Fetches class pairs and overwrites the snapshot.
    pub async fn refresh_classes(&self) -> Result<Vec<Group>> {
        let groups = self.api.list_groups().await?;
        snapshot::save(&self.db, SnapshotKey::Classes, &groups).await?;
        Ok(groups)
    }

    /// Class pairs as last stored.
    pub async fn cached_classes(&self) -> Result<Option<Vec<Group>>> {
        snapshot::load(&self.db, SnapshotKey::Classes).await
    }

    /// Class pairs from the snapshot, fetching them when no snapshot exists.
    pub async fn classes(&self) -> Result<Vec<Group>> {
        match self.cached_classes().await? {
            Some(groups) => Ok(groups),
            None => self.refresh_classes().await,
        }
    }

    /// Finds a class pair by name (case and whitespace insensitive).
    pub async fn find_class(&self, name: &str) -> Result<Option<Group>> {
        let wanted = crate::core::billing::normalize_class_pair(name);
        Ok(self
            .classes()
            .await?
            .into_iter()
            .find(|g| crate::core::billing::normalize_class_pair(&g.name) == wanted))
    }

    /// Fetches teacher accounts and overwrites the snapshot.
    pub async fn refresh_teachers(&self) -> Result<Vec<User>> {
        let teachers = self.api.list_users(Some("teacher")).await?;
        snapshot::save(&self.db, SnapshotKey::Teachers, &teachers).await?;
        Ok(teachers)
    }

    /// Teacher accounts as last stored.
    pub async fn cached_teachers(&self) -> Result<Option<Vec<User>>> {
        snapshot::load(&self.db, SnapshotKey::Teachers).await
    }

    /// Loads billing codes, classes and the first student page concurrently.
    pub async fn billing_overview(&self) -> Result<BillingOverview> {
        let roster = self.student_roster(StudentFilter::default());
        let (billing_codes, groups, students) = tokio::join!(
            self.api.list_billing_codes(),
            self.refresh_classes(),
            roster.refresh(),
        );

        let student_total = match students? {
            LoadOutcome::Loaded { total, .. } => roster
                .snapshot()
                .meta
                .and_then(|m| m.total())
                .or(Some(total as u64)),
            LoadOutcome::Skipped | LoadOutcome::Superseded => None,
        };

        Ok(BillingOverview {
            billing_codes: billing_codes?,
            groups: groups?,
            student_total,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        errors::Error,
        test_utils::{MockTransport, setup_test_db},
    };
    use serde_json::json;

    async fn context(mock: &Arc<MockTransport>) -> Result<AppContext> {
        let db = setup_test_db().await?;
        Ok(AppContext::with_transport(
            &AppConfig::default(),
            Arc::clone(mock) as Arc<dyn Transport>,
            db,
        ))
    }

    fn user_json() -> serde_json::Value {
        json!({"id": 1, "name": "Admin", "email": "admin@school.kz", "role": "admin"})
    }

    #[tokio::test]
    async fn test_login_returns_to_requested_path() -> Result<()> {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(401, json!({"message": "expired"}));
        mock.push_json(200, json!({"data": user_json()}));
        let ctx = context(&mock).await?;

        let decision = ctx.ensure_authenticated("/students").await;
        assert!(matches!(decision, GateDecision::LoginRequired(_)));

        let outcome = ctx
            .login(&Credentials {
                username: "admin".to_string(),
                password: "secret-pass".to_string(),
            })
            .await?;
        assert_eq!(outcome.return_to.as_deref(), Some("/students"));
        assert_eq!(ctx.current_user().await?.unwrap().name, "Admin");

        // Cached: no further validation request.
        assert_eq!(ctx.ensure_authenticated("/billings").await, GateDecision::Allowed);
        assert_eq!(mock.request_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_snapshots_even_if_revoke_fails() -> Result<()> {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(200, json!({"data": user_json()}));
        mock.push_json(500, json!({"message": "down"}));
        let ctx = context(&mock).await?;

        ctx.login(&Credentials {
            username: "admin".to_string(),
            password: "secret-pass".to_string(),
        })
        .await?;
        assert!(ctx.auth.is_cached());

        ctx.logout().await?;
        assert!(!ctx.auth.is_cached());
        assert!(ctx.current_user().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_classes_prefers_snapshot() -> Result<()> {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(200, json!({"data": [{"id": 1, "name": "4-A"}]}));
        let ctx = context(&mock).await?;

        assert_eq!(ctx.classes().await?.len(), 1);
        assert_eq!(ctx.classes().await?.len(), 1);
        assert_eq!(mock.request_count(), 1);

        let found = ctx.find_class(" 4 - a ").await?;
        assert_eq!(found.map(|g| g.id), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_login_keeps_gate_closed() -> Result<()> {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(422, json!({"message": "invalid credentials"}));
        let ctx = context(&mock).await?;

        let result = ctx
            .login(&Credentials {
                username: "admin".to_string(),
                password: "wrong-pass".to_string(),
            })
            .await;
        assert!(matches!(result, Err(Error::Api { status: 422, .. })));
        assert!(!ctx.auth.is_cached());
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_failure_keeps_return_path() -> Result<()> {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(401, json!({"message": "expired"}));
        mock.push_json(200, json!({"data": user_json()}));
        // No tables, so saving the user snapshot fails.
        let db = sea_orm::Database::connect("sqlite::memory:").await?;
        let ctx = AppContext::with_transport(
            &AppConfig::default(),
            Arc::clone(&mock) as Arc<dyn Transport>,
            db,
        );

        ctx.ensure_authenticated("/students").await;
        let result = ctx
            .login(&Credentials {
                username: "admin".to_string(),
                password: "secret-pass".to_string(),
            })
            .await;
        assert!(matches!(result, Err(Error::Database(_))));
        assert!(!ctx.auth.is_cached());
        assert_eq!(ctx.auth.record_login().as_deref(), Some("/students"));
        Ok(())
    }
}
