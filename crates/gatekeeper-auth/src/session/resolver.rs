//! Maps a request's session cookie to a validated session view.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::{debug, warn};

use gatekeeper_core::config::session::SessionConfig;
use gatekeeper_core::error::AppError;
use gatekeeper_core::redact::mask_token;
use gatekeeper_core::result::AppResult;
use gatekeeper_entity::session::{RequestMeta, ResolvedSession};

use super::cookie::session_token;
use super::store::SessionStore;
use crate::rbac::RbacPolicies;

/// Resolves session cookies against the session store.
///
/// Resolution fails closed: any store error or timeout yields `None`.
#[derive(Debug, Clone)]
pub struct SessionResolver {
    store: Arc<dyn SessionStore>,
    policies: RbacPolicies,
    config: SessionConfig,
}

impl SessionResolver {
    /// Creates a resolver with the default permission policies.
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self::with_policies(store, config, RbacPolicies::new())
    }

    /// Creates a resolver with custom permission policies.
    pub fn with_policies(
        store: Arc<dyn SessionStore>,
        config: SessionConfig,
        policies: RbacPolicies,
    ) -> Self {
        Self {
            store,
            policies,
            config,
        }
    }

    /// Resolve the session carried by the request cookies.
    pub async fn resolve(&self, jar: &CookieJar, meta: &RequestMeta) -> Option<ResolvedSession> {
        let token = session_token(jar, &self.config)?;
        self.resolve_token(&token, meta).await
    }

    /// Resolve a raw session token.
    pub async fn resolve_token(&self, token: &str, meta: &RequestMeta) -> Option<ResolvedSession> {
        let record = match self.bounded(self.store.find_by_token(token)).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(token = %mask_token(token), "No session for token");
                return None;
            }
            Err(e) => {
                warn!(token = %mask_token(token), error = %e, "Session lookup failed");
                return None;
            }
        };

        if record.is_expired_at(Utc::now()) {
            debug!(session_id = %record.id, expires = %record.expires, "Session expired");
            if let Err(e) = self.bounded(self.store.delete(record.id)).await {
                warn!(session_id = %record.id, error = %e, "Failed to delete expired session");
            }
            return None;
        }

        if !record.active {
            debug!(user_id = %record.user_id, "Session owner is inactive");
            return None;
        }

        let permissions = self.policies.derive_permissions(record.role, record.plan);

        if let Err(e) = self
            .bounded(self.store.update_last_seen(record.id, meta))
            .await
        {
            debug!(session_id = %record.id, error = %e, "Failed to update session last seen");
        }

        Some(ResolvedSession {
            session_id: record.id,
            user_id: record.user_id,
            role: record.role,
            plan: record.plan,
            active: record.active,
            permissions,
            expires_at: record.expires,
        })
    }

    async fn bounded<T>(&self, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        let limit = Duration::from_millis(self.config.store_timeout_ms);
        tokio::time::timeout(limit, fut).await.map_err(|_| {
            AppError::timeout(format!(
                "Session store call exceeded {}ms",
                self.config.store_timeout_ms
            ))
        })?
    }
}

/// Whether an optional session is present and usable.
pub fn is_valid_session(session: Option<&ResolvedSession>) -> bool {
    session.is_some_and(ResolvedSession::is_valid)
}
