//! Session store abstraction and its PostgreSQL implementation.

use async_trait::async_trait;
use uuid::Uuid;

use gatekeeper_core::result::AppResult;
use gatekeeper_database::repositories::session::SessionRepository;
use gatekeeper_entity::session::{RequestMeta, SessionRecord};

/// Persistence operations the session resolver needs.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a session and its user's role, plan, and active flag.
    async fn find_by_token(&self, token: &str) -> AppResult<Option<SessionRecord>>;

    /// Remove a session.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Record the caller's IP and user agent on the session.
    async fn update_last_seen(&self, id: Uuid, meta: &RequestMeta) -> AppResult<()>;
}

/// Session store backed by the PostgreSQL session repository.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    repo: SessionRepository,
}

impl PgSessionStore {
    /// Creates a new store over a repository.
    pub fn new(repo: SessionRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn find_by_token(&self, token: &str) -> AppResult<Option<SessionRecord>> {
        self.repo.find_by_token(token).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repo.delete(id).await.map(|_| ())
    }

    async fn update_last_seen(&self, id: Uuid, meta: &RequestMeta) -> AppResult<()> {
        self.repo
            .update_last_seen(id, meta.ip.as_deref(), meta.user_agent.as_deref())
            .await
    }
}
