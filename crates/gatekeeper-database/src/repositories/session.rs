//! Session repository: session rows joined with their owning user.

use sqlx::PgPool;
use uuid::Uuid;

use gatekeeper_core::error::{AppError, ErrorKind};
use gatekeeper_core::result::AppResult;
use gatekeeper_entity::session::SessionRecord;

const SELECT_WITH_USER: &str = "\
    SELECT s.id, s.session_token, s.user_id, u.role, u.plan, u.active, \
           s.expires, s.ip_address, s.user_agent \
    FROM sessions s \
    JOIN users u ON u.id = s.user_id";

/// Repository for the session lookups performed on every protected request.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a session and its user by the cookie token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<SessionRecord>> {
        sqlx::query_as::<_, SessionRecord>(&format!(
            "{SELECT_WITH_USER} WHERE s.session_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find session by token", e)
        })
    }

    /// Delete a session by ID. Returns whether a row was removed.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete session", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the IP address and user agent of the latest request.
    pub async fn update_last_seen(
        &self,
        id: Uuid,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE sessions SET ip_address = $2, user_agent = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(ip_address)
        .bind(user_agent)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update session last seen", e)
        })?;
        Ok(())
    }
}
