//! In-memory session store for single-node development and tests.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use gatekeeper_core::result::AppResult;
use gatekeeper_entity::session::{RequestMeta, SessionRecord};

use super::store::SessionStore;

/// Session store keeping records in a concurrent map keyed by token.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<DashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a session.
    pub fn insert(&self, record: SessionRecord) {
        self.sessions.insert(record.session_token.clone(), record);
    }

    /// Look up a session without going through the trait.
    pub fn get(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.get(token).map(|entry| entry.value().clone())
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find_by_token(&self, token: &str) -> AppResult<Option<SessionRecord>> {
        Ok(self.get(token))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.sessions.retain(|_, record| record.id != id);
        Ok(())
    }

    async fn update_last_seen(&self, id: Uuid, meta: &RequestMeta) -> AppResult<()> {
        for mut entry in self.sessions.iter_mut() {
            if entry.id == id {
                entry.ip_address = meta.ip.clone();
                entry.user_agent = meta.user_agent.clone();
            }
        }
        Ok(())
    }
}
