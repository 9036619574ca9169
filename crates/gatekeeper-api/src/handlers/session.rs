//! Current-session handler.

use axum::Json;

use gatekeeper_entity::session::ResolvedSession;

use crate::extractors::CurrentSession;

/// GET /api/session
///
/// The caller's resolved session, or 401 when there is none.
pub async fn current_session(CurrentSession(session): CurrentSession) -> Json<ResolvedSession> {
    Json(session)
}
