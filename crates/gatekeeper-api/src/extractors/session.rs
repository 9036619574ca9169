//! `CurrentSession` extractor: the resolved session for the request.

use axum::extract::FromRequestParts;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use gatekeeper_core::error::AppError;
use gatekeeper_entity::session::{RequestMeta, ResolvedSession};

use super::client_ip::ClientIp;
use crate::error::ApiError;
use crate::state::AppState;

/// The session attached by the gate, or resolved on demand for paths the
/// route table leaves unprotected.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub ResolvedSession);

impl std::ops::Deref for CurrentSession {
    type Target = ResolvedSession;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<ResolvedSession>() {
            return Ok(Self(session.clone()));
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let ip = ClientIp::from_request_parts(parts, state)
            .await
            .unwrap_or(ClientIp(None));
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let meta = RequestMeta::new(ip.into_inner(), user_agent);

        state
            .policy
            .resolver()
            .resolve(&jar, &meta)
            .await
            .filter(ResolvedSession::is_valid)
            .map(Self)
            .ok_or_else(|| AppError::unauthorized("No active session").into())
    }
}
