//! The per-request decision chain: route match → session → role → budget.

use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use gatekeeper_core::result::AppResult;
use gatekeeper_entity::session::{RequestMeta, ResolvedSession};

use super::rules::{RouteTable, is_authorized};
use crate::ratelimit::{RateLimitResult, RateLimiter};
use crate::session::{SessionResolver, is_valid_session};

/// What the gate should do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Let the request through.
    Allow {
        /// Resolved session, when the path was protected.
        session: Option<ResolvedSession>,
        /// Budget standing, when a limit applied.
        rate_limit: Option<RateLimitResult>,
    },
    /// Protected path without a valid session.
    RedirectLogin,
    /// Valid session whose role the rule does not admit.
    Forbidden,
    /// Budget exhausted for this client and rule.
    Throttled(RateLimitResult),
}

/// Inputs the engine needs from an inbound request.
#[derive(Debug, Clone, Copy)]
pub struct PolicyRequest<'a> {
    pub path: &'a str,
    pub cookies: &'a CookieJar,
    pub meta: &'a RequestMeta,
}

/// Evaluates requests against the route table.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    routes: RouteTable,
    resolver: SessionResolver,
    limiter: RateLimiter,
}

impl PolicyEngine {
    pub fn new(routes: RouteTable, resolver: SessionResolver, limiter: RateLimiter) -> Self {
        Self {
            routes,
            resolver,
            limiter,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run the decision chain for one request.
    ///
    /// Rate limiting applies only when the matched rule carries a budget and
    /// the client IP is known. The counter key is `<ip>:<rule path>`.
    pub async fn evaluate(&self, request: &PolicyRequest<'_>) -> AppResult<PolicyDecision> {
        let Some(rule) = self.routes.match_rule(request.path) else {
            return Ok(PolicyDecision::Allow {
                session: None,
                rate_limit: None,
            });
        };

        let session = self.resolver.resolve(request.cookies, request.meta).await;
        let Some(session) = session.filter(|s| is_valid_session(Some(s))) else {
            debug!(path = request.path, rule = %rule.path, "No valid session for protected route");
            return Ok(PolicyDecision::RedirectLogin);
        };

        if !is_authorized(rule, &session) {
            debug!(
                path = request.path,
                role = %session.role,
                user_id = %session.user_id,
                "Role not admitted by route rule"
            );
            return Ok(PolicyDecision::Forbidden);
        }

        let mut rate_limit = None;
        if let (Some(options), Some(ip)) = (&rule.rate_limit, request.meta.ip.as_deref()) {
            let key = format!("{ip}:{}", rule.path);
            let result = self.limiter.limit(&key, options).await?;
            if !result.success {
                return Ok(PolicyDecision::Throttled(result));
            }
            rate_limit = Some(result);
        }

        Ok(PolicyDecision::Allow {
            session: Some(session),
            rate_limit,
        })
    }
}
