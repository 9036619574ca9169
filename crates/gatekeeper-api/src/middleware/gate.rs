//! The request gate: runs the policy engine ahead of every handler and
//! turns its decision into a response.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::header::{RETRY_AFTER, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::{debug, error};
use uuid::Uuid;

use gatekeeper_auth::{PolicyDecision, PolicyRequest, RateLimitResult};
use gatekeeper_entity::session::RequestMeta;

use crate::extractors::ClientIp;
use crate::state::AppState;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Query-component encoding for the `from` parameter: everything but
/// alphanumerics and `-._*` is escaped, so `/` becomes `%2F`.
const FROM_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'*');

/// Gate middleware.
///
/// - unprotected requests continue untouched
/// - admitted sessions continue with `X-Request-Id` and `X-Response-Time`
///   set, and the resolved session in request extensions
/// - protected paths without a valid session get a 307 to the login page
/// - sessions whose role the rule does not admit get a 403
/// - exhausted budgets get a 429 with rate-limit headers
/// - any error escaping the engine becomes a plain 500
pub async fn gate(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let path = request.uri().path().to_owned();
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let meta = RequestMeta::new(ip, user_agent);

    let decision = state
        .policy
        .evaluate(&PolicyRequest {
            path: &path,
            cookies: &jar,
            meta: &meta,
        })
        .await;

    match decision {
        Ok(PolicyDecision::Allow {
            session,
            rate_limit,
        }) => {
            let tracked = session.is_some();
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }

            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            if let Some(limit) = rate_limit {
                set_rate_limit_headers(headers, &limit);
            }
            if tracked {
                set_tracking_headers(headers, started);
            }
            response
        }
        Ok(PolicyDecision::RedirectLogin) => {
            login_redirect(&state.config.server.login_path, &path).into_response()
        }
        Ok(PolicyDecision::Forbidden) => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
        Ok(PolicyDecision::Throttled(result)) => {
            debug!(path = %path, ip = ?meta.ip, "Request throttled");
            too_many_requests(&result, chrono::Utc::now().timestamp_millis())
        }
        Err(err) => {
            error!(
                url = %request.uri(),
                method = %request.method(),
                error = %err,
                "Request gate failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// `307` to `<login_path>?from=<encoded path>`.
pub fn login_redirect(login_path: &str, from: &str) -> Redirect {
    let from = utf8_percent_encode(from, FROM_PARAM);
    Redirect::temporary(&format!("{login_path}?from={from}"))
}

/// `429` carrying the budget standing and a whole-second `Retry-After`.
pub fn too_many_requests(result: &RateLimitResult, now_millis: i64) -> Response {
    let mut response = (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
    let headers = response.headers_mut();
    set_rate_limit_headers(headers, result);

    let wait_millis = (result.reset - now_millis).max(0);
    let retry_after = (wait_millis + 999) / 1000;
    headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

fn set_tracking_headers(headers: &mut HeaderMap, started: Instant) {
    if let Ok(id) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
        headers.insert(X_REQUEST_ID, id);
    }
    if let Ok(elapsed) = HeaderValue::from_str(&format!("{}ms", started.elapsed().as_millis())) {
        headers.insert(X_RESPONSE_TIME, elapsed);
    }
}

fn set_rate_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(result.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(result.reset));
}

#[cfg(test)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    #[test]
    fn test_login_redirect_encodes_path() {
        let response = login_redirect("/portal", "/app/home page").into_response();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/portal?from=%2Fapp%2Fhome%20page"
        );
    }

    #[test]
    fn test_too_many_requests_headers() {
        let result = RateLimitResult {
            success: false,
            remaining: 0,
            reset: 1_700_000_100_000,
        };
        let response = too_many_requests(&result, 1_700_000_058_500);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let headers = response.headers();
        assert_eq!(headers.get(X_RATELIMIT_REMAINING).unwrap(), "0");
        assert_eq!(headers.get(X_RATELIMIT_RESET).unwrap(), "1700000100000");
        assert_eq!(headers.get(RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn test_retry_after_never_negative() {
        let result = RateLimitResult {
            success: false,
            remaining: 0,
            reset: 1_000,
        };
        let response = too_many_requests(&result, 5_000);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "0");
    }
}
