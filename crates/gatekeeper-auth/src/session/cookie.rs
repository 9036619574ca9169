//! Session cookie lookup.

use axum_extra::extract::cookie::CookieJar;

use gatekeeper_core::config::session::SessionConfig;

/// Read the session token, preferring the plain cookie over the
/// `__Secure-` variant. Empty values count as absent.
pub fn session_token(jar: &CookieJar, config: &SessionConfig) -> Option<String> {
    [&config.cookie_name, &config.secure_cookie_name]
        .into_iter()
        .filter_map(|name| jar.get(name))
        .map(|cookie| cookie.value().to_string())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn test_plain_cookie_wins() {
        let config = SessionConfig::default();
        let jar = CookieJar::new()
            .add(Cookie::new("next-auth.session-token", "plain"))
            .add(Cookie::new("__Secure-next-auth.session-token", "secure"));
        assert_eq!(session_token(&jar, &config), Some("plain".to_string()));
    }

    #[test]
    fn test_secure_cookie_fallback() {
        let config = SessionConfig::default();
        let jar = CookieJar::new().add(Cookie::new("__Secure-next-auth.session-token", "secure"));
        assert_eq!(session_token(&jar, &config), Some("secure".to_string()));
    }

    #[test]
    fn test_no_cookie() {
        let config = SessionConfig::default();
        assert_eq!(session_token(&CookieJar::new(), &config), None);
        let jar = CookieJar::new().add(Cookie::new("next-auth.session-token", ""));
        assert_eq!(session_token(&jar, &config), None);
    }
}
