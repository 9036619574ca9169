//! Key builders for every entry Gatekeeper writes to the counter store.

/// Namespace for fixed-window rate-limit counters.
const RATE_LIMIT_PREFIX: &str = "ratelimit";

/// Counter key for one fixed window: `ratelimit:<key>:<window_start_ms>`.
pub fn rate_limit_window(key: &str, window_start_ms: i64) -> String {
    format!("{RATE_LIMIT_PREFIX}:{key}:{window_start_ms}")
}

/// Glob matching every window counter of `key`.
///
/// Glob syntax inside `key` is escaped so that only its own counters match.
pub fn rate_limit_pattern(key: &str) -> String {
    format!("{RATE_LIMIT_PREFIX}:{}:*", escape_glob(key))
}

/// Backslash-escape the characters Redis `MATCH` treats as glob syntax.
pub fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '*' | '?' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_keys() {
        assert_eq!(
            rate_limit_window("10.0.0.1:/app", 1_700_000_040_000),
            "ratelimit:10.0.0.1:/app:1700000040000"
        );
        assert_eq!(rate_limit_pattern("10.0.0.1:/app"), "ratelimit:10.0.0.1:/app:*");
    }

    #[test]
    fn test_rate_limit_pattern_escapes_glob_syntax() {
        assert_eq!(rate_limit_pattern("[::1]:/app"), r"ratelimit:\[::1\]:/app:*");
        assert_eq!(rate_limit_pattern("a?*:/app"), r"ratelimit:a\?\*:/app:*");
        assert_eq!(escape_glob(r"a\b"), r"a\\b");
        assert_eq!(escape_glob("plain:/x"), "plain:/x");
    }
}
