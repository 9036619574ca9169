//! End-to-end tests of the gate middleware through the Axum router.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::header::{COOKIE, LOCATION, RETRY_AFTER};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::routing::get;
use chrono::{Duration as ChronoDuration, Utc};
use tower::ServiceExt;
use uuid::Uuid;

use gatekeeper_api::AppState;
use gatekeeper_api::extractors::CurrentSession;
use gatekeeper_api::router::build_router;
use gatekeeper_auth::{
    MemorySessionStore, PolicyEngine, RateLimitOptions, RateLimiter, RouteRule, RouteTable,
    SessionResolver, WindowSize,
};
use gatekeeper_cache::CacheManager;
use gatekeeper_cache::memory::MemoryCacheProvider;
use gatekeeper_core::config::AppConfig;
use gatekeeper_core::config::cache::MemoryCacheConfig;
use gatekeeper_entity::session::SessionRecord;
use gatekeeper_entity::user::{Plan, UserRole};

struct TestApp {
    router: Router,
    sessions: Arc<MemorySessionStore>,
}

impl TestApp {
    fn new() -> Self {
        let config = AppConfig::default();
        let routes = RouteTable::from_config(&config.routes).unwrap();
        Self::with_routes(config, routes)
    }

    fn with_routes(mut config: AppConfig, routes: RouteTable) -> Self {
        config.session.store = "memory".to_string();

        let sessions = Arc::new(MemorySessionStore::new());
        let cache = Arc::new(CacheManager::from_provider(Arc::new(
            MemoryCacheProvider::new(&MemoryCacheConfig::default()),
        )));
        let resolver = SessionResolver::new(sessions.clone(), config.session.clone());
        let limiter = RateLimiter::new(cache.clone(), Duration::from_millis(500));
        let engine = PolicyEngine::new(routes, resolver, limiter);
        let state = AppState::new(config, engine, cache, None);

        let protected = Router::new()
            .route("/app/{*rest}", get(whoami))
            .route("/admin/{*rest}", get(whoami))
            .route("/dashboard", get(whoami))
            .route("/pricing", get(|| async { "pricing" }));

        Self {
            router: build_router(state, protected),
            sessions,
        }
    }

    fn login(&self, token: &str, role: UserRole, expires_in: ChronoDuration) -> Uuid {
        let user_id = Uuid::new_v4();
        self.sessions.insert(SessionRecord {
            id: Uuid::new_v4(),
            session_token: token.to_string(),
            user_id,
            role,
            plan: Plan::Pro,
            active: true,
            expires: Utc::now() + expires_in,
            ip_address: None,
            user_agent: None,
        });
        user_id
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .uri(path)
            .header("x-forwarded-for", "203.0.113.9");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }
}

async fn whoami(CurrentSession(session): CurrentSession) -> String {
    session.user_id.to_string()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_without_database() {
    let app = TestApp::new();
    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cache"], "up");
    assert_eq!(body["database"], "disabled");
}

#[tokio::test]
async fn test_unprotected_path_passes_without_tracking_headers() {
    let app = TestApp::new();
    let response = app.get("/pricing", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(!response.headers().contains_key("x-request-id"));
    assert!(!response.headers().contains_key("x-response-time"));
    assert!(!response.headers().contains_key("x-ratelimit-remaining"));
    assert_eq!(body_text(response).await, "pricing");
}

#[tokio::test]
async fn test_protected_path_redirects_to_login() {
    let app = TestApp::new();
    let response = app.get("/app/home", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "/portal?from=%2Fapp%2Fhome"
    );
}

#[tokio::test]
async fn test_valid_session_reaches_handler() {
    let app = TestApp::new();
    let user_id = app.login("tok-user", UserRole::User, ChronoDuration::hours(1));

    let response = app
        .get("/app/home", Some("next-auth.session-token=tok-user"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let request_id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(Uuid::parse_str(request_id).is_ok());
    let elapsed = response.headers().get("x-response-time").unwrap().to_str().unwrap();
    assert!(elapsed.ends_with("ms"));
    assert_eq!(
        response.headers().get("x-ratelimit-remaining").unwrap(),
        "99"
    );
    assert_eq!(body_text(response).await, user_id.to_string());
}

#[tokio::test]
async fn test_secure_cookie_name_accepted() {
    let app = TestApp::new();
    app.login("tok-secure", UserRole::User, ChronoDuration::hours(1));

    let response = app
        .get(
            "/app/home",
            Some("__Secure-next-auth.session-token=tok-secure"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_session_redirects_and_is_removed() {
    let app = TestApp::new();
    app.login("tok-old", UserRole::User, ChronoDuration::minutes(-5));

    let response = app
        .get("/app/home", Some("next-auth.session-token=tok-old"))
        .await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(app.sessions.is_empty());
}

#[tokio::test]
async fn test_user_on_admin_route_gets_forbidden() {
    let app = TestApp::new();
    app.login("tok-user", UserRole::User, ChronoDuration::hours(1));

    let response = app
        .get("/admin/users", Some("next-auth.session-token=tok-user"))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Forbidden");
}

#[tokio::test]
async fn test_admin_on_admin_route_allowed() {
    let app = TestApp::new();
    app.login("tok-admin", UserRole::Admin, ChronoDuration::hours(1));

    let response = app
        .get("/admin/users", Some("next-auth.session-token=tok-admin"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_budget_exhaustion_returns_429() {
    let mut config = AppConfig::default();
    config.routes.clear();
    let routes = RouteTable::new(vec![RouteRule {
        path: "/dashboard".to_string(),
        roles: None,
        rate_limit: Some(RateLimitOptions::new(3, WindowSize::parse("1h").unwrap())),
    }]);
    let app = TestApp::with_routes(config, routes);
    app.login("tok-user", UserRole::User, ChronoDuration::hours(1));

    for _ in 0..3 {
        let response = app
            .get("/dashboard", Some("next-auth.session-token=tok-user"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .get("/dashboard", Some("next-auth.session-token=tok-user"))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.headers().get("x-ratelimit-remaining").unwrap(),
        "0"
    );
    assert!(response.headers().contains_key("x-ratelimit-reset"));
    assert!(response.headers().contains_key(RETRY_AFTER));
    assert_eq!(body_text(response).await, "Too Many Requests");
}

#[tokio::test]
async fn test_engine_error_becomes_plain_500() {
    let config = AppConfig::default();
    let routes = RouteTable::new(vec![RouteRule {
        path: "/app".to_string(),
        roles: Some(BTreeSet::from([UserRole::User])),
        rate_limit: Some(RateLimitOptions::new(0, WindowSize::parse("60s").unwrap())),
    }]);
    let app = TestApp::with_routes(config, routes);
    app.login("tok-user", UserRole::User, ChronoDuration::hours(1));

    let response = app
        .get("/app/home", Some("next-auth.session-token=tok-user"))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Internal Server Error");
}

#[tokio::test]
async fn test_session_endpoint() {
    let app = TestApp::new();
    let response = app.get("/api/session", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let user_id = app.login("tok-admin", UserRole::Admin, ChronoDuration::hours(1));
    let response = app
        .get("/api/session", Some("next-auth.session-token=tok-admin"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["userId"], user_id.to_string());
    assert_eq!(body["role"], "ADMIN");
    assert_eq!(body["plan"], "PRO");
    assert!(
        body["permissions"]
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p == "users_manage")
    );
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let app = TestApp::new();
    let response = app.get("/nowhere", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
