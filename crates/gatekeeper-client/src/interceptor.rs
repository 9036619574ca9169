//! HTTP client that attaches the bearer token and retries once after a
//! shared refresh when the server answers 401.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, Request, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info};

use gatekeeper_core::config::client::ClientConfig;
use gatekeeper_core::error::{AppError, ErrorKind};
use gatekeeper_core::result::AppResult;

use crate::refresh::{HttpTokenRefresher, RefreshCoordinator, TokenPair, TokenRefresher};
use crate::token_store::{TokenStorage, TokenStore};

fn http_error(context: &str, e: reqwest::Error) -> AppError {
    AppError::with_source(ErrorKind::ExternalService, format!("{context}: {e}"), e)
}

/// Authenticating HTTP client.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    config: ClientConfig,
    coordinator: RefreshCoordinator,
}

impl AuthClient {
    /// Build a client that refreshes through the configured refresh endpoint.
    pub fn new(config: ClientConfig, storage: Arc<dyn TokenStorage>) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let refresher = HttpTokenRefresher::new(join_url(&config.base_url, &config.refresh_endpoint), timeout)?;
        Self::with_refresher(config, storage, Arc::new(refresher))
    }

    /// Build a client with a custom refresher.
    pub fn with_refresher(
        config: ClientConfig,
        storage: Arc<dyn TokenStorage>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| http_error("Failed to build HTTP client", e))?;
        let tokens = TokenStore::new(storage, &config);
        Ok(Self {
            http,
            coordinator: RefreshCoordinator::new(tokens, refresher),
            config,
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        self.coordinator.tokens()
    }

    /// Absolute URL for a path under the configured base URL.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.config.base_url, path)
    }

    /// Start a request against a path under the base URL.
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Send a request with the stored access token attached.
    ///
    /// A 401 triggers one shared refresh and a single replay with the new
    /// token. Refresh failures are returned to the caller. Requests whose
    /// body cannot be cloned are not replayed.
    pub async fn execute(&self, mut request: Request) -> AppResult<Response> {
        let sent_token = self.tokens().access_token()?;
        if let Some(token) = &sent_token {
            self.authorize(&mut request, token)?;
        }
        let replay = request.try_clone();

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| http_error("Request failed", e))?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(mut replay) = replay else {
            debug!("Request body is not replayable, returning 401");
            return Ok(response);
        };

        debug!(url = %replay.url(), "Received 401, refreshing access token");
        let token = self
            .coordinator
            .refresh_if_stale(sent_token.as_deref())
            .await?;
        self.authorize(&mut replay, &token)?;

        self.http
            .execute(replay)
            .await
            .map_err(|e| http_error("Replayed request failed", e))
    }

    /// GET a path under the base URL.
    pub async fn get(&self, path: &str) -> AppResult<Response> {
        let request = self
            .request(Method::GET, path)
            .build()
            .map_err(|e| http_error("Invalid request", e))?;
        self.execute(request).await
    }

    /// POST a JSON body to a path under the base URL.
    pub async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> AppResult<Response> {
        let request = self
            .request(Method::POST, path)
            .json(body)
            .build()
            .map_err(|e| http_error("Invalid request", e))?;
        self.execute(request).await
    }

    /// Log in and store the returned token pair.
    pub async fn login<T: Serialize + ?Sized>(&self, credentials: &T) -> AppResult<TokenPair> {
        let response = self
            .http
            .post(self.url(&self.config.login_endpoint))
            .json(credentials)
            .send()
            .await
            .map_err(|e| http_error("Login request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::unauthorized(format!("Login rejected with status {status}")));
        }

        let pair: TokenPair = response
            .json()
            .await
            .map_err(|e| http_error("Login returned an invalid body", e))?;
        self.tokens().set_access_token(&pair.access_token)?;
        self.tokens().set_refresh_token(&pair.refresh_token)?;
        info!("Logged in");
        Ok(pair)
    }

    /// Post a registration payload. The response is returned as-is.
    pub async fn register<T: Serialize + ?Sized>(&self, payload: &T) -> AppResult<Response> {
        self.http
            .post(self.url(&self.config.register_endpoint))
            .json(payload)
            .send()
            .await
            .map_err(|e| http_error("Register request failed", e))
    }

    /// Notify the logout endpoint and drop the stored tokens.
    ///
    /// Tokens are cleared even when the endpoint cannot be reached.
    pub async fn logout(&self) -> AppResult<()> {
        let outcome = self.post_json(&self.config.logout_endpoint, &serde_json::json!({})).await;
        self.tokens().clear()?;
        info!("Logged out");
        outcome.map(|_| ())
    }

    /// Whether an access token is stored.
    pub fn is_logged_in(&self) -> AppResult<bool> {
        Ok(self.tokens().access_token()?.is_some())
    }

    fn authorize(&self, request: &mut Request, token: &str) -> AppResult<()> {
        let value = HeaderValue::from_str(&format!("{} {token}", self.config.token_type))
            .map_err(|_| AppError::validation("Access token is not a valid header value"))?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://h:1/", "/a/b"), "http://h:1/a/b");
        assert_eq!(join_url("http://h:1", "a"), "http://h:1/a");
        assert_eq!(join_url("http://h:1", "https://other/x"), "https://other/x");
    }
}
