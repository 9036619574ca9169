//! Single-flight token refresh.
//!
//! Concurrent callers that hit an expired access token share one refresh:
//! the first caller performs it, later callers queue a oneshot channel and
//! receive the same outcome, success or failure.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use gatekeeper_core::error::{AppError, ErrorKind};
use gatekeeper_core::result::AppResult;

use crate::token_store::TokenStore;

/// Token pair returned by the refresh and login endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Exchanges a refresh token for a new token pair.
#[async_trait]
pub trait TokenRefresher: Send + Sync + std::fmt::Debug + 'static {
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Refresher that POSTs `{"refreshToken": ...}` to the refresh endpoint.
///
/// Uses a bare client so a rejected refresh never re-enters the 401 path.
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    http: reqwest::Client,
    url: String,
}

impl HttpTokenRefresher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to build HTTP client", e)
            })?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let response = self
            .http
            .post(&self.url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::ExternalService, "Token refresh request failed", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::unauthorized(format!(
                "Token refresh rejected with status {status}"
            )));
        }

        response.json::<TokenPair>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                "Token refresh returned an invalid body",
                e,
            )
        })
    }
}

type Waiter = oneshot::Sender<AppResult<String>>;

#[derive(Debug, Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight flag and settles every waiter, even if the leading
/// future is dropped before the refresh completes.
struct InFlightGuard<'a> {
    state: &'a Mutex<RefreshState>,
    settled: bool,
}

impl InFlightGuard<'_> {
    fn settle(&mut self, outcome: &AppResult<String>) {
        let waiters = {
            let mut state = lock(self.state);
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        self.settled = true;

        let count = waiters.len();
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
        if count > 0 {
            debug!(waiters = count, ok = outcome.is_ok(), "Released queued refresh waiters");
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Token refresh abandoned before completion");
            self.settle(&Err(AppError::internal("Token refresh was cancelled")));
        }
    }
}

/// Coordinates token refreshes so that at most one runs at a time.
#[derive(Debug, Clone)]
pub struct RefreshCoordinator {
    state: Arc<Mutex<RefreshState>>,
    tokens: TokenStore,
    refresher: Arc<dyn TokenRefresher>,
}

impl RefreshCoordinator {
    pub fn new(tokens: TokenStore, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RefreshState::default())),
            tokens,
            refresher,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Obtain a fresh access token, joining a refresh already in flight.
    pub async fn refresh(&self) -> AppResult<String> {
        self.refresh_if_stale(None).await
    }

    /// Like [`refresh`](Self::refresh), but when no refresh is in flight and
    /// the stored access token already differs from `rejected`, that token
    /// is returned without another round trip. Callers pass the token their
    /// request was rejected with.
    pub async fn refresh_if_stale(&self, rejected: Option<&str>) -> AppResult<String> {
        let waiter = {
            let mut state = lock(&self.state);
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                if let Some(rejected) = rejected {
                    if let Some(current) = self.tokens.access_token()? {
                        if current != rejected {
                            return Ok(current);
                        }
                    }
                }
                state.in_flight = true;
                None
            }
        };

        if let Some(rx) = waiter {
            return rx
                .await
                .map_err(|_| AppError::internal("Token refresh ended without a result"))?;
        }

        let mut guard = InFlightGuard {
            state: &self.state,
            settled: false,
        };
        let outcome = self.perform_refresh().await;
        guard.settle(&outcome);
        outcome
    }

    async fn perform_refresh(&self) -> AppResult<String> {
        let refresh_token = self
            .tokens
            .refresh_token()?
            .ok_or_else(|| AppError::unauthorized("No refresh token stored"))?;

        let pair = self.refresher.refresh(&refresh_token).await.inspect_err(|e| {
            warn!(error = %e, "Token refresh failed");
        })?;

        self.tokens.set_access_token(&pair.access_token)?;
        self.tokens.set_refresh_token(&pair.refresh_token)?;
        info!("Access token refreshed");
        Ok(pair.access_token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use gatekeeper_core::config::client::ClientConfig;

    use super::*;
    use crate::token_store::MemoryTokenStorage;

    #[derive(Debug, Default)]
    struct FakeRefresher {
        calls: AtomicUsize,
        fail: bool,
        hang: bool,
    }

    #[async_trait]
    impl TokenRefresher for FakeRefresher {
        async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.hang {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(AppError::unauthorized("refresh token revoked"));
            }
            Ok(TokenPair {
                access_token: format!("access-{n}"),
                refresh_token: format!("{refresh_token}-next"),
            })
        }
    }

    fn coordinator(refresher: Arc<FakeRefresher>) -> RefreshCoordinator {
        let tokens = TokenStore::new(Arc::new(MemoryTokenStorage::new()), &ClientConfig::default());
        tokens.set_access_token("access-0").unwrap();
        tokens.set_refresh_token("r0").unwrap();
        RefreshCoordinator::new(tokens, refresher)
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let refresher = Arc::new(FakeRefresher::default());
        let coordinator = coordinator(refresher.clone());

        let results =
            futures::future::join_all((0..5).map(|_| coordinator.refresh())).await;

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap(), "access-1");
        }
        assert_eq!(
            coordinator.tokens().refresh_token().unwrap().as_deref(),
            Some("r0-next")
        );
    }

    #[tokio::test]
    async fn test_failure_rejects_every_waiter() {
        let refresher = Arc::new(FakeRefresher {
            fail: true,
            ..FakeRefresher::default()
        });
        let coordinator = coordinator(refresher.clone());

        let all = futures::future::join_all((0..5).map(|_| coordinator.refresh()));
        let results = tokio::time::timeout(Duration::from_secs(5), all)
            .await
            .expect("waiters must not hang");

        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap_err().kind, ErrorKind::Unauthorized);
        }
    }

    #[tokio::test]
    async fn test_next_cycle_runs_after_completion() {
        let refresher = Arc::new(FakeRefresher::default());
        let coordinator = coordinator(refresher.clone());

        assert_eq!(coordinator.refresh().await.unwrap(), "access-1");
        assert_eq!(coordinator.refresh().await.unwrap(), "access-2");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_rejection_reuses_current_token() {
        let refresher = Arc::new(FakeRefresher::default());
        let coordinator = coordinator(refresher.clone());

        let token = coordinator.refresh_if_stale(Some("older")).await.unwrap();
        assert_eq!(token, "access-0");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);

        let token = coordinator.refresh_if_stale(Some("access-0")).await.unwrap();
        assert_eq!(token, "access-1");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_is_unauthorized() {
        let refresher = Arc::new(FakeRefresher::default());
        let coordinator = coordinator(refresher.clone());
        coordinator.tokens().clear().unwrap();

        let err = coordinator.refresh().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_leader_releases_waiters() {
        let refresher = Arc::new(FakeRefresher {
            hang: true,
            ..FakeRefresher::default()
        });
        let coordinator = coordinator(refresher);

        let leader = {
            let c = coordinator.clone();
            tokio::spawn(async move { c.refresh().await })
        };
        tokio::task::yield_now().await;

        let waiter = {
            let c = coordinator.clone();
            tokio::spawn(async move { c.refresh().await })
        };
        tokio::task::yield_now().await;

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());

        let result = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter must not hang")
            .unwrap();
        assert_eq!(result.unwrap_err().kind, ErrorKind::Internal);

        // The flag is cleared, so a new cycle can start.
        let state = lock(&coordinator.state);
        assert!(!state.in_flight);
        assert!(state.waiters.is_empty());
    }
}
