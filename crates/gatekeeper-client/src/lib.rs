//! # gatekeeper-client
//!
//! Client side of the token flow: persisted access/refresh tokens, a
//! single-flight refresh coordinator, and an HTTP client that attaches the
//! bearer token and replays requests rejected with 401 after one shared
//! refresh.

pub mod interceptor;
pub mod refresh;
pub mod token_store;

pub use interceptor::AuthClient;
pub use refresh::{HttpTokenRefresher, RefreshCoordinator, TokenPair, TokenRefresher};
pub use token_store::{FileTokenStorage, MemoryTokenStorage, TokenStorage, TokenStore};
