//! Session resolution: cookie → stored session → validated session view.

pub mod cookie;
pub mod memory;
pub mod resolver;
pub mod store;

pub use cookie::session_token;
pub use memory::MemorySessionStore;
pub use resolver::{SessionResolver, is_valid_session};
pub use store::{PgSessionStore, SessionStore};
