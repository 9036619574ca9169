//! Session domain entities.

pub mod meta;
pub mod model;
pub mod resolved;

pub use meta::RequestMeta;
pub use model::SessionRecord;
pub use resolved::ResolvedSession;
