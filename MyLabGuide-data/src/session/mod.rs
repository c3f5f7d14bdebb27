//! Session storage for the report wizard.
//!
//! The wizard keeps its per-visitor state server side. This module
//! defines the storage trait the rest of the application programs
//! against plus the in-memory implementation used in production.

mod errors;
mod store;

pub use errors::SessionStoreError;
pub use store::{InMemorySessionStore, SessionStore, DEFAULT_SESSION_TTL_SECS};
