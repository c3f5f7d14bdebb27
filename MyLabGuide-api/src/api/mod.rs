pub mod handlers;
pub mod routes;


use std::sync::Arc;

use axum::Router;
use tracing::info;

use my_lab_guide_data::reference::ReferenceCatalog;
use my_lab_guide_data::session::{InMemorySessionStore, DEFAULT_SESSION_TTL_SECS};

use handlers::AppState;

/// Create the application router over the builtin catalog and an
/// in-memory session store
pub fn create_application() -> Router {
    let session_ttl_secs = std::env::var("SESSION_TTL_SECS")
        .ok()
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|ttl| *ttl > 0)
        .unwrap_or(DEFAULT_SESSION_TTL_SECS);

    let catalog = Arc::new(ReferenceCatalog::builtin());
    let session_store = Arc::new(InMemorySessionStore::new(chrono::Duration::seconds(
        session_ttl_secs,
    )));

    info!(
        tests = catalog.len(),
        session_ttl_secs, "application state assembled"
    );

    routes::create_app(AppState::new(catalog, session_store, session_ttl_secs))
}
