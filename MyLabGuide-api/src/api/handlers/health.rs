use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use std::time::{SystemTime, UNIX_EPOCH};
use std::sync::{Arc, Once};
use once_cell::sync::OnceCell;
// Use the trait from domain layer
use my_lab_guide_domain::health::{
    self, ComponentStatus as DomainComponentStatus, HealthServiceTrait, SystemHealth, SystemStatus,
};
use my_lab_guide_data::reference::ReferenceCatalog;
use my_lab_guide_data::session::SessionStore;
use async_trait::async_trait;

/// Health check response model with basic system information
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Current service status ("ok", "degraded", or "error")
    pub status: String,
    /// Current application version from Cargo manifest
    pub version: String,
    /// Timestamp of when the response was generated
    pub timestamp: u64,
    /// Uptime of the service in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// Details about various components of the system
    pub components: ComponentStatus,
    /// Environment information
    pub environment: String,
}

/// Status of individual system components
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    /// Reference catalog status
    pub reference_catalog: ComponentHealthStatus,
    /// Session store status
    pub session_store: ComponentHealthStatus,
}

/// Health status for an individual component
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ComponentHealthStatus {
    /// Status of the component ("ok", "degraded", or "error")
    pub status: String,
    /// Optional message with more details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// Track the time when the server started using a thread-safe OnceCell
static SERVER_START_TIME: OnceCell<u64> = OnceCell::new();
static INIT: Once = Once::new();

// Initialize the server start time
pub fn initialize_server_start_time() {
    INIT.call_once(|| {
        let start_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let _ = SERVER_START_TIME.set(start_time);
    });
}

/// Health check endpoint to verify the API is running
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API is healthy", body = HealthResponse),
        (status = 500, description = "API is not healthy", body = HealthResponse),
        (status = 503, description = "API is degraded", body = HealthResponse)
    ),
    tag = "health"
)]
#[instrument(skip(health_service))]
pub async fn health_check(
    Extension(health_service): Extension<Arc<dyn HealthServiceTrait + Send + Sync>>,
) -> Result<impl IntoResponse, axum::response::Response> {
    info!("Health check requested");

    // Get the current timestamp
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    // Calculate uptime if server start time is available
    let uptime = SERVER_START_TIME.get().map(|&start_time| now.saturating_sub(start_time));

    // Get system health from the service
    let system_health = health_service.get_system_health().await;

    // Map domain status to API status
    let overall_status = match system_health.status {
        SystemStatus::Healthy => "ok",
        SystemStatus::Degraded => "degraded",
        SystemStatus::Unhealthy => "error",
    };

    // Map domain components to API component status
    let components = ComponentStatus {
        reference_catalog: component_health(&system_health, "reference_catalog"),
        session_store: component_health(&system_health, "session_store"),
    };

    // Build the response
    let response = HealthResponse {
        status: overall_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
        uptime,
        components,
        environment: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
    };

    // Return appropriate status code based on overall status
    match overall_status {
        "ok" => Ok((StatusCode::OK, Json(response))),
        "degraded" => Ok((StatusCode::SERVICE_UNAVAILABLE, Json(response))),
        _ => Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(response))),
    }
}

/// Extract one named component from the domain health snapshot
fn component_health(system_health: &SystemHealth, name: &str) -> ComponentHealthStatus {
    ComponentHealthStatus {
        status: map_component_status(
            &system_health
                .components
                .get(name)
                .map(|c| c.status.clone())
                .unwrap_or(DomainComponentStatus::Healthy),
        ),
        message: system_health
            .components
            .get(name)
            .and_then(|c| c.details.clone()),
    }
}

/// Map domain component status to API status string
fn map_component_status(status: &DomainComponentStatus) -> String {
    match status {
        DomainComponentStatus::Healthy => "ok",
        DomainComponentStatus::Degraded => "degraded",
        DomainComponentStatus::Unhealthy => "error",
    }
    .to_string()
}

/// Implementation of the health service over the application state
#[derive(Debug)]
pub struct HealthService {
    catalog: Arc<ReferenceCatalog>,
    session_store: Arc<dyn SessionStore>,
}

impl HealthService {
    /// Create a new health service
    pub fn new(catalog: Arc<ReferenceCatalog>, session_store: Arc<dyn SessionStore>) -> Self {
        HealthService {
            catalog,
            session_store,
        }
    }
}

#[async_trait]
impl HealthServiceTrait for HealthService {
    async fn get_system_health(&self) -> SystemHealth {
        health::get_system_health(&self.catalog, self.session_store.as_ref()).await
    }

    async fn check_session_store(&self) -> Result<usize, String> {
        health::check_session_store(self.session_store.as_ref()).await
    }
}

/// Factory function to create a health service
pub fn create_health_service(
    catalog: Arc<ReferenceCatalog>,
    session_store: Arc<dyn SessionStore>,
) -> Arc<dyn HealthServiceTrait + Send + Sync> {
    Arc::new(HealthService::new(catalog, session_store))
}
