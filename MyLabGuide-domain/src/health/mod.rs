//! Domain layer health check functionality
//! This module provides health check services for the application

use my_lab_guide_data::reference::ReferenceCatalog;
use my_lab_guide_data::session::SessionStore;
use std::collections::HashMap;
use async_trait::async_trait;

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    /// Component is functioning normally
    Healthy,
    /// Component is functioning but with reduced performance
    Degraded,
    /// Component is not functioning
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    /// Status of the component
    pub status: ComponentStatus,
    /// Optional details about the component status
    pub details: Option<String>,
}

/// Represents the overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    /// Overall system status
    pub status: SystemStatus,
    /// Map of component names to their health status
    pub components: HashMap<String, HealthComponent>,
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;

    /// Check the status of the session store
    /// Returns the number of live sessions if the store is reachable
    /// Returns an error if the check could not be performed
    async fn check_session_store(&self) -> Result<usize, String>;
}

/// Check that the reference catalog is loaded and complete
///
/// Returns:
/// - Healthy when tests and fallback advice are present
/// - Degraded when the fallback advice entries are missing
/// - Unhealthy when the catalog holds no tests at all
pub fn check_catalog(catalog: &ReferenceCatalog) -> HealthComponent {
    if catalog.is_empty() {
        return HealthComponent {
            status: ComponentStatus::Unhealthy,
            details: Some("Reference catalog holds no test definitions".to_string()),
        };
    }

    if catalog.advice("default_low").is_none() || catalog.advice("default_high").is_none() {
        return HealthComponent {
            status: ComponentStatus::Degraded,
            details: Some("Fallback advice entries are missing".to_string()),
        };
    }

    HealthComponent {
        status: ComponentStatus::Healthy,
        details: Some(format!("{} test definitions loaded", catalog.len())),
    }
}

/// Check if the session store is available and functioning properly
pub async fn check_session_store(store: &dyn SessionStore) -> Result<usize, String> {
    store
        .count()
        .await
        .map_err(|e| format!("Session store error: {}", e))
}

/// Get overall system health
pub async fn get_system_health(catalog: &ReferenceCatalog, store: &dyn SessionStore) -> SystemHealth {
    let catalog_component = check_catalog(catalog);

    let store_component = match check_session_store(store).await {
        Ok(count) => HealthComponent {
            status: ComponentStatus::Healthy,
            details: Some(format!("{} live sessions", count)),
        },
        Err(e) => HealthComponent {
            status: ComponentStatus::Unhealthy,
            details: Some(e),
        },
    };

    let components: HashMap<String, HealthComponent> = vec![
        ("reference_catalog".to_string(), catalog_component),
        ("session_store".to_string(), store_component),
    ]
    .into_iter()
    .collect();

    let overall_status = if components
        .values()
        .any(|c| c.status == ComponentStatus::Unhealthy)
    {
        SystemStatus::Unhealthy
    } else if components
        .values()
        .any(|c| c.status == ComponentStatus::Degraded)
    {
        SystemStatus::Degraded
    } else {
        SystemStatus::Healthy
    };

    SystemHealth {
        status: overall_status,
        components,
    }
}
