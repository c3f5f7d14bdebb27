// Testing utilities and mock implementations for the domain layer
// This module is only available when the "mock" feature is enabled

// Re-export the in-memory store so API tests can build real session state
pub use my_lab_guide_data::session::InMemorySessionStore;

use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth, SystemStatus};
use crate::models::report::{LabReport, LabResult, ReferenceRow, TestStatus};
use crate::services::report::{LabReportServiceTrait, ReportServiceError};
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use my_lab_guide_data::models::reference::{Bounds, Gender, TestCategory};
use std::collections::HashMap;

/// Mock implementation of the LabReportServiceTrait for testing
pub struct MockLabReportService {
    should_fail_validation: bool,
    should_fail_build: bool,
}

impl Default for MockLabReportService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLabReportService {
    /// Create a new mock lab report service
    pub fn new() -> Self {
        Self {
            should_fail_validation: false,
            should_fail_build: false,
        }
    }

    /// Configure the mock to fail panel validation
    pub fn with_validation_failure(mut self) -> Self {
        self.should_fail_validation = true;
        self
    }

    /// Configure the mock to fail report building
    pub fn with_build_failure(mut self) -> Self {
        self.should_fail_build = true;
        self
    }
}

impl LabReportServiceTrait for MockLabReportService {
    fn validate_panel(&self, values: &IndexMap<String, f64>) -> Result<(), ReportServiceError> {
        if self.should_fail_validation {
            return Err(ReportServiceError::UnknownTest("MOCK_TEST".to_string()));
        }
        if values.is_empty() {
            return Err(ReportServiceError::EmptyPanel);
        }
        Ok(())
    }

    fn build_report(
        &self,
        age: Option<u32>,
        gender: Gender,
        values: &IndexMap<String, f64>,
    ) -> Result<LabReport, ReportServiceError> {
        if self.should_fail_build || values.is_empty() {
            return Err(ReportServiceError::EmptyPanel);
        }

        // Every submitted value comes back as a normal row
        let results: Vec<LabResult> = values
            .iter()
            .map(|(key, value)| LabResult {
                key: key.clone(),
                label: key.clone(),
                unit: None,
                value: *value,
                status: TestStatus::Normal,
                bounds: None,
                advice: None,
            })
            .collect();

        Ok(LabReport {
            age,
            gender,
            results,
            abnormal_count: 0,
            severe: false,
            generated_at: Utc::now(),
        })
    }

    fn reference_rows(&self, _gender: Gender, _age: Option<u32>) -> Vec<ReferenceRow> {
        vec![
            ReferenceRow {
                key: "SODIUM".to_string(),
                label: "Sodium".to_string(),
                unit: Some("mEq/L".to_string()),
                category: TestCategory::Electrolytes,
                bounds: Some(Bounds::new(135.0, 145.0)),
            },
            ReferenceRow {
                key: "HEMOLYTIC_FLAG".to_string(),
                label: "Hemolytic sample".to_string(),
                unit: None,
                category: TestCategory::SampleQuality,
                bounds: None,
            },
        ]
    }
}

/// Mock implementation of health services for testing system health
#[derive(Debug)]
pub struct MockHealthService {
    /// Reference catalog component status
    catalog_status: ComponentStatus,
    /// Session store component status
    store_status: ComponentStatus,
    /// System status
    system_status: SystemStatus,
    /// Additional components
    components: HashMap<String, HealthComponent>,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// Create a new mock health service with all components healthy
    pub fn new() -> Self {
        Self {
            catalog_status: ComponentStatus::Healthy,
            store_status: ComponentStatus::Healthy,
            system_status: SystemStatus::Healthy,
            components: HashMap::new(),
        }
    }

    /// Configure the mock with a degraded reference catalog
    pub fn with_degraded_catalog(mut self) -> Self {
        self.catalog_status = ComponentStatus::Degraded;
        self
    }

    /// Configure the mock with an unhealthy reference catalog
    pub fn with_unhealthy_catalog(mut self) -> Self {
        self.catalog_status = ComponentStatus::Unhealthy;
        self
    }

    /// Configure the mock with an unhealthy session store
    pub fn with_unhealthy_store(mut self) -> Self {
        self.store_status = ComponentStatus::Unhealthy;
        self
    }

    /// Set the overall system status
    pub fn with_system_status(mut self, status: SystemStatus) -> Self {
        self.system_status = status;
        self
    }

    /// Add a custom component with a specific status
    pub fn with_component(mut self, name: &str, status: ComponentStatus, details: Option<String>) -> Self {
        self.components.insert(
            name.to_string(),
            HealthComponent {
                status,
                details,
            },
        );
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    /// Get the system health
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = HashMap::new();

        // Add reference catalog component
        components.insert(
            "reference_catalog".to_string(),
            HealthComponent {
                status: self.catalog_status.clone(),
                details: match self.catalog_status {
                    ComponentStatus::Healthy => None,
                    ComponentStatus::Degraded => Some("Fallback advice entries are missing".to_string()),
                    ComponentStatus::Unhealthy => Some("Reference catalog holds no test definitions".to_string()),
                },
            },
        );

        // Add session store component
        components.insert(
            "session_store".to_string(),
            HealthComponent {
                status: self.store_status.clone(),
                details: match self.store_status {
                    ComponentStatus::Unhealthy => Some("Session store lock poisoned".to_string()),
                    _ => None,
                },
            },
        );

        // Add any additional components
        for (name, component) in &self.components {
            components.insert(name.clone(), component.clone());
        }

        SystemHealth {
            status: self.system_status.clone(),
            components,
        }
    }

    /// Check session store status
    async fn check_session_store(&self) -> Result<usize, String> {
        match self.store_status {
            ComponentStatus::Unhealthy => Err("Session store lock poisoned".to_string()),
            _ => Ok(0),
        }
    }
}

/// Factory function to create a mock health service
pub fn create_mock_health_service() -> impl HealthServiceTrait {
    MockHealthService::new()
}
