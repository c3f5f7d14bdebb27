pub mod health;
pub mod reference;
pub mod session;
pub mod wizard;

// Tests module
#[cfg(test)]
mod tests;

// Re-export handlers for easier imports
pub use health::health_check;
pub use reference::get_reference_ranges;
pub use wizard::{get_report, get_report_pdf, start_wizard, submit_values};

use std::sync::Arc;

use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use my_lab_guide_data::reference::ReferenceCatalog;
use my_lab_guide_data::session::SessionStore;
use my_lab_guide_domain::services::{create_report_service, LabReportServiceTrait};

/// Service type for dependency injection
pub type ReportService = Arc<dyn LabReportServiceTrait + Send + Sync>;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// The immutable reference catalog
    pub catalog: Arc<ReferenceCatalog>,
    /// Classification and report building service
    pub report_service: ReportService,
    /// Wizard session storage
    pub session_store: Arc<dyn SessionStore>,
    /// Idle session lifetime, also used for the cookie Max-Age
    pub session_ttl_secs: i64,
}

impl AppState {
    /// Assemble the production state over a catalog and session store
    pub fn new(
        catalog: Arc<ReferenceCatalog>,
        session_store: Arc<dyn SessionStore>,
        session_ttl_secs: i64,
    ) -> Self {
        let report_service: ReportService = Arc::new(create_report_service(catalog.clone()));
        Self {
            catalog,
            report_service,
            session_store,
            session_ttl_secs,
        }
    }
}

/// Error response format for API
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error type/code - machine-readable identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a not found error response
    pub fn not_found(resource: &str) -> Self {
        Self {
            error: "not_found".to_string(),
            message: format!("The requested {} could not be found", resource),
            details: None,
        }
    }

    /// Create a validation error response
    pub fn validation_error(message: &str, details: Option<serde_json::Value>) -> Self {
        Self {
            error: "validation_error".to_string(),
            message: message.to_string(),
            details,
        }
    }

    /// Create a bad request error response
    pub fn bad_request(message: &str) -> Self {
        Self {
            error: "bad_request".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Create a wizard incomplete error response
    pub fn wizard_incomplete(message: &str) -> Self {
        Self {
            error: "wizard_incomplete".to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Create an internal error response
    pub fn internal_error() -> Self {
        Self {
            error: "internal_error".to_string(),
            message: "An unexpected error occurred".to_string(),
            details: None,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" => StatusCode::BAD_REQUEST,
            "bad_request" => StatusCode::BAD_REQUEST,
            "wizard_incomplete" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}
