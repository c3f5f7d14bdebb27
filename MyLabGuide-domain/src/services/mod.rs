pub mod evaluation;
pub mod report;

// Domain services
// This module contains business logic implementations.

// Re-export service traits and factory functions
pub use report::{LabReportService, LabReportServiceTrait, ReportServiceError, create_report_service};

// Re-export mock service factory functions when the mock feature is enabled
#[cfg(feature = "mock")]
pub use report::create_mock_report_service;
