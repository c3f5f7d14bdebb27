// Domain models

// Classified results and assembled reports
pub mod report;

pub use report::{Classification, LabReport, LabResult, ReferenceRow, TestStatus};
