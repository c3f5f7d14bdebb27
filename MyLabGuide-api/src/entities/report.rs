use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use my_lab_guide_domain::models::{LabReport, LabResult};

/// One classified laboratory value on a public report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicLabResult {
    /// Canonical test key, e.g. "SODIUM"
    pub test: String,

    /// Human readable test name
    pub label: String,

    /// Measurement unit, absent for qualitative flags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// The submitted value
    pub value: f64,

    /// Classification outcome ("low", "normal" or "high")
    pub status: String,

    /// Inclusive lower bound of the applied reference interval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,

    /// Inclusive upper bound of the applied reference interval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,

    /// Lifestyle advice attached to abnormal results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

impl From<LabResult> for PublicLabResult {
    fn from(result: LabResult) -> Self {
        Self {
            test: result.key,
            label: result.label,
            unit: result.unit,
            value: result.value,
            status: result.status.as_tag().to_string(),
            low: result.bounds.map(|b| b.low),
            high: result.bounds.map(|b| b.high),
            advice: result.advice,
        }
    }
}

/// Public representation of a classified lab report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicLabReport {
    /// Patient age in years
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    /// Patient gender tag used for range resolution
    pub gender: String,

    /// Classified rows in catalog order
    pub results: Vec<PublicLabResult>,

    /// Number of rows outside their reference interval
    pub abnormal_count: usize,

    /// Whether any value is severely abnormal
    pub severe: bool,

    /// When the report was generated
    pub generated_at: DateTime<Utc>,
}

impl From<LabReport> for PublicLabReport {
    fn from(report: LabReport) -> Self {
        Self {
            age: report.age,
            gender: report.gender.as_tag().to_string(),
            results: report.results.into_iter().map(PublicLabResult::from).collect(),
            abnormal_count: report.abnormal_count,
            severe: report.severe,
            generated_at: report.generated_at,
        }
    }
}
