use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use my_lab_guide_domain::models::ReferenceRow;

/// One catalog entry resolved for the requested demographic
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicReferenceRow {
    /// Canonical test key, e.g. "SODIUM"
    pub test: String,

    /// Human readable test name
    pub label: String,

    /// Measurement unit, absent for qualitative flags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Panel the test belongs to, e.g. "electrolytes"
    pub category: String,

    /// Inclusive lower bound for the requested demographic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,

    /// Inclusive upper bound for the requested demographic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
}

impl From<ReferenceRow> for PublicReferenceRow {
    fn from(row: ReferenceRow) -> Self {
        Self {
            test: row.key,
            label: row.label,
            unit: row.unit,
            category: row.category.to_string(),
            low: row.bounds.map(|b| b.low),
            high: row.bounds.map(|b| b.high),
        }
    }
}

/// Reference catalog resolved for one demographic
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicReferenceList {
    /// Gender tag the intervals were resolved for
    pub gender: String,

    /// Age in years the intervals were resolved for, if one was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    /// Resolved catalog entries in catalog order
    pub tests: Vec<PublicReferenceRow>,
}
