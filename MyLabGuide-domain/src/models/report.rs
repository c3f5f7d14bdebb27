use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use my_lab_guide_data::models::reference::{Bounds, Gender, TestCategory};

/// Where a value sits relative to its resolved reference interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Low,
    Normal,
    High,
}

impl TestStatus {
    /// Whether the status flags the value as outside its interval.
    pub fn is_abnormal(&self) -> bool {
        !matches!(self, TestStatus::Normal)
    }

    /// The lowercase tag used in advice keys and API payloads.
    pub fn as_tag(&self) -> &'static str {
        match self {
            TestStatus::Low => "low",
            TestStatus::Normal => "normal",
            TestStatus::High => "high",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// Outcome of classifying a single value.
///
/// `bounds` is the interval the value was compared against; it is
/// absent for unknown tests and qualitative flags, which always read as
/// normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub status: TestStatus,
    pub bounds: Option<Bounds>,
}

impl Classification {
    /// A normal result with no interval attached.
    pub fn unbounded() -> Self {
        Self {
            status: TestStatus::Normal,
            bounds: None,
        }
    }
}

/// One classified laboratory value on a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    /// Canonical test key, e.g. `SODIUM`.
    pub key: String,
    /// Human readable test name.
    pub label: String,
    /// Measurement unit, absent for qualitative flags.
    pub unit: Option<String>,
    /// The submitted value.
    pub value: f64,
    /// Low, normal or high.
    pub status: TestStatus,
    /// Interval the value was compared against, if one applied.
    pub bounds: Option<Bounds>,
    /// Lifestyle advice attached to abnormal results.
    pub advice: Option<String>,
}

/// A fully evaluated report over one submitted panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabReport {
    /// Patient age in years.
    pub age: Option<u32>,
    /// Patient gender used for range resolution.
    pub gender: Gender,
    /// Classified rows in catalog order.
    pub results: Vec<LabResult>,
    /// Number of rows with a low or high status.
    pub abnormal_count: usize,
    /// Whether any severity rule fired for the submitted values.
    pub severe: bool,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
}

impl LabReport {
    /// Whether all rows are inside their reference intervals.
    pub fn is_all_normal(&self) -> bool {
        self.abnormal_count == 0
    }
}

/// One catalog entry resolved for a concrete demographic, used by the
/// reference browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub key: String,
    pub label: String,
    pub unit: Option<String>,
    pub category: TestCategory,
    /// Interval applying to the requested demographic, absent for
    /// qualitative flags.
    pub bounds: Option<Bounds>,
}
