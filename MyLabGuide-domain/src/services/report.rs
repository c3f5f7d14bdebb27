use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info};

use my_lab_guide_data::models::reference::Gender;
use my_lab_guide_data::reference::ReferenceCatalog;

use crate::models::report::{LabReport, LabResult, ReferenceRow};
use crate::services::evaluation::{advice_for, classify, is_severe, resolve_bounds};

/// Lab report service errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReportServiceError {
    /// No values were submitted at all
    #[error("No laboratory values were submitted")]
    EmptyPanel,

    /// A submitted key is not in the reference catalog
    #[error("Unknown test identifier: {0}")]
    UnknownTest(String),

    /// A submitted value is NaN or infinite
    #[error("Value for {0} must be a finite number")]
    NonFiniteValue(String),
}

/// Trait for lab report service operations
pub trait LabReportServiceTrait: Send + Sync {
    /// Validate a submitted value panel against the catalog
    fn validate_panel(&self, values: &IndexMap<String, f64>) -> Result<(), ReportServiceError>;

    /// Build a classified report for a demographic and value panel
    fn build_report(
        &self,
        age: Option<u32>,
        gender: Gender,
        values: &IndexMap<String, f64>,
    ) -> Result<LabReport, ReportServiceError>;

    /// Resolve every catalog entry for a demographic, in catalog order
    fn reference_rows(&self, gender: Gender, age: Option<u32>) -> Vec<ReferenceRow>;
}

/// Lab report service over an immutable reference catalog
pub struct LabReportService {
    catalog: Arc<ReferenceCatalog>,
}

impl LabReportService {
    /// Create a new lab report service
    pub fn new(catalog: Arc<ReferenceCatalog>) -> Self {
        Self { catalog }
    }
}

impl LabReportServiceTrait for LabReportService {
    fn validate_panel(&self, values: &IndexMap<String, f64>) -> Result<(), ReportServiceError> {
        if values.is_empty() {
            return Err(ReportServiceError::EmptyPanel);
        }

        for (key, value) in values {
            if !self.catalog.contains(key) {
                debug!(test = %key, "rejected unknown test identifier");
                return Err(ReportServiceError::UnknownTest(key.clone()));
            }
            if !value.is_finite() {
                return Err(ReportServiceError::NonFiniteValue(key.clone()));
            }
        }

        Ok(())
    }

    fn build_report(
        &self,
        age: Option<u32>,
        gender: Gender,
        values: &IndexMap<String, f64>,
    ) -> Result<LabReport, ReportServiceError> {
        if values.is_empty() {
            return Err(ReportServiceError::EmptyPanel);
        }

        // Rows come out in catalog order so reports render the same
        // panels in the same sequence regardless of submission order.
        // Keys absent from the catalog are skipped silently.
        let results: Vec<LabResult> = self
            .catalog
            .tests()
            .filter_map(|test| {
                let value = *values.get(&test.key)?;
                let classification = classify(&self.catalog, &test.key, value, gender, age);
                let advice = advice_for(&self.catalog, &test.key, classification.status)
                    .map(str::to_string);
                Some(LabResult {
                    key: test.key.clone(),
                    label: test.label.clone(),
                    unit: test.unit.clone(),
                    value,
                    status: classification.status,
                    bounds: classification.bounds,
                    advice,
                })
            })
            .collect();

        let abnormal_count = results.iter().filter(|row| row.status.is_abnormal()).count();
        let severe = is_severe(&self.catalog, values);

        info!(
            rows = results.len(),
            abnormal = abnormal_count,
            severe,
            "built lab report"
        );

        Ok(LabReport {
            age,
            gender,
            results,
            abnormal_count,
            severe,
            generated_at: Utc::now(),
        })
    }

    fn reference_rows(&self, gender: Gender, age: Option<u32>) -> Vec<ReferenceRow> {
        self.catalog
            .tests()
            .map(|test| ReferenceRow {
                key: test.key.clone(),
                label: test.label.clone(),
                unit: test.unit.clone(),
                category: test.category,
                bounds: resolve_bounds(&self.catalog, &test.key, gender, age),
            })
            .collect()
    }
}

/// Create a lab report service over the given catalog
pub fn create_report_service(catalog: Arc<ReferenceCatalog>) -> impl LabReportServiceTrait {
    LabReportService::new(catalog)
}

/// Create a mock lab report service for testing
/// This function is only available when the mock feature is enabled
#[cfg(feature = "mock")]
pub fn create_mock_report_service() -> impl LabReportServiceTrait {
    crate::testing::MockLabReportService::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::TestStatus;

    fn service() -> LabReportService {
        LabReportService::new(Arc::new(ReferenceCatalog::builtin()))
    }

    fn values(entries: &[(&str, f64)]) -> IndexMap<String, f64> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect()
    }

    #[test]
    fn test_validate_panel_accepts_known_finite_values() {
        let service = service();
        let panel = values(&[("SODIUM", 140.0), ("HB", 14.2), ("HEMOLYTIC_FLAG", 0.0)]);
        assert!(service.validate_panel(&panel).is_ok());
    }

    #[test]
    fn test_validate_panel_rejects_empty_panel() {
        let service = service();
        assert_eq!(
            service.validate_panel(&IndexMap::new()),
            Err(ReportServiceError::EmptyPanel)
        );
    }

    #[test]
    fn test_validate_panel_rejects_unknown_test() {
        let service = service();
        let panel = values(&[("SODIUM", 140.0), ("NOT_A_TEST", 1.0)]);
        assert_eq!(
            service.validate_panel(&panel),
            Err(ReportServiceError::UnknownTest("NOT_A_TEST".to_string()))
        );
    }

    #[test]
    fn test_validate_panel_rejects_non_finite_values() {
        let service = service();
        let panel = values(&[("SODIUM", f64::NAN)]);
        assert_eq!(
            service.validate_panel(&panel),
            Err(ReportServiceError::NonFiniteValue("SODIUM".to_string()))
        );
    }

    #[test]
    fn test_build_report_requires_values() {
        let service = service();
        let result = service.build_report(Some(40), Gender::Female, &IndexMap::new());
        assert_eq!(result, Err(ReportServiceError::EmptyPanel));
    }

    #[test]
    fn test_report_rows_follow_catalog_order() {
        let service = service();
        // Submitted in reverse of catalog order.
        let panel = values(&[("HB", 14.0), ("CREATININE", 0.8), ("ALT", 30.0)]);

        let report = service.build_report(Some(40), Gender::Male, &panel).unwrap();
        let keys: Vec<&str> = report.results.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["ALT", "CREATININE", "HB"]);
    }

    #[test]
    fn test_report_counts_abnormal_rows() {
        let service = service();
        let panel = values(&[("SODIUM", 129.0), ("POTASSIUM", 4.0), ("CRP", 1.2)]);

        let report = service.build_report(Some(40), Gender::Male, &panel).unwrap();
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.abnormal_count, 2);
        assert!(!report.is_all_normal());

        let sodium = &report.results[0];
        assert_eq!(sodium.key, "SODIUM");
        assert_eq!(sodium.status, TestStatus::Low);
        assert!(sodium.advice.is_some());
    }

    #[test]
    fn test_normal_rows_carry_no_advice() {
        let service = service();
        let panel = values(&[("SODIUM", 140.0)]);

        let report = service.build_report(Some(40), Gender::Female, &panel).unwrap();
        let sodium = &report.results[0];
        assert_eq!(sodium.status, TestStatus::Normal);
        assert!(sodium.advice.is_none());
        assert!(report.is_all_normal());
    }

    #[test]
    fn test_severe_flag_covers_whole_panel() {
        let service = service();

        let severe = service
            .build_report(Some(40), Gender::Male, &values(&[("SODIUM", 128.0), ("HB", 14.0)]))
            .unwrap();
        assert!(severe.severe);

        let merely_low = service
            .build_report(Some(40), Gender::Male, &values(&[("SODIUM", 131.0)]))
            .unwrap();
        assert_eq!(merely_low.abnormal_count, 1);
        assert!(!merely_low.severe);
    }

    #[test]
    fn test_report_uses_demographics_for_resolution() {
        let service = service();
        let panel = values(&[("TRIGLYCERIDES", 120.0)]);

        // 120 is high for a ten year old but normal for an adult.
        let pediatric = service.build_report(Some(10), Gender::Male, &panel).unwrap();
        assert_eq!(pediatric.results[0].status, TestStatus::High);

        let adult = service.build_report(Some(30), Gender::Male, &panel).unwrap();
        assert_eq!(adult.results[0].status, TestStatus::Normal);
    }

    #[test]
    fn test_unknown_keys_are_skipped_in_reports() {
        // The API rejects unknown keys up front; the builder itself stays
        // silent about them, matching the classifier.
        let service = service();
        let panel = values(&[("SODIUM", 140.0), ("NOT_A_TEST", 7.0)]);

        let report = service.build_report(Some(40), Gender::Male, &panel).unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].key, "SODIUM");
    }

    #[test]
    fn test_qualitative_flags_report_normal_without_bounds() {
        let service = service();
        let panel = values(&[("HEMOLYTIC_FLAG", 1.0)]);

        let report = service.build_report(Some(40), Gender::Male, &panel).unwrap();
        let flag = &report.results[0];
        assert_eq!(flag.status, TestStatus::Normal);
        assert!(flag.bounds.is_none());
        assert!(flag.unit.is_none());
        assert!(flag.advice.is_none());
    }

    #[test]
    fn test_reference_rows_cover_the_whole_catalog() {
        let service = service();
        let rows = service.reference_rows(Gender::Female, Some(30));

        assert_eq!(rows.len(), ReferenceCatalog::builtin().len());

        let creatinine = rows.iter().find(|r| r.key == "CREATININE").unwrap();
        let bounds = creatinine.bounds.unwrap();
        assert_eq!((bounds.low, bounds.high), (0.51, 0.95));

        let flag = rows.iter().find(|r| r.key == "ICTERIC_FLAG").unwrap();
        assert!(flag.bounds.is_none());
    }

    #[test]
    fn test_reference_rows_respect_age_bucket() {
        let service = service();

        let pediatric = service.reference_rows(Gender::Unknown, Some(9));
        let tg = pediatric.iter().find(|r| r.key == "TRIGLYCERIDES").unwrap();
        assert_eq!(tg.bounds.unwrap().high, 90.0);

        let adult = service.reference_rows(Gender::Unknown, None);
        let tg = adult.iter().find(|r| r.key == "TRIGLYCERIDES").unwrap();
        assert_eq!(tg.bounds.unwrap().high, 150.0);
    }

    #[test]
    fn test_reference_rows_for_unknown_gender_omit_gendered_bounds() {
        let service = service();
        let rows = service.reference_rows(Gender::Unknown, Some(40));

        let creatinine = rows.iter().find(|r| r.key == "CREATININE").unwrap();
        assert!(creatinine.bounds.is_none());

        let sodium = rows.iter().find(|r| r.key == "SODIUM").unwrap();
        assert!(sodium.bounds.is_some());
    }
}
