//! Pure evaluation functions over the reference catalog.
//!
//! Everything in this module is side-effect free: the catalog is passed
//! in by reference and the functions answer one question each. Range
//! resolution walks population selectors from most to least specific,
//! so a pediatric-male interval beats a pediatric one, which beats a
//! gender interval, which beats the general `any` entry. The first
//! matching selector wins regardless of how the intervals are ordered
//! in the catalog.

use indexmap::IndexMap;

use my_lab_guide_data::models::reference::{AgeBucket, Bounds, Gender, Selector};
use my_lab_guide_data::reference::ReferenceCatalog;

use crate::models::report::{Classification, TestStatus};

/// Selector probe order for a demographic, most specific first.
///
/// Gender-specific probes are skipped when the gender is unknown, so an
/// unknown gender only ever matches gender-free intervals.
pub fn selector_precedence(gender: Gender, age: Option<u32>) -> Vec<Selector> {
    let bucket = AgeBucket::from_age(age);
    let mut probes = Vec::with_capacity(4);

    if gender != Gender::Unknown {
        probes.push(Selector::BucketGender(bucket, gender));
    }
    probes.push(Selector::Bucket(bucket));
    if gender != Gender::Unknown {
        probes.push(Selector::Gender(gender));
    }
    probes.push(Selector::Any);

    probes
}

/// Resolves the reference interval applying to a demographic.
///
/// Returns `None` for unknown tests and for qualitative tests that
/// carry no intervals.
pub fn resolve_bounds(
    catalog: &ReferenceCatalog,
    test: &str,
    gender: Gender,
    age: Option<u32>,
) -> Option<Bounds> {
    let definition = catalog.test(test)?;
    selector_precedence(gender, age)
        .into_iter()
        .find_map(|selector| definition.range_for(selector))
}

/// Classifies a value against its resolved reference interval.
///
/// Bounds are inclusive: a value equal to either bound is normal. When
/// no interval applies the value reads as normal with no bounds.
pub fn classify(
    catalog: &ReferenceCatalog,
    test: &str,
    value: f64,
    gender: Gender,
    age: Option<u32>,
) -> Classification {
    match resolve_bounds(catalog, test, gender, age) {
        Some(bounds) => {
            let status = if value < bounds.low {
                TestStatus::Low
            } else if value > bounds.high {
                TestStatus::High
            } else {
                TestStatus::Normal
            };
            Classification {
                status,
                bounds: Some(bounds),
            }
        }
        None => Classification::unbounded(),
    }
}

/// Picks the advice text for a classified result.
///
/// Normal results never carry advice. Abnormal results use the
/// test-specific entry when one exists and fall back to the generic
/// text for the status.
pub fn advice_for<'a>(
    catalog: &'a ReferenceCatalog,
    test: &str,
    status: TestStatus,
) -> Option<&'a str> {
    if !status.is_abnormal() {
        return None;
    }

    let specific = format!("{}_{}", test, status.as_tag());
    catalog
        .advice(&specific)
        .or_else(|| catalog.advice(&format!("default_{}", status.as_tag())))
}

/// Whether any severity rule fires for the submitted values.
///
/// Rules are checked in catalog order and the first hit wins. Values
/// that are not finite are skipped rather than failing the whole
/// evaluation.
pub fn is_severe(catalog: &ReferenceCatalog, values: &IndexMap<String, f64>) -> bool {
    catalog.severe_rules().iter().any(|rule| {
        values
            .get(&rule.test)
            .filter(|value| value.is_finite())
            .is_some_and(|&value| rule.check.is_triggered(value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use my_lab_guide_data::models::reference::{ReferenceRange, TestCategory, TestDefinition};
    use proptest::prelude::*;

    fn catalog() -> ReferenceCatalog {
        ReferenceCatalog::builtin()
    }

    fn values(entries: &[(&str, f64)]) -> IndexMap<String, f64> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect()
    }

    /// Catalog with one test carrying all four selector forms, listed
    /// least specific first to prove ordering in the table is
    /// irrelevant.
    fn precedence_fixture() -> ReferenceCatalog {
        ReferenceCatalog::new(
            vec![TestDefinition::new(
                "FIXTURE",
                "Fixture",
                Some("U/L"),
                TestCategory::Liver,
                vec![
                    ReferenceRange::any(7.0, 8.0),
                    ReferenceRange::gender(Gender::Male, 5.0, 6.0),
                    ReferenceRange::bucket(AgeBucket::Pediatric, 3.0, 4.0),
                    ReferenceRange::bucket_gender(AgeBucket::Pediatric, Gender::Male, 1.0, 2.0),
                ],
            )],
            IndexMap::new(),
            vec![],
        )
    }

    #[test]
    fn test_any_only_tests_resolve_independently_of_demographics() {
        let catalog = catalog();
        for definition in catalog.tests() {
            let any_only = definition
                .ranges
                .iter()
                .all(|range| range.selector == Selector::Any);
            if definition.is_qualitative() || !any_only {
                continue;
            }

            let baseline = resolve_bounds(&catalog, &definition.key, Gender::Unknown, None);
            assert!(baseline.is_some());
            for gender in [Gender::Male, Gender::Female, Gender::Unknown] {
                for age in [None, Some(5), Some(40)] {
                    assert_eq!(
                        resolve_bounds(&catalog, &definition.key, gender, age),
                        baseline,
                        "{} resolved differently for {gender}/{age:?}",
                        definition.key
                    );
                }
            }
        }
    }

    #[test]
    fn test_creatinine_resolves_by_gender_at_any_age() {
        let catalog = catalog();
        for age in [None, Some(10), Some(40), Some(90)] {
            let male = resolve_bounds(&catalog, "CREATININE", Gender::Male, age).unwrap();
            assert_eq!((male.low, male.high), (0.67, 1.17));

            let female = resolve_bounds(&catalog, "CREATININE", Gender::Female, age).unwrap();
            assert_eq!((female.low, female.high), (0.51, 0.95));
        }
    }

    #[test]
    fn test_creatinine_unknown_gender_has_no_interval() {
        // CREATININE carries only gendered intervals, so an unknown
        // gender resolves nothing and the value reads as normal.
        let catalog = catalog();
        assert!(resolve_bounds(&catalog, "CREATININE", Gender::Unknown, Some(40)).is_none());

        let classification = classify(&catalog, "CREATININE", 9.9, Gender::Unknown, Some(40));
        assert_eq!(classification.status, TestStatus::Normal);
        assert!(classification.bounds.is_none());
    }

    #[test]
    fn test_triglycerides_resolve_by_age_bucket() {
        let catalog = catalog();

        let pediatric = resolve_bounds(&catalog, "TRIGLYCERIDES", Gender::Unknown, Some(10)).unwrap();
        assert_eq!((pediatric.low, pediatric.high), (0.0, 90.0));

        let adult = resolve_bounds(&catalog, "TRIGLYCERIDES", Gender::Unknown, Some(30)).unwrap();
        assert_eq!((adult.low, adult.high), (0.0, 150.0));

        // Missing age counts as adult.
        let unknown_age = resolve_bounds(&catalog, "TRIGLYCERIDES", Gender::Male, None).unwrap();
        assert_eq!((unknown_age.low, unknown_age.high), (0.0, 150.0));
    }

    #[test]
    fn test_pediatric_boundary_at_eighteen() {
        let catalog = catalog();

        let seventeen = resolve_bounds(&catalog, "TRIGLYCERIDES", Gender::Male, Some(17)).unwrap();
        assert_eq!(seventeen.high, 90.0);

        let eighteen = resolve_bounds(&catalog, "TRIGLYCERIDES", Gender::Male, Some(18)).unwrap();
        assert_eq!(eighteen.high, 150.0);
    }

    #[test]
    fn test_precedence_most_specific_selector_wins() {
        let fixture = precedence_fixture();

        // Pediatric male hits the combined interval.
        let combined = resolve_bounds(&fixture, "FIXTURE", Gender::Male, Some(10)).unwrap();
        assert_eq!((combined.low, combined.high), (1.0, 2.0));

        // Pediatric female falls through to the bucket interval.
        let bucket = resolve_bounds(&fixture, "FIXTURE", Gender::Female, Some(10)).unwrap();
        assert_eq!((bucket.low, bucket.high), (3.0, 4.0));

        // Adult male falls through to the gender interval.
        let gender = resolve_bounds(&fixture, "FIXTURE", Gender::Male, Some(30)).unwrap();
        assert_eq!((gender.low, gender.high), (5.0, 6.0));

        // Adult unknown lands on the general interval.
        let any = resolve_bounds(&fixture, "FIXTURE", Gender::Unknown, Some(30)).unwrap();
        assert_eq!((any.low, any.high), (7.0, 8.0));

        // Pediatric unknown matches the bucket before the general entry.
        let pediatric_unknown = resolve_bounds(&fixture, "FIXTURE", Gender::Unknown, Some(10)).unwrap();
        assert_eq!((pediatric_unknown.low, pediatric_unknown.high), (3.0, 4.0));
    }

    #[test]
    fn test_boundary_values_classify_as_normal() {
        let catalog = catalog();

        let at_low = classify(&catalog, "SODIUM", 135.0, Gender::Unknown, None);
        assert_eq!(at_low.status, TestStatus::Normal);

        let at_high = classify(&catalog, "SODIUM", 145.0, Gender::Unknown, None);
        assert_eq!(at_high.status, TestStatus::Normal);
    }

    #[test]
    fn test_low_sodium_classifies_low_with_bounds() {
        let catalog = catalog();
        let classification = classify(&catalog, "SODIUM", 129.0, Gender::Unknown, None);
        assert_eq!(classification.status, TestStatus::Low);

        let bounds = classification.bounds.unwrap();
        assert_eq!((bounds.low, bounds.high), (135.0, 145.0));
    }

    #[test]
    fn test_high_sodium_classifies_high() {
        let catalog = catalog();
        let classification = classify(&catalog, "SODIUM", 151.0, Gender::Unknown, None);
        assert_eq!(classification.status, TestStatus::High);
    }

    #[test]
    fn test_unknown_test_reads_as_normal_without_bounds() {
        let catalog = catalog();
        let classification = classify(&catalog, "UNKNOWN_TEST", 5.0, Gender::Unknown, None);
        assert_eq!(classification.status, TestStatus::Normal);
        assert!(classification.bounds.is_none());
    }

    #[test]
    fn test_qualitative_flags_always_read_normal() {
        let catalog = catalog();
        for key in ["HEMOLYTIC_FLAG", "LIPEMIC_FLAG", "ICTERIC_FLAG"] {
            let classification = classify(&catalog, key, 1.0, Gender::Male, Some(40));
            assert_eq!(classification.status, TestStatus::Normal);
            assert!(classification.bounds.is_none());
        }
    }

    #[test]
    fn test_severe_sodium_thresholds() {
        let catalog = catalog();

        assert!(is_severe(&catalog, &values(&[("SODIUM", 129.0)])));
        assert!(!is_severe(&catalog, &values(&[("SODIUM", 131.0)])));
        assert!(!is_severe(&catalog, &values(&[("SODIUM", 130.0)])));
        assert!(!is_severe(&catalog, &values(&[("SODIUM", 150.0)])));
        assert!(is_severe(&catalog, &values(&[("SODIUM", 150.5)])));
    }

    #[test]
    fn test_severe_glucose_is_at_or_above() {
        let catalog = catalog();
        assert!(is_severe(&catalog, &values(&[("GLUCOSE_FASTING", 126.0)])));
        assert!(!is_severe(&catalog, &values(&[("GLUCOSE_FASTING", 125.9)])));
    }

    #[test]
    fn test_severe_crp_is_strictly_above() {
        let catalog = catalog();
        assert!(!is_severe(&catalog, &values(&[("CRP", 3.0)])));
        assert!(is_severe(&catalog, &values(&[("CRP", 3.1)])));
    }

    #[test]
    fn test_severe_potassium_window() {
        let catalog = catalog();
        assert!(is_severe(&catalog, &values(&[("POTASSIUM", 2.9)])));
        assert!(is_severe(&catalog, &values(&[("POTASSIUM", 5.6)])));
        assert!(!is_severe(&catalog, &values(&[("POTASSIUM", 3.0)])));
        assert!(!is_severe(&catalog, &values(&[("POTASSIUM", 5.5)])));
    }

    #[test]
    fn test_one_severe_value_flags_the_whole_panel() {
        let catalog = catalog();
        let panel = values(&[("HB", 14.0), ("CRP", 0.2), ("SODIUM", 128.0)]);
        assert!(is_severe(&catalog, &panel));
    }

    #[test]
    fn test_non_finite_values_are_skipped() {
        let catalog = catalog();
        let panel = values(&[("SODIUM", f64::NAN), ("CRP", f64::INFINITY)]);
        assert!(!is_severe(&catalog, &panel));

        // A finite severe value still wins next to junk.
        let mixed = values(&[("SODIUM", f64::NAN), ("POTASSIUM", 2.5)]);
        assert!(is_severe(&catalog, &mixed));
    }

    #[test]
    fn test_tests_without_rules_are_never_severe() {
        let catalog = catalog();
        let panel = values(&[("HB", 2.0), ("ALT", 4000.0)]);
        assert!(!is_severe(&catalog, &panel));
    }

    #[test]
    fn test_ferritin_low_gets_the_specific_advice() {
        let catalog = catalog();
        let advice = advice_for(&catalog, "FERRITIN", TestStatus::Low).unwrap();
        let generic = catalog.advice("default_low").unwrap();
        assert_ne!(advice, generic);
        assert!(advice.contains("iron"));
    }

    #[test]
    fn test_missing_specific_advice_falls_back_to_default() {
        let catalog = catalog();

        let low = advice_for(&catalog, "HB", TestStatus::Low).unwrap();
        assert_eq!(low, catalog.advice("default_low").unwrap());

        let high = advice_for(&catalog, "FERRITIN", TestStatus::High).unwrap();
        assert_eq!(high, catalog.advice("default_high").unwrap());
    }

    #[test]
    fn test_normal_results_never_get_advice() {
        let catalog = catalog();
        assert!(advice_for(&catalog, "SODIUM", TestStatus::Normal).is_none());
        assert!(advice_for(&catalog, "UNKNOWN_TEST", TestStatus::Normal).is_none());
    }

    #[test]
    fn test_precedence_probe_order() {
        let probes = selector_precedence(Gender::Female, Some(9));
        assert_eq!(
            probes,
            vec![
                Selector::BucketGender(AgeBucket::Pediatric, Gender::Female),
                Selector::Bucket(AgeBucket::Pediatric),
                Selector::Gender(Gender::Female),
                Selector::Any,
            ]
        );

        let unknown = selector_precedence(Gender::Unknown, Some(40));
        assert_eq!(
            unknown,
            vec![Selector::Bucket(AgeBucket::Adult), Selector::Any]
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_classification_agrees_with_bounds(value in -1000.0f64..1000.0) {
            let catalog = catalog();
            let classification = classify(&catalog, "SODIUM", value, Gender::Unknown, None);
            let bounds = classification.bounds.unwrap();

            let expected = if value < bounds.low {
                TestStatus::Low
            } else if value > bounds.high {
                TestStatus::High
            } else {
                TestStatus::Normal
            };
            prop_assert_eq!(classification.status, expected);
        }

        #[test]
        fn test_unknown_tests_are_always_normal(value in -1.0e9f64..1.0e9) {
            let catalog = catalog();
            let classification = classify(&catalog, "NOT_A_TEST", value, Gender::Male, Some(30));
            prop_assert_eq!(classification.status, TestStatus::Normal);
            prop_assert!(classification.bounds.is_none());
        }

        #[test]
        fn test_values_inside_the_interval_are_normal(value in 135.0f64..=145.0) {
            let catalog = catalog();
            let classification = classify(&catalog, "SODIUM", value, Gender::Female, Some(50));
            prop_assert_eq!(classification.status, TestStatus::Normal);
        }

        #[test]
        fn test_in_range_sodium_is_never_severe(value in 135.0f64..=145.0) {
            let catalog = catalog();
            prop_assert!(!is_severe(&catalog, &values(&[("SODIUM", value)])));
        }

        #[test]
        fn test_abnormal_rows_always_carry_advice(value in -500.0f64..500.0) {
            let catalog = catalog();
            let classification = classify(&catalog, "POTASSIUM", value, Gender::Male, Some(40));
            let advice = advice_for(&catalog, "POTASSIUM", classification.status);
            prop_assert_eq!(classification.status.is_abnormal(), advice.is_some());
        }
    }
}
