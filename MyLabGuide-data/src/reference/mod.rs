//! Curated reference catalog.
//!
//! The catalog is the single source of truth for which laboratory tests
//! the application knows, which reference intervals apply to which
//! population, which advice texts accompany abnormal results and which
//! values count as severely abnormal. It is built once at startup and
//! shared immutably behind an `Arc`.

use indexmap::IndexMap;

use crate::models::reference::{
    AgeBucket, Gender, ReferenceRange, SevereRule, SeverityCheck, TestCategory, TestDefinition,
};

/// Immutable catalog of laboratory tests, advice texts and severity rules.
///
/// Tests keep their curated order so reports and the reference browser
/// render panels in a stable, clinically sensible sequence.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    tests: IndexMap<String, TestDefinition>,
    advice: IndexMap<String, String>,
    severe_rules: Vec<SevereRule>,
}

impl ReferenceCatalog {
    /// Builds a catalog from explicit parts, preserving test order.
    pub fn new(
        tests: Vec<TestDefinition>,
        advice: IndexMap<String, String>,
        severe_rules: Vec<SevereRule>,
    ) -> Self {
        let tests = tests
            .into_iter()
            .map(|test| (test.key.clone(), test))
            .collect();
        Self {
            tests,
            advice,
            severe_rules,
        }
    }

    /// Looks up a test by its canonical key.
    pub fn test(&self, key: &str) -> Option<&TestDefinition> {
        self.tests.get(key)
    }

    /// Whether the catalog knows the given test key.
    pub fn contains(&self, key: &str) -> bool {
        self.tests.contains_key(key)
    }

    /// All tests in curated order.
    pub fn tests(&self) -> impl Iterator<Item = &TestDefinition> {
        self.tests.values()
    }

    /// Number of tests in the catalog.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Looks up an advice text by its `{TEST}_{status}` key.
    pub fn advice(&self, key: &str) -> Option<&str> {
        self.advice.get(key).map(String::as_str)
    }

    /// Severity rules in evaluation order.
    pub fn severe_rules(&self) -> &[SevereRule] {
        &self.severe_rules
    }

    /// The curated catalog shipped with the application.
    pub fn builtin() -> Self {
        Self::new(builtin_tests(), builtin_advice(), builtin_severe_rules())
    }
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_tests() -> Vec<TestDefinition> {
    use AgeBucket::Pediatric;
    use Gender::{Female, Male};
    use TestCategory::*;

    let test = TestDefinition::new;

    vec![
        // Liver panel
        test(
            "ALT",
            "ALT (GPT)",
            Some("U/L"),
            Liver,
            vec![
                ReferenceRange::gender(Male, 0.0, 45.0),
                ReferenceRange::gender(Female, 0.0, 34.0),
            ],
        ),
        test(
            "AST",
            "AST (GOT)",
            Some("U/L"),
            Liver,
            vec![
                ReferenceRange::gender(Male, 0.0, 35.0),
                ReferenceRange::gender(Female, 0.0, 31.0),
            ],
        ),
        test("ALP", "ALP", Some("U/L"), Liver, vec![ReferenceRange::any(30.0, 120.0)]),
        test(
            "GGT",
            "GGT",
            Some("U/L"),
            Liver,
            vec![
                ReferenceRange::gender(Male, 0.0, 55.0),
                ReferenceRange::gender(Female, 0.0, 38.0),
            ],
        ),
        test(
            "BILIRUBIN_TOTAL",
            "Total bilirubin",
            Some("mg/dL"),
            Liver,
            vec![ReferenceRange::any(0.3, 1.2)],
        ),
        test(
            "BILIRUBIN_DIRECT",
            "Direct bilirubin",
            Some("mg/dL"),
            Liver,
            vec![ReferenceRange::any(0.0, 0.3)],
        ),
        test("ALBUMIN", "Albumin", Some("g/dL"), Liver, vec![ReferenceRange::any(3.5, 5.2)]),
        // Electrolytes
        test(
            "SODIUM",
            "Sodium (Na+)",
            Some("mEq/L"),
            Electrolytes,
            vec![ReferenceRange::any(135.0, 145.0)],
        ),
        test(
            "POTASSIUM",
            "Potassium (K+)",
            Some("mEq/L"),
            Electrolytes,
            vec![ReferenceRange::any(3.5, 5.1)],
        ),
        test(
            "CHLORIDE",
            "Chloride (Cl-)",
            Some("mEq/L"),
            Electrolytes,
            vec![ReferenceRange::any(98.0, 106.0)],
        ),
        test(
            "CALCIUM",
            "Calcium",
            Some("mg/dL"),
            Electrolytes,
            vec![ReferenceRange::any(8.5, 10.5)],
        ),
        test(
            "PHOSPHATE",
            "Phosphate",
            Some("mg/dL"),
            Electrolytes,
            vec![ReferenceRange::any(2.5, 4.5)],
        ),
        // Renal panel
        test("UREA", "Urea", Some("mg/dL"), Renal, vec![ReferenceRange::any(17.0, 43.0)]),
        test(
            "CREATININE",
            "Creatinine",
            Some("mg/dL"),
            Renal,
            vec![
                ReferenceRange::gender(Male, 0.67, 1.17),
                ReferenceRange::gender(Female, 0.51, 0.95),
            ],
        ),
        // Inflammation markers
        test("ESR", "ESR", Some("mm/h"), Inflammation, vec![ReferenceRange::any(0.0, 20.0)]),
        test("CRP", "CRP", Some("mg/dL"), Inflammation, vec![ReferenceRange::any(0.0, 0.5)]),
        // Metabolic
        test(
            "GLUCOSE_FASTING",
            "Fasting glucose",
            Some("mg/dL"),
            Metabolic,
            vec![ReferenceRange::any(70.0, 100.0)],
        ),
        // Lipids
        test(
            "TRIGLYCERIDES",
            "Triglycerides",
            Some("mg/dL"),
            Lipids,
            vec![
                ReferenceRange::bucket(Pediatric, 0.0, 90.0),
                ReferenceRange::any(0.0, 150.0),
            ],
        ),
        // Hematology
        test(
            "WBC",
            "WBC",
            Some("cells/µL"),
            Hematology,
            vec![ReferenceRange::any(4500.0, 11000.0)],
        ),
        test(
            "RBC",
            "RBC",
            Some("M/µL"),
            Hematology,
            vec![
                ReferenceRange::gender(Male, 4.5, 5.9),
                ReferenceRange::gender(Female, 4.1, 5.1),
            ],
        ),
        test(
            "HB",
            "Hemoglobin",
            Some("g/dL"),
            Hematology,
            vec![
                ReferenceRange::gender(Male, 13.5, 17.5),
                ReferenceRange::gender(Female, 11.5, 16.1),
            ],
        ),
        test(
            "HCT",
            "Hematocrit",
            Some("%"),
            Hematology,
            vec![
                ReferenceRange::gender(Male, 41.0, 53.0),
                ReferenceRange::gender(Female, 36.0, 46.0),
            ],
        ),
        test("MCV", "MCV", Some("fL"), Hematology, vec![ReferenceRange::any(80.0, 100.0)]),
        test("MCH", "MCH", Some("pg"), Hematology, vec![ReferenceRange::any(26.0, 34.0)]),
        test("MCHC", "MCHC", Some("g/dL"), Hematology, vec![ReferenceRange::any(31.0, 37.0)]),
        test("RDW", "RDW", Some("%"), Hematology, vec![ReferenceRange::any(11.5, 14.5)]),
        test(
            "PLT",
            "Platelets",
            Some("/µL"),
            Hematology,
            vec![ReferenceRange::any(150000.0, 450000.0)],
        ),
        test(
            "NEUTROPHILS_PCT",
            "Neutrophils (%)",
            Some("%"),
            Hematology,
            vec![ReferenceRange::any(42.0, 72.0)],
        ),
        test(
            "LYMPHOCYTES_PCT",
            "Lymphocytes (%)",
            Some("%"),
            Hematology,
            vec![ReferenceRange::any(25.0, 43.0)],
        ),
        test(
            "LYMPHOCYTES_ABS",
            "Lymphocytes (abs)",
            Some("K/µL"),
            Hematology,
            vec![ReferenceRange::any(1.3, 4.7)],
        ),
        test(
            "MONOCYTES_PCT",
            "Monocytes (%)",
            Some("%"),
            Hematology,
            vec![ReferenceRange::any(2.0, 9.0)],
        ),
        test(
            "MONOCYTES_ABS",
            "Monocytes (abs)",
            Some("K/µL"),
            Hematology,
            vec![ReferenceRange::any(0.1, 1.0)],
        ),
        test(
            "EOSINOPHILS_PCT",
            "Eosinophils (%)",
            Some("%"),
            Hematology,
            vec![ReferenceRange::any(0.0, 4.0)],
        ),
        test(
            "EOSINOPHILS_ABS",
            "Eosinophils (abs)",
            Some("K/µL"),
            Hematology,
            vec![ReferenceRange::any(0.0, 0.4)],
        ),
        test(
            "BASOPHILS_PCT",
            "Basophils (%)",
            Some("%"),
            Hematology,
            vec![ReferenceRange::any(0.0, 1.0)],
        ),
        test(
            "BASOPHILS_ABS",
            "Basophils (abs)",
            Some("K/µL"),
            Hematology,
            vec![ReferenceRange::any(0.0, 0.2)],
        ),
        test(
            "LUC_PCT",
            "Large unstained cells (%)",
            Some("%"),
            Hematology,
            vec![ReferenceRange::any(0.0, 4.0)],
        ),
        // Endocrine
        test("TSH", "TSH", Some("mIU/L"), Endocrine, vec![ReferenceRange::any(0.55, 4.78)]),
        // Micronutrients
        test(
            "FERRITIN",
            "Ferritin",
            Some("ng/mL"),
            Micronutrients,
            vec![ReferenceRange::any(10.0, 291.0)],
        ),
        test(
            "B12",
            "Vitamin B12",
            Some("pmol/L"),
            Micronutrients,
            vec![ReferenceRange::any(170.0, 712.0)],
        ),
        // Sample quality flags are qualitative and never classified.
        test("HEMOLYTIC_FLAG", "Hemolysis flag", None, SampleQuality, vec![]),
        test("LIPEMIC_FLAG", "Lipemia flag", None, SampleQuality, vec![]),
        test("ICTERIC_FLAG", "Icterus flag", None, SampleQuality, vec![]),
    ]
}

fn builtin_advice() -> IndexMap<String, String> {
    let entries = [
        (
            "SODIUM_low",
            "Review fluid and salt balance with a clinician; avoid drinking large \
             volumes of plain water until the cause is clarified.",
        ),
        (
            "SODIUM_high",
            "Make sure fluid intake is adequate and have the salt balance reviewed \
             by a clinician, promptly if the value is far above the range.",
        ),
        (
            "POTASSIUM_low",
            "Often improved through potassium-rich foods; review diuretics and \
             other medication with a clinician.",
        ),
        (
            "POTASSIUM_high",
            "Avoid potassium supplements and salt substitutes and seek medical \
             review, urgently if the value is well above the range.",
        ),
        (
            "ALT_high",
            "Avoid alcohol and medication that burdens the liver; discuss \
             follow-up liver testing with a clinician.",
        ),
        (
            "GGT_high",
            "Reduce alcohol intake and review current medication with a clinician.",
        ),
        (
            "GLUCOSE_FASTING_high",
            "Review diet and physical activity and arrange clinical follow-up of \
             fasting blood sugar.",
        ),
        (
            "FERRITIN_low",
            "Increase dietary iron intake; iron supplements only as directed by a \
             clinician.",
        ),
        (
            "B12_low",
            "Consider vitamin B12 supplementation as advised by a clinician or \
             dietitian.",
        ),
        (
            "default_low",
            "Discuss the low result with a clinician or dietitian and keep \
             monitoring the value.",
        ),
        (
            "default_high",
            "Discuss the elevated result with a clinician and arrange further \
             evaluation if it persists.",
        ),
    ];

    entries
        .into_iter()
        .map(|(key, text)| (key.to_string(), text.to_string()))
        .collect()
}

fn builtin_severe_rules() -> Vec<SevereRule> {
    vec![
        SevereRule::new(
            "SODIUM",
            SeverityCheck::Outside {
                low: 130.0,
                high: 150.0,
            },
        ),
        SevereRule::new(
            "POTASSIUM",
            SeverityCheck::Outside {
                low: 3.0,
                high: 5.5,
            },
        ),
        SevereRule::new("GLUCOSE_FASTING", SeverityCheck::AtOrAbove(126.0)),
        SevereRule::new("CRP", SeverityCheck::Above(3.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reference::Selector;

    #[test]
    fn test_builtin_catalog_size() {
        let catalog = ReferenceCatalog::builtin();
        assert_eq!(catalog.len(), 43);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_catalog_preserves_curated_order() {
        let catalog = ReferenceCatalog::builtin();
        let keys: Vec<&str> = catalog.tests().map(|t| t.key.as_str()).collect();

        assert_eq!(keys.first(), Some(&"ALT"));
        assert_eq!(keys.last(), Some(&"ICTERIC_FLAG"));

        // Electrolytes follow the liver panel.
        let sodium = keys.iter().position(|k| *k == "SODIUM").unwrap();
        let albumin = keys.iter().position(|k| *k == "ALBUMIN").unwrap();
        assert!(albumin < sodium);
    }

    #[test]
    fn test_gender_split_tests_carry_both_ranges() {
        let catalog = ReferenceCatalog::builtin();
        for key in ["ALT", "AST", "GGT", "CREATININE", "RBC", "HB", "HCT"] {
            let test = catalog.test(key).unwrap();
            assert!(
                test.range_for(Selector::Gender(Gender::Male)).is_some(),
                "{key} is missing a male range"
            );
            assert!(
                test.range_for(Selector::Gender(Gender::Female)).is_some(),
                "{key} is missing a female range"
            );
            assert!(test.range_for(Selector::Any).is_none());
        }
    }

    #[test]
    fn test_creatinine_bounds() {
        let catalog = ReferenceCatalog::builtin();
        let creatinine = catalog.test("CREATININE").unwrap();

        let male = creatinine.range_for(Selector::Gender(Gender::Male)).unwrap();
        assert_eq!((male.low, male.high), (0.67, 1.17));

        let female = creatinine.range_for(Selector::Gender(Gender::Female)).unwrap();
        assert_eq!((female.low, female.high), (0.51, 0.95));
    }

    #[test]
    fn test_triglycerides_have_pediatric_and_general_ranges() {
        let catalog = ReferenceCatalog::builtin();
        let tg = catalog.test("TRIGLYCERIDES").unwrap();

        let pediatric = tg.range_for(Selector::Bucket(AgeBucket::Pediatric)).unwrap();
        assert_eq!((pediatric.low, pediatric.high), (0.0, 90.0));

        let general = tg.range_for(Selector::Any).unwrap();
        assert_eq!((general.low, general.high), (0.0, 150.0));
    }

    #[test]
    fn test_sample_quality_flags_are_qualitative() {
        let catalog = ReferenceCatalog::builtin();
        for key in ["HEMOLYTIC_FLAG", "LIPEMIC_FLAG", "ICTERIC_FLAG"] {
            let flag = catalog.test(key).unwrap();
            assert!(flag.is_qualitative(), "{key} should carry no ranges");
            assert!(flag.unit.is_none());
            assert_eq!(flag.category, TestCategory::SampleQuality);
        }
    }

    #[test]
    fn test_luc_percentage_has_bounds() {
        let catalog = ReferenceCatalog::builtin();
        let luc = catalog.test("LUC_PCT").unwrap();
        let bounds = luc.range_for(Selector::Any).unwrap();
        assert_eq!((bounds.low, bounds.high), (0.0, 4.0));
    }

    #[test]
    fn test_advice_table_covers_defaults_and_known_specifics() {
        let catalog = ReferenceCatalog::builtin();
        assert!(catalog.advice("default_low").is_some());
        assert!(catalog.advice("default_high").is_some());

        for key in [
            "SODIUM_low",
            "SODIUM_high",
            "POTASSIUM_low",
            "POTASSIUM_high",
            "ALT_high",
            "GGT_high",
            "GLUCOSE_FASTING_high",
            "FERRITIN_low",
            "B12_low",
        ] {
            assert!(catalog.advice(key).is_some(), "missing advice for {key}");
        }

        assert!(catalog.advice("SODIUM_normal").is_none());
    }

    #[test]
    fn test_specific_advice_refers_to_catalog_tests() {
        let catalog = ReferenceCatalog::builtin();
        for key in catalog.advice.keys() {
            if key.starts_with("default_") {
                continue;
            }
            let test_key = key
                .strip_suffix("_low")
                .or_else(|| key.strip_suffix("_high"))
                .unwrap_or_else(|| panic!("advice key {key} has no status suffix"));
            assert!(
                catalog.contains(test_key),
                "advice {key} refers to unknown test {test_key}"
            );
        }
    }

    #[test]
    fn test_severe_rules_refer_to_catalog_tests() {
        let catalog = ReferenceCatalog::builtin();
        assert_eq!(catalog.severe_rules().len(), 4);
        for rule in catalog.severe_rules() {
            assert!(
                catalog.contains(&rule.test),
                "severity rule for unknown test {}",
                rule.test
            );
        }
    }

    #[test]
    fn test_quantitative_tests_have_units() {
        let catalog = ReferenceCatalog::builtin();
        for test in catalog.tests() {
            if !test.is_qualitative() {
                assert!(test.unit.is_some(), "{} has ranges but no unit", test.key);
            }
        }
    }

    #[test]
    fn test_labels_are_unique() {
        let catalog = ReferenceCatalog::builtin();
        let mut seen = std::collections::HashSet::new();
        for test in catalog.tests() {
            assert!(
                seen.insert(test.label.as_str()),
                "label {:?} is used by more than one test",
                test.label
            );
        }
    }
}
