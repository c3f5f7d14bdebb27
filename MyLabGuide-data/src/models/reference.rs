use serde::{Deserialize, Serialize};
use std::fmt;

/// Age below which the pediatric reference ranges apply.
pub const PEDIATRIC_AGE_LIMIT: u32 = 18;

/// Patient gender as used for reference range resolution.
///
/// Anything outside the two recognised tags is treated as `Unknown`,
/// which only ever matches gender-free selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// Parses a gender tag, mapping unrecognised input to `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    /// The lowercase wire tag for this gender.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// Coarse age bucket derived from the patient's age in years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeBucket {
    Pediatric,
    Adult,
}

impl AgeBucket {
    /// Buckets an age in years. A missing age counts as adult.
    pub fn from_age(age: Option<u32>) -> Self {
        match age {
            Some(years) if years < PEDIATRIC_AGE_LIMIT => AgeBucket::Pediatric,
            _ => AgeBucket::Adult,
        }
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeBucket::Pediatric => write!(f, "pediatric"),
            AgeBucket::Adult => write!(f, "adult"),
        }
    }
}

/// Population selector attached to a reference range.
///
/// Resolution walks selectors from most to least specific, so a range
/// for pediatric males beats a plain pediatric range, which beats a
/// plain gender range, which beats `Any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Applies to everyone.
    Any,
    /// Applies to one gender across all ages.
    Gender(Gender),
    /// Applies to one age bucket across genders.
    Bucket(AgeBucket),
    /// Applies to one age bucket and one gender.
    BucketGender(AgeBucket, Gender),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Any => write!(f, "any"),
            Selector::Gender(g) => write!(f, "{g}"),
            Selector::Bucket(b) => write!(f, "{b}"),
            Selector::BucketGender(b, g) => write!(f, "{b}_{g}"),
        }
    }
}

/// Inclusive lower and upper bound of a reference interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Inclusive lower bound.
    pub low: f64,
    /// Inclusive upper bound.
    pub high: f64,
}

impl Bounds {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Whether a value falls inside the interval, bounds included.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// One reference interval limited to a population selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRange {
    /// Population the interval applies to.
    pub selector: Selector,
    /// The interval itself.
    pub bounds: Bounds,
}

impl ReferenceRange {
    pub fn new(selector: Selector, low: f64, high: f64) -> Self {
        Self {
            selector,
            bounds: Bounds::new(low, high),
        }
    }

    /// Interval that applies to everyone.
    pub fn any(low: f64, high: f64) -> Self {
        Self::new(Selector::Any, low, high)
    }

    /// Interval limited to a single gender.
    pub fn gender(gender: Gender, low: f64, high: f64) -> Self {
        Self::new(Selector::Gender(gender), low, high)
    }

    /// Interval limited to an age bucket.
    pub fn bucket(bucket: AgeBucket, low: f64, high: f64) -> Self {
        Self::new(Selector::Bucket(bucket), low, high)
    }

    /// Interval limited to an age bucket and a gender.
    pub fn bucket_gender(bucket: AgeBucket, gender: Gender, low: f64, high: f64) -> Self {
        Self::new(Selector::BucketGender(bucket, gender), low, high)
    }
}

/// Broad panel grouping used when browsing the reference catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    Liver,
    Electrolytes,
    Renal,
    Inflammation,
    Metabolic,
    Lipids,
    Hematology,
    Endocrine,
    Micronutrients,
    SampleQuality,
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestCategory::Liver => "liver",
            TestCategory::Electrolytes => "electrolytes",
            TestCategory::Renal => "renal",
            TestCategory::Inflammation => "inflammation",
            TestCategory::Metabolic => "metabolic",
            TestCategory::Lipids => "lipids",
            TestCategory::Hematology => "hematology",
            TestCategory::Endocrine => "endocrine",
            TestCategory::Micronutrients => "micronutrients",
            TestCategory::SampleQuality => "sample_quality",
        };
        write!(f, "{name}")
    }
}

/// A single laboratory test known to the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TestDefinition {
    /// Canonical uppercase identifier, e.g. `SODIUM`.
    pub key: String,
    /// Human readable name shown on reports.
    pub label: String,
    /// Measurement unit, absent for qualitative flags.
    pub unit: Option<String>,
    /// Panel the test belongs to.
    pub category: TestCategory,
    /// Reference intervals, one per population selector.
    ///
    /// Qualitative tests carry no intervals and always classify as
    /// normal.
    pub ranges: Vec<ReferenceRange>,
}

impl TestDefinition {
    pub fn new(
        key: &str,
        label: &str,
        unit: Option<&str>,
        category: TestCategory,
        ranges: Vec<ReferenceRange>,
    ) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            unit: unit.map(str::to_string),
            category,
            ranges,
        }
    }

    /// Whether the test has no quantitative reference intervals.
    pub fn is_qualitative(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The interval registered for an exact selector, if any.
    pub fn range_for(&self, selector: Selector) -> Option<Bounds> {
        self.ranges
            .iter()
            .find(|range| range.selector == selector)
            .map(|range| range.bounds)
    }
}

/// Threshold check used to decide whether a value is severely abnormal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeverityCheck {
    /// Severe when the value is strictly below the threshold.
    Below(f64),
    /// Severe when the value is strictly above the threshold.
    Above(f64),
    /// Severe when the value reaches or exceeds the threshold.
    AtOrAbove(f64),
    /// Severe when the value leaves the inclusive window.
    Outside { low: f64, high: f64 },
}

impl SeverityCheck {
    /// Whether the given value trips this check.
    pub fn is_triggered(&self, value: f64) -> bool {
        match *self {
            SeverityCheck::Below(limit) => value < limit,
            SeverityCheck::Above(limit) => value > limit,
            SeverityCheck::AtOrAbove(limit) => value >= limit,
            SeverityCheck::Outside { low, high } => value < low || value > high,
        }
    }
}

/// Severity rule tying a threshold check to one catalog test.
#[derive(Debug, Clone, PartialEq)]
pub struct SevereRule {
    /// Key of the test the rule watches.
    pub test: String,
    /// Check applied to that test's submitted value.
    pub check: SeverityCheck,
}

impl SevereRule {
    pub fn new(test: &str, check: SeverityCheck) -> Self {
        Self {
            test: test.to_string(),
            check,
        }
    }
}
