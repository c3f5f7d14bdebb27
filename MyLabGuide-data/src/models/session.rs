use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::reference::Gender;

/// State accumulated by one pass through the report wizard.
///
/// The session is created with the patient's demographics and then
/// collects laboratory values until a report is requested. Values keep
/// their submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSession {
    /// Unique identifier, also used as the session cookie value.
    pub id: Uuid,
    /// Patient age in years.
    pub age: Option<u32>,
    /// Patient gender.
    pub gender: Option<Gender>,
    /// Submitted laboratory values keyed by canonical test key.
    pub values: IndexMap<String, f64>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last written to.
    pub updated_at: DateTime<Utc>,
}

impl WizardSession {
    /// Creates a fresh session with a random identifier.
    pub fn new(age: Option<u32>, gender: Option<Gender>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            age,
            gender,
            values: IndexMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the demographic answers and refreshes the write stamp.
    pub fn set_demographics(&mut self, age: u32, gender: Gender) {
        self.age = Some(age);
        self.gender = Some(gender);
        self.touch();
    }

    /// Merges submitted values into the session, overwriting repeats,
    /// and refreshes the write stamp.
    pub fn merge_values(&mut self, values: IndexMap<String, f64>) {
        for (key, value) in values {
            self.values.insert(key, value);
        }
        self.touch();
    }

    /// Whether both demographic answers have been captured.
    pub fn has_demographics(&self) -> bool {
        self.age.is_some() && self.gender.is_some()
    }

    /// Whether the session has outlived the given idle time.
    ///
    /// Expiry is measured from the last write, so every wizard step
    /// extends the session.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.updated_at + ttl < Utc::now()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
