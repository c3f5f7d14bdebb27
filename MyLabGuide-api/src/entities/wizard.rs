use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use my_lab_guide_data::models::session::WizardSession;

/// Request payload for starting (or restarting) the report wizard
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StartWizardRequest {
    /// Patient age in years
    #[validate(range(max = 120, message = "Age must be between 0 and 120"))]
    pub age: u32,

    /// Patient gender tag ("male", "female" or "unknown")
    #[validate(custom = "validate_gender_tag")]
    #[schema(example = "female")]
    pub gender: String,
}

/// Request payload for submitting laboratory values to the wizard
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitValuesRequest {
    /// Map of canonical test keys to measured values.
    /// Keys are matched case-insensitively against the catalog.
    pub values: IndexMap<String, f64>,
}

/// Public representation of a wizard session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicWizardSession {
    /// Session identifier, also carried by the session cookie
    pub id: Uuid,

    /// Patient age in years, once the demographics step is done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    /// Patient gender tag, once the demographics step is done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    /// Laboratory values submitted so far, in submission order
    pub values: IndexMap<String, f64>,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// When the session was last written to
    pub updated_at: DateTime<Utc>,
}

impl From<WizardSession> for PublicWizardSession {
    fn from(session: WizardSession) -> Self {
        Self {
            id: session.id,
            age: session.age,
            gender: session.gender.map(|g| g.as_tag().to_string()),
            values: session.values,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

fn validate_gender_tag(tag: &str) -> Result<(), ValidationError> {
    match tag.to_ascii_lowercase().as_str() {
        "male" | "female" | "unknown" => Ok(()),
        _ => Err(ValidationError::new("unknown_gender_tag")),
    }
}
