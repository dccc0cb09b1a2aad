//! Assessment submissions

use serde::Deserialize;
use serde_json::Value;

use super::{is_plausible_email, non_blank, IntakeError};
use crate::db::schemas::LeadSource;
use crate::db::LeadContact;
use crate::scoring::Questionnaire;
use crate::tools::DEFAULT_TOOL_ID;

/// Raw `POST /assessment` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AssessmentSubmission {
    pub email: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub tool_id: Option<String>,
    pub answers: Option<Questionnaire>,
}

/// Validated assessment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidAssessment {
    pub contact: LeadContact,
    pub tool_id: String,
    pub answers: Questionnaire,
}

impl AssessmentSubmission {
    pub fn from_value(value: Value) -> Result<Self, IntakeError> {
        serde_json::from_value(value).map_err(|_| IntakeError::Malformed)
    }

    /// Requires a plausible `email` and the `answers` object
    pub fn validate(self) -> Result<ValidAssessment, IntakeError> {
        let (Some(email), Some(answers)) = (non_blank(self.email), self.answers) else {
            return Err(IntakeError::MissingFields);
        };
        if !is_plausible_email(&email) {
            return Err(IntakeError::InvalidEmail);
        }

        Ok(ValidAssessment {
            contact: LeadContact {
                email,
                name: non_blank(self.name),
                company: non_blank(self.company),
                website: non_blank(answers.website_url.clone()),
                phone: non_blank(self.phone),
                source: LeadSource::Assessment,
            },
            tool_id: non_blank(self.tool_id).unwrap_or_else(|| DEFAULT_TOOL_ID.to_string()),
            answers,
        })
    }
}
