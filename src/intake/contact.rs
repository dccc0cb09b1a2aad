//! Contact form submissions

use serde::Deserialize;
use serde_json::Value;

use super::{is_plausible_email, non_blank, IntakeError};
use crate::db::schemas::LeadSource;
use crate::db::LeadContact;

/// Raw `POST /contact` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub page: Option<String>,
}

/// Validated contact form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactForm {
    pub contact: LeadContact,
    pub message: Option<String>,
    pub page: Option<String>,
}

impl ContactSubmission {
    pub fn from_value(value: Value) -> Result<Self, IntakeError> {
        serde_json::from_value(value).map_err(|_| IntakeError::Malformed)
    }

    /// Requires `name` and a plausible `email`
    pub fn validate(self) -> Result<ContactForm, IntakeError> {
        let (Some(name), Some(email)) = (non_blank(self.name), non_blank(self.email)) else {
            return Err(IntakeError::MissingFields);
        };
        if !is_plausible_email(&email) {
            return Err(IntakeError::InvalidEmail);
        }

        Ok(ContactForm {
            contact: LeadContact {
                email,
                name: Some(name),
                company: non_blank(self.company),
                website: non_blank(self.website),
                phone: non_blank(self.phone),
                source: LeadSource::ContactForm,
            },
            message: non_blank(self.message),
            page: non_blank(self.page),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<ContactForm, IntakeError> {
        ContactSubmission::from_value(value)?.validate()
    }

    #[test]
    fn test_valid_contact() {
        let form = parse(json!({
            "name": " Jane Doe ",
            "email": "jane@example.com",
            "company": "Acme",
            "phone": "",
            "message": "Call me",
        }))
        .unwrap();

        assert_eq!(form.contact.name.as_deref(), Some("Jane Doe"));
        assert_eq!(form.contact.company.as_deref(), Some("Acme"));
        assert!(form.contact.phone.is_none());
        assert_eq!(form.contact.source, LeadSource::ContactForm);
        assert_eq!(form.message.as_deref(), Some("Call me"));
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(parse(json!({"email": "jane@example.com"})), Err(IntakeError::MissingFields));
        assert_eq!(parse(json!({"name": "Jane"})), Err(IntakeError::MissingFields));
    }

    #[test]
    fn test_bad_email() {
        assert_eq!(
            parse(json!({"name": "Jane", "email": "jane-at-example"})),
            Err(IntakeError::InvalidEmail)
        );
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        assert_eq!(
            parse(json!({"name": 42, "email": "jane@example.com"})).unwrap_err(),
            IntakeError::Malformed
        );
    }
}
