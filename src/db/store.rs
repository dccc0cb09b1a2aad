//! Store abstraction shared by the MongoDB and in-memory backends

use async_trait::async_trait;

use crate::db::schemas::{ActivityDoc, AnalyticsEventDoc, AssessmentDoc, LeadDoc, LeadSource};
use crate::types::Result;

/// Score floor for a lead that submitted the contact form
pub const CONTACT_BASE_SCORE: i32 = 20;

/// Identity fields submitted with a contact form or assessment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadContact {
    pub email: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    /// Recorded only when the lead is created
    pub source: LeadSource,
}

/// Persistence operations used by the request handlers.
///
/// Find-or-create operations are atomic per key: concurrent calls with the
/// same email (or visitor id) resolve to the same lead.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Check the backing store is reachable
    async fn ping(&self) -> Result<()>;

    /// Find or create the lead for `contact.email`, then overwrite the
    /// profile fields that were supplied. Absent fields are left alone.
    async fn upsert_lead_by_email(&self, contact: LeadContact) -> Result<LeadDoc>;

    /// Find or create the anonymous placeholder lead for a visitor
    async fn resolve_visitor_lead(&self, visitor_id: &str) -> Result<LeadDoc>;

    async fn get_lead(&self, lead_id: &str) -> Result<Option<LeadDoc>>;

    /// Raise the lead score to at least [`CONTACT_BASE_SCORE`]
    async fn record_contact(&self, lead_id: &str) -> Result<()>;

    /// Raise the lead score to at least `score` and count the assessment
    async fn record_assessment_outcome(&self, lead_id: &str, score: i32) -> Result<()>;

    async fn insert_activity(&self, activity: ActivityDoc) -> Result<()>;

    async fn insert_analytics_event(&self, event: AnalyticsEventDoc) -> Result<()>;

    async fn insert_assessment(&self, assessment: AssessmentDoc) -> Result<()>;

    async fn get_assessment(&self, assessment_id: &str) -> Result<Option<AssessmentDoc>>;

    /// Identified leads (those with an email), newest first
    async fn list_leads(&self) -> Result<Vec<LeadDoc>>;
}

/// Canonical form used as the email key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Order leads by creation time, newest first; ties by lead id
pub fn sort_newest_first(leads: &mut [LeadDoc]) {
    leads.sort_by(|a, b| {
        b.metadata
            .created_at_millis()
            .cmp(&a.metadata.created_at_millis())
            .then_with(|| a.lead_id.cmp(&b.lead_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::Metadata;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }

    #[test]
    fn test_sort_newest_first() {
        let lead = |id: &str, millis: i64| LeadDoc {
            lead_id: id.to_string(),
            metadata: Metadata::at(bson::DateTime::from_millis(millis)),
            ..Default::default()
        };
        let mut leads = vec![lead("a", 1_000), lead("c", 3_000), lead("b", 3_000), lead("d", 2_000)];
        sort_newest_first(&mut leads);
        let ids: Vec<&str> = leads.iter().map(|l| l.lead_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "d", "a"]);
    }
}
