//! MongoDB lead store
//!
//! Find-or-create is a single `find_one_and_update` upsert against a unique
//! index. When two upserts race on the same key, the loser gets a
//! duplicate-key error and re-reads once without upserting.

use async_trait::async_trait;
use std::future::Future;
use bson::{doc, DateTime, Document};
use tracing::debug;
use uuid::Uuid;

use crate::db::mongo::{MongoClient, MongoCollection, UpsertError};
use crate::db::schemas::{
    ActivityDoc, AnalyticsEventDoc, AssessmentDoc, LeadDoc, LeadSource, ACTIVITY_COLLECTION,
    ANALYTICS_EVENT_COLLECTION, ASSESSMENT_COLLECTION, LEAD_COLLECTION,
};
use crate::db::store::{normalize_email, LeadContact, LeadStore, CONTACT_BASE_SCORE};
use crate::types::{LeadwayError, Result};

pub struct MongoStore {
    client: MongoClient,
    leads: MongoCollection<LeadDoc>,
    activities: MongoCollection<ActivityDoc>,
    events: MongoCollection<AnalyticsEventDoc>,
    assessments: MongoCollection<AssessmentDoc>,
}

impl MongoStore {
    /// Open all collections, creating their indexes
    pub async fn open(client: MongoClient) -> Result<Self> {
        let leads = client.collection::<LeadDoc>(LEAD_COLLECTION).await?;
        let activities = client.collection::<ActivityDoc>(ACTIVITY_COLLECTION).await?;
        let events = client
            .collection::<AnalyticsEventDoc>(ANALYTICS_EVENT_COLLECTION)
            .await?;
        let assessments = client
            .collection::<AssessmentDoc>(ASSESSMENT_COLLECTION)
            .await?;

        Ok(Self {
            client,
            leads,
            activities,
            events,
            assessments,
        })
    }

    /// Upsert a lead, resolving a duplicate-key race with one re-read
    async fn upsert_lead(&self, filter: Document, update: Document) -> Result<LeadDoc> {
        upsert_with_reread(|upsert| {
            if !upsert {
                debug!(?filter, "Lost lead upsert race, re-reading");
            }
            self.leads
                .find_one_and_update(filter.clone(), update.clone(), upsert)
        })
        .await
    }

    async fn update_lead(&self, lead_id: &str, update: Document) -> Result<()> {
        self.leads
            .find_one_and_update(doc! { "lead_id": lead_id }, update, false)
            .await?
            .map(|_| ())
            .ok_or_else(|| LeadwayError::NotFound(format!("Lead {} not found", lead_id)))
    }
}

/// `$setOnInsert` body for a new lead
fn new_lead_fields(source: LeadSource, now: DateTime) -> Document {
    doc! {
        "lead_id": Uuid::new_v4().to_string(),
        "source": source.as_str(),
        "lead_score": 0,
        "assessment_count": 0,
        "metadata.created_at": now,
        "metadata.is_deleted": false,
    }
}

#[async_trait]
impl LeadStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> Result<()> {
        self.client.ping().await
    }

    async fn upsert_lead_by_email(&self, contact: LeadContact) -> Result<LeadDoc> {
        let email = normalize_email(&contact.email);
        let now = DateTime::now();

        let mut set = doc! { "metadata.updated_at": now };
        for (field, value) in [
            ("name", contact.name),
            ("company", contact.company),
            ("website", contact.website),
            ("phone", contact.phone),
        ] {
            if let Some(value) = value {
                set.insert(field, value);
            }
        }

        let update = doc! {
            "$set": set,
            "$setOnInsert": new_lead_fields(contact.source, now),
        };

        self.upsert_lead(doc! { "email": email.as_str() }, update).await
    }

    async fn resolve_visitor_lead(&self, visitor_id: &str) -> Result<LeadDoc> {
        let mut on_insert = new_lead_fields(LeadSource::Anonymous, DateTime::now());
        on_insert.insert("metadata.updated_at", DateTime::now());

        let update = doc! { "$setOnInsert": on_insert };
        self.upsert_lead(doc! { "visitor_id": visitor_id }, update).await
    }

    async fn get_lead(&self, lead_id: &str) -> Result<Option<LeadDoc>> {
        self.leads.find_one(doc! { "lead_id": lead_id }).await
    }

    async fn record_contact(&self, lead_id: &str) -> Result<()> {
        let update = doc! {
            "$max": { "lead_score": CONTACT_BASE_SCORE },
            "$set": { "metadata.updated_at": DateTime::now() },
        };
        self.update_lead(lead_id, update).await
    }

    async fn record_assessment_outcome(&self, lead_id: &str, score: i32) -> Result<()> {
        let update = doc! {
            "$max": { "lead_score": score },
            "$inc": { "assessment_count": 1 },
            "$set": { "metadata.updated_at": DateTime::now() },
        };
        self.update_lead(lead_id, update).await
    }

    async fn insert_activity(&self, activity: ActivityDoc) -> Result<()> {
        self.activities.insert_one(activity).await.map(|_| ())
    }

    async fn insert_analytics_event(&self, event: AnalyticsEventDoc) -> Result<()> {
        self.events.insert_one(event).await.map(|_| ())
    }

    async fn insert_assessment(&self, assessment: AssessmentDoc) -> Result<()> {
        self.assessments.insert_one(assessment).await.map(|_| ())
    }

    async fn get_assessment(&self, assessment_id: &str) -> Result<Option<AssessmentDoc>> {
        self.assessments
            .find_one(doc! { "assessment_id": assessment_id })
            .await
    }

    async fn list_leads(&self) -> Result<Vec<LeadDoc>> {
        self.leads
            .find_sorted(
                doc! { "email": { "$exists": true } },
                doc! { "metadata.created_at": -1, "lead_id": 1 },
            )
            .await
    }
}

/// Run `attempt(true)` as an upsert. When another writer won the insert
/// race, run `attempt(false)` once against the document it created.
async fn upsert_with_reread<T, F, Fut>(mut attempt: F) -> Result<T>
where
    F: FnMut(bool) -> Fut,
    Fut: Future<Output = std::result::Result<Option<T>, UpsertError>>,
{
    match attempt(true).await {
        Ok(Some(found)) => Ok(found),
        Ok(None) => Err(LeadwayError::Database("Upsert returned no lead".into())),
        Err(UpsertError::DuplicateKey) => attempt(false)
            .await?
            .ok_or_else(|| LeadwayError::Database("Lead missing after duplicate key".into())),
        Err(UpsertError::Other(e)) => Err(e),
    }
}
