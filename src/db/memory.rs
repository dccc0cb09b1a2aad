//! In-memory lead store
//!
//! Used in dev mode when MongoDB is unreachable, and by the tests. Keys are
//! claimed through the `DashMap` entry API, which holds the shard lock for
//! the duration of the find-or-create.

use async_trait::async_trait;
use bson::DateTime;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::db::schemas::{ActivityDoc, AnalyticsEventDoc, AssessmentDoc, LeadDoc, Metadata};
use crate::db::store::{normalize_email, sort_newest_first, LeadContact, LeadStore, CONTACT_BASE_SCORE};
use crate::types::{LeadwayError, Result};

#[derive(Default)]
pub struct MemoryStore {
    /// lead_id -> lead
    leads: DashMap<String, LeadDoc>,
    /// normalized email -> lead_id
    by_email: DashMap<String, String>,
    /// visitor_id -> lead_id
    by_visitor: DashMap<String, String>,
    activities: Mutex<Vec<ActivityDoc>>,
    events: Mutex<Vec<AnalyticsEventDoc>>,
    /// assessment_id -> assessment
    assessments: DashMap<String, AssessmentDoc>,
    /// Last issued timestamp, so creation order is strict
    clock: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time, strictly after every timestamp issued before
    fn tick(&self) -> DateTime {
        let now = DateTime::now().timestamp_millis();
        let mut last = self.clock.load(Ordering::SeqCst);
        loop {
            let next = now.max(last + 1);
            match self
                .clock
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return DateTime::from_millis(next),
                Err(current) => last = current,
            }
        }
    }

    /// Activities recorded for a lead, oldest first
    pub fn activities_for(&self, lead_id: &str) -> Vec<ActivityDoc> {
        self.activities
            .lock()
            .map(|all| all.iter().filter(|a| a.lead_id == lead_id).cloned().collect())
            .unwrap_or_default()
    }

    /// Number of analytics events recorded
    pub fn events_len(&self) -> usize {
        self.events.lock().map(|all| all.len()).unwrap_or(0)
    }

    /// Number of leads, including anonymous placeholders
    pub fn leads_len(&self) -> usize {
        self.leads.len()
    }

    fn new_lead(&self, build: impl FnOnce(String) -> LeadDoc) -> String {
        let lead_id = Uuid::new_v4().to_string();
        let mut lead = build(lead_id.clone());
        lead.metadata = Metadata::at(self.tick());
        self.leads.insert(lead_id.clone(), lead);
        lead_id
    }

    fn update_lead(&self, lead_id: &str, apply: impl FnOnce(&mut LeadDoc)) -> Result<()> {
        let now = self.tick();
        let mut lead = self
            .leads
            .get_mut(lead_id)
            .ok_or_else(|| LeadwayError::NotFound(format!("Lead {} not found", lead_id)))?;
        apply(lead.value_mut());
        lead.metadata.updated_at = Some(now);
        Ok(())
    }

    fn lead(&self, lead_id: &str) -> Result<LeadDoc> {
        self.leads
            .get(lead_id)
            .map(|l| l.value().clone())
            .ok_or_else(|| LeadwayError::Database(format!("Lead {} vanished", lead_id)))
    }

    fn push<T>(list: &Mutex<Vec<T>>, item: T) -> Result<()> {
        list.lock()
            .map_err(|_| LeadwayError::Internal("Memory store lock poisoned".into()))?
            .push(item);
        Ok(())
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert_lead_by_email(&self, contact: LeadContact) -> Result<LeadDoc> {
        let email = normalize_email(&contact.email);
        let lead_id = self
            .by_email
            .entry(email.clone())
            .or_insert_with(|| {
                self.new_lead(|id| LeadDoc::identified(id, email.clone(), contact.source))
            })
            .value()
            .clone();

        self.update_lead(&lead_id, |lead| {
            let LeadContact {
                name,
                company,
                website,
                phone,
                ..
            } = contact;
            if name.is_some() {
                lead.name = name;
            }
            if company.is_some() {
                lead.company = company;
            }
            if website.is_some() {
                lead.website = website;
            }
            if phone.is_some() {
                lead.phone = phone;
            }
        })?;

        self.lead(&lead_id)
    }

    async fn resolve_visitor_lead(&self, visitor_id: &str) -> Result<LeadDoc> {
        let lead_id = self
            .by_visitor
            .entry(visitor_id.to_string())
            .or_insert_with(|| {
                self.new_lead(|id| LeadDoc::anonymous(id, visitor_id.to_string()))
            })
            .value()
            .clone();

        self.lead(&lead_id)
    }

    async fn get_lead(&self, lead_id: &str) -> Result<Option<LeadDoc>> {
        Ok(self.leads.get(lead_id).map(|l| l.value().clone()))
    }

    async fn record_contact(&self, lead_id: &str) -> Result<()> {
        self.update_lead(lead_id, |lead| {
            lead.lead_score = lead.lead_score.max(CONTACT_BASE_SCORE);
        })
    }

    async fn record_assessment_outcome(&self, lead_id: &str, score: i32) -> Result<()> {
        self.update_lead(lead_id, |lead| {
            lead.lead_score = lead.lead_score.max(score);
            lead.assessment_count += 1;
        })
    }

    async fn insert_activity(&self, mut activity: ActivityDoc) -> Result<()> {
        activity.metadata = Metadata::at(self.tick());
        Self::push(&self.activities, activity)
    }

    async fn insert_analytics_event(&self, mut event: AnalyticsEventDoc) -> Result<()> {
        event.metadata = Metadata::at(self.tick());
        Self::push(&self.events, event)
    }

    async fn insert_assessment(&self, mut assessment: AssessmentDoc) -> Result<()> {
        assessment.metadata = Metadata::at(self.tick());
        self.assessments
            .insert(assessment.assessment_id.clone(), assessment);
        Ok(())
    }

    async fn get_assessment(&self, assessment_id: &str) -> Result<Option<AssessmentDoc>> {
        Ok(self.assessments.get(assessment_id).map(|a| a.value().clone()))
    }

    async fn list_leads(&self) -> Result<Vec<LeadDoc>> {
        let mut leads: Vec<LeadDoc> = self
            .leads
            .iter()
            .filter(|l| !l.is_anonymous())
            .map(|l| l.value().clone())
            .collect();
        sort_newest_first(&mut leads);
        Ok(leads)
    }
}
