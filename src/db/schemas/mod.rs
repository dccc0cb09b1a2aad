//! Database schemas for Leadway
//!
//! MongoDB document structures for leads, activities, analytics events and
//! assessments.

mod activity;
mod analytics_event;
mod assessment;
mod lead;
mod metadata;

pub use activity::{ActivityDoc, ACTIVITY_COLLECTION};
pub use analytics_event::{AnalyticsEventDoc, ClientInfo, ANALYTICS_EVENT_COLLECTION};
pub use assessment::{AssessmentDoc, ASSESSMENT_COLLECTION};
pub use lead::{LeadDoc, LeadSource, LEAD_COLLECTION};
pub use metadata::Metadata;
