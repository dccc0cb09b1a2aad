//! Three-phase recommendation plan

use serde::{Deserialize, Serialize};

use super::{Category, Subscores};

/// One phase of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPhase {
    pub name: String,
    pub timeframe: String,
    pub actions: Vec<String>,
}

impl PlanPhase {
    fn new(name: &str, timeframe: &str, actions: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            timeframe: timeframe.to_string(),
            actions,
        }
    }
}

/// Most quick-win actions in the first phase
const MAX_QUICK_WINS: usize = 2;

fn quick_action(category: Category) -> &'static str {
    match category {
        Category::OnlinePresence => "Claim and complete your Google Business Profile and fix basic on-page SEO",
        Category::LeadGeneration => "Add a clear lead magnet and a contact call-to-action to every key page",
        Category::ConversionReadiness => "Install analytics and conversion tracking on your contact and booking forms",
        Category::GrowthCapacity => "Pick one channel to own and block out weekly time for it",
    }
}

fn build_action(category: Category) -> &'static str {
    match category {
        Category::OnlinePresence => "Refresh the website around your top three services with location pages",
        Category::LeadGeneration => "Launch a monthly content and email cadence aimed at your best customers",
        Category::ConversionReadiness => "Set up automated follow-up so every enquiry gets a reply within a day",
        Category::GrowthCapacity => "Document your sales process and set a marketing budget you can sustain",
    }
}

fn scale_action(category: Category) -> &'static str {
    match category {
        Category::OnlinePresence => "Turn your traffic into authority with case studies and reviews",
        Category::LeadGeneration => "Double down on the channel with the lowest cost per lead",
        Category::ConversionReadiness => "A/B test offers and landing pages to lift conversion further",
        Category::GrowthCapacity => "Delegate or outsource execution so growth doesn't depend on you",
    }
}

fn goal_action(goal: &str) -> Option<&'static str> {
    match goal {
        "more_leads" => Some("Expand into a second acquisition channel once the first is profitable"),
        "better_conversion" => Some("Review the full funnel quarterly and fix the weakest step first"),
        "brand_awareness" => Some("Build partnerships and PR that put your name in front of new audiences"),
        "scale_operations" => Some("Connect marketing and CRM data so capacity planning follows demand"),
        _ => None,
    }
}

/// Build the plan from ranked categories.
///
/// Quick wins and the build phase work from the weakest category up; the
/// scale phase leans on strengths and the stated goal. Every phase has at
/// least one action.
pub(crate) fn build_plan(
    subscores: &Subscores,
    strengths: &[Category],
    gaps: &[Category],
    goal: &str,
) -> Vec<PlanPhase> {
    let mut weakest_first: Vec<Category> = Category::ALL.to_vec();
    weakest_first.sort_by_key(|c| subscores.get(*c));

    let quick: Vec<String> = if gaps.is_empty() {
        vec![quick_action(weakest_first[0]).to_string()]
    } else {
        gaps.iter()
            .take(MAX_QUICK_WINS)
            .map(|c| quick_action(*c).to_string())
            .collect()
    };

    let mut build: Vec<String> = weakest_first
        .iter()
        .filter(|c| !strengths.contains(c))
        .map(|c| build_action(*c).to_string())
        .collect();
    if build.is_empty() {
        build.push("Document the playbook behind your strongest channels so it can be repeated".to_string());
    }

    let mut scale: Vec<String> = strengths.iter().map(|c| scale_action(*c).to_string()).collect();
    if let Some(action) = goal_action(goal) {
        scale.push(action.to_string());
    }
    if scale.is_empty() {
        scale.push("Retake this assessment after 90 days to measure progress".to_string());
    }

    vec![
        PlanPhase::new("Quick wins", "0-30 days", quick),
        PlanPhase::new("Build", "30-90 days", build),
        PlanPhase::new("Scale", "90+ days", scale),
    ]
}
