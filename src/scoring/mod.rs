//! Lead-scoring assessment
//!
//! A fixed questionnaire maps to four subscores of 0-25 each, an overall
//! score in `[0, 100]`, a tier, ordered strengths and gaps, and a
//! three-phase plan. Scoring is pure: no clock, no randomness. A
//! text-generation backend may add a narrative on top, and any failure there
//! leaves the numeric report untouched.

pub mod engine;
pub mod narrative;
pub mod plan;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub use engine::score;
pub use narrative::{
    augment, parse_model_json, ExtractError, Narrative, NarrativeOutcome, NarrativeStatus,
    ParseMethod, ParsedNarrative,
};
pub use plan::PlanPhase;

/// Maximum points a single category can earn
pub const MAX_SUBSCORE: u32 = 25;

/// Categories scoring at least this much are strengths
pub const STRENGTH_THRESHOLD: u32 = 18;

/// Categories scoring below this are gaps
pub const GAP_THRESHOLD: u32 = 13;

/// Answers to the assessment questionnaire.
///
/// Every field is optional on the wire. `null`, a wrong-typed value or an
/// unrecognised answer is treated as unanswered and earns 0 for its question.
/// Non-string list entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Questionnaire {
    #[serde(deserialize_with = "lenient_opt_string")]
    pub website_url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(deserialize_with = "lenient_string")]
    pub company_size: String,
    #[serde(deserialize_with = "lenient_string")]
    pub monthly_visitors: String,
    #[serde(deserialize_with = "lenient_list")]
    pub lead_gen_methods: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub challenges: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub budget: String,
    #[serde(deserialize_with = "lenient_string")]
    pub goal: String,
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Scored category, in fixed tie-break order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    OnlinePresence,
    LeadGeneration,
    ConversionReadiness,
    GrowthCapacity,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::OnlinePresence,
        Category::LeadGeneration,
        Category::ConversionReadiness,
        Category::GrowthCapacity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::OnlinePresence => "online_presence",
            Category::LeadGeneration => "lead_generation",
            Category::ConversionReadiness => "conversion_readiness",
            Category::GrowthCapacity => "growth_capacity",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::OnlinePresence => "Online presence",
            Category::LeadGeneration => "Lead generation",
            Category::ConversionReadiness => "Conversion readiness",
            Category::GrowthCapacity => "Growth capacity",
        }
    }
}

/// Per-category points, each `0..=25`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscores {
    pub online_presence: u32,
    pub lead_generation: u32,
    pub conversion_readiness: u32,
    pub growth_capacity: u32,
}

impl Subscores {
    pub fn get(&self, category: Category) -> u32 {
        match category {
            Category::OnlinePresence => self.online_presence,
            Category::LeadGeneration => self.lead_generation,
            Category::ConversionReadiness => self.conversion_readiness,
            Category::GrowthCapacity => self.growth_capacity,
        }
    }

    pub fn total(&self) -> u32 {
        Category::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Overall maturity band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Foundation,
    Developing,
    Established,
}

impl Tier {
    pub fn for_score(score: u32) -> Self {
        match score {
            s if s < 40 => Tier::Foundation,
            s if s < 70 => Tier::Developing,
            _ => Tier::Established,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Foundation => "foundation",
            Tier::Developing => "developing",
            Tier::Established => "established",
        }
    }
}

/// Deterministic assessment result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Sum of the subscores, `0..=100`
    pub score: u32,
    pub subscores: Subscores,
    pub tier: Tier,
    /// Strongest first
    pub strengths: Vec<Category>,
    /// Weakest first
    pub gaps: Vec<Category>,
    /// Exactly three phases
    pub plan: Vec<PlanPhase>,
}
