//! Narrative augmentation
//!
//! The model is asked for `{summary, insights[], next_steps[]}`. Its reply is
//! parsed strictly first; failing that, the first balanced JSON object found
//! within the scan limit is parsed instead. Anything else is an
//! [`ExtractError`] and the report ships without a narrative.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::{Questionnaire, ScoreReport};
use crate::llm::{CompletionRequest, LlmBackend};

/// Bytes of model output scanned for an embedded JSON object
pub const MAX_SCAN_BYTES: usize = 64 * 1024;

const SYSTEM_PROMPT: &str = "You are a marketing consultant for small businesses. \
Given a lead-generation assessment, reply with a single JSON object of the form \
{\"summary\": string, \"insights\": [string], \"next_steps\": [string]}. \
Keep the summary under 80 words. Do not include any text outside the JSON object.";

/// Model-written commentary on a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub summary: String,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// How the narrative was obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeStatus {
    /// Model output parsed as-is
    Generated,
    /// Parsed from a JSON object embedded in surrounding text
    Extracted,
    /// No backend configured
    #[default]
    Unavailable,
    /// Backend error or unparseable output
    Failed,
}

impl NarrativeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrativeStatus::Generated => "generated",
            NarrativeStatus::Extracted => "extracted",
            NarrativeStatus::Unavailable => "unavailable",
            NarrativeStatus::Failed => "failed",
        }
    }
}

/// Which parse step succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMethod {
    Strict,
    Extracted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedNarrative {
    pub narrative: Narrative,
    pub method: ParseMethod,
}

/// Model output could not be turned into a [`Narrative`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("no JSON object in model output")]
    NoJsonObject,

    #[error("JSON object is not closed within {0} bytes")]
    Unbalanced(usize),

    #[error("JSON object does not match the narrative shape: {0}")]
    Invalid(String),
}

/// Parse model output into a narrative.
///
/// Never returns partially-parsed data: either a full, non-empty narrative
/// or an error.
pub fn parse_model_json(text: &str) -> Result<ParsedNarrative, ExtractError> {
    if let Ok(narrative) = serde_json::from_str::<Narrative>(text.trim()) {
        if is_usable(&narrative) {
            return Ok(ParsedNarrative {
                narrative,
                method: ParseMethod::Strict,
            });
        }
    }

    let candidate = first_json_object(text)?;
    let narrative: Narrative =
        serde_json::from_str(candidate).map_err(|e| ExtractError::Invalid(e.to_string()))?;

    if !is_usable(&narrative) {
        return Err(ExtractError::Invalid("empty summary".to_string()));
    }

    Ok(ParsedNarrative {
        narrative,
        method: ParseMethod::Extracted,
    })
}

fn is_usable(narrative: &Narrative) -> bool {
    !narrative.summary.trim().is_empty()
}

/// Slice of the first balanced `{...}` in `text`, scanning at most
/// [`MAX_SCAN_BYTES`]. Braces inside JSON strings are ignored.
fn first_json_object(text: &str) -> Result<&str, ExtractError> {
    let bytes = text.as_bytes();
    let limit = bytes.len().min(MAX_SCAN_BYTES);

    let start = bytes[..limit]
        .iter()
        .position(|b| *b == b'{')
        .ok_or(ExtractError::NoJsonObject)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in bytes[start..limit].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    // Both ends are ASCII braces, so the slice is on char boundaries
                    return Ok(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    Err(ExtractError::Unbalanced(MAX_SCAN_BYTES))
}

/// Narrative result attached to an assessment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrativeOutcome {
    pub narrative: Option<Narrative>,
    pub status: NarrativeStatus,
}

/// Ask `backend` to narrate `report`. Failures degrade to no narrative.
pub async fn augment(
    backend: Option<&dyn LlmBackend>,
    answers: &Questionnaire,
    report: &ScoreReport,
    max_tokens: u32,
) -> NarrativeOutcome {
    let Some(backend) = backend else {
        return NarrativeOutcome {
            narrative: None,
            status: NarrativeStatus::Unavailable,
        };
    };

    let request = CompletionRequest::user(prompt(answers, report))
        .with_system(SYSTEM_PROMPT)
        .with_max_tokens(max_tokens)
        .with_temperature(0.4)
        .with_json_output();

    let response = match backend.complete(request).await {
        Ok(response) => response,
        Err(e) => {
            warn!(backend = backend.id(), error = %e, "Narrative generation failed");
            return failed();
        }
    };

    debug!(
        backend = backend.id(),
        tokens = response.usage.total(),
        "Narrative generated"
    );

    match parse_model_json(&response.content) {
        Ok(parsed) => NarrativeOutcome {
            narrative: Some(parsed.narrative),
            status: match parsed.method {
                ParseMethod::Strict => NarrativeStatus::Generated,
                ParseMethod::Extracted => NarrativeStatus::Extracted,
            },
        },
        Err(e) => {
            warn!(backend = backend.id(), error = %e, "Discarding unparseable narrative");
            failed()
        }
    }
}

fn failed() -> NarrativeOutcome {
    NarrativeOutcome {
        narrative: None,
        status: NarrativeStatus::Failed,
    }
}

fn prompt(answers: &Questionnaire, report: &ScoreReport) -> String {
    let body = json!({
        "answers": answers,
        "score": report.score,
        "tier": report.tier.as_str(),
        "subscores": report.subscores,
        "strengths": report.strengths,
        "gaps": report.gaps,
    });
    format!("Assessment results:\n{}", body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockBackend;
    use crate::scoring::score;

    const VALID: &str = r#"{"summary":"Solid base.","insights":["a"],"next_steps":["b","c"]}"#;

    #[test]
    fn test_strict_parse() {
        let parsed = parse_model_json(&format!("  {}\n", VALID)).unwrap();
        assert_eq!(parsed.method, ParseMethod::Strict);
        assert_eq!(parsed.narrative.summary, "Solid base.");
        assert_eq!(parsed.narrative.next_steps.len(), 2);
    }

    #[test]
    fn test_extracts_object_from_prose() {
        let text = format!("Sure! Here is your analysis:\n```json\n{}\n```\nGood luck.", VALID);
        let parsed = parse_model_json(&text).unwrap();
        assert_eq!(parsed.method, ParseMethod::Extracted);
        assert_eq!(parsed.narrative.insights, vec!["a".to_string()]);
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let text = r#"note: {"summary":"use {curly} braces \"wisely\"","insights":[]} trailing }"#;
        let parsed = parse_model_json(text).unwrap();
        assert_eq!(parsed.narrative.summary, r#"use {curly} braces "wisely""#);
    }

    #[test]
    fn test_no_object_is_typed_error() {
        assert_eq!(
            parse_model_json("I cannot help with that."),
            Err(ExtractError::NoJsonObject)
        );
    }

    #[test]
    fn test_unbalanced_object() {
        assert_eq!(
            parse_model_json(r#"here {"summary": "cut off"#),
            Err(ExtractError::Unbalanced(MAX_SCAN_BYTES))
        );
    }

    #[test]
    fn test_wrong_shape_is_invalid_not_partial() {
        assert!(matches!(
            parse_model_json(r#"{"insights":["x"]}"#),
            Err(ExtractError::Invalid(_))
        ));
        assert!(matches!(
            parse_model_json(r#"{"summary":"   "}"#),
            Err(ExtractError::Invalid(_))
        ));
    }

    #[test]
    fn test_scan_is_bounded() {
        let mut text = "x".repeat(MAX_SCAN_BYTES);
        text.push_str(VALID);
        assert_eq!(parse_model_json(&text), Err(ExtractError::NoJsonObject));
    }

    #[tokio::test]
    async fn test_augment_without_backend() {
        let answers = Questionnaire::default();
        let outcome = augment(None, &answers, &score(&answers), 100).await;
        assert_eq!(outcome.status, NarrativeStatus::Unavailable);
        assert!(outcome.narrative.is_none());
    }

    #[tokio::test]
    async fn test_augment_with_backend() {
        let backend = MockBackend::default().with_response(VALID);
        let answers = Questionnaire::default();
        let outcome = augment(Some(&backend), &answers, &score(&answers), 100).await;
        assert_eq!(outcome.status, NarrativeStatus::Generated);
        assert_eq!(outcome.narrative.unwrap().summary, "Solid base.");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_augment_degrades_on_failure() {
        let answers = Questionnaire::default();
        let report = score(&answers);

        let down = MockBackend::default().with_available(false);
        let outcome = augment(Some(&down), &answers, &report, 100).await;
        assert_eq!(outcome.status, NarrativeStatus::Failed);
        assert!(outcome.narrative.is_none());

        let garbled = MockBackend::default().with_response("no json here");
        let outcome = augment(Some(&garbled), &answers, &report, 100).await;
        assert_eq!(outcome.status, NarrativeStatus::Failed);
    }
}
