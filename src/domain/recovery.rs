//! Response Recovery - turns loosely structured model output into typed
//! domain records without crashing on malformed input.
//!
//! Recovery is an explicit pipeline rather than nested error handling:
//! (1) locate and parse the first balanced `{...}` or `[...]` span,
//! (2) parse the whole text, (3) apply a call-site-specific typed
//! fallback. Each stage is independently testable. Parse failures never
//! escape this module.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::artifact::{
    ActivityType, AiArtifact, ArtifactStatus, ConfidenceLevel, ProposalType,
};
use crate::domain::validation::{Severity, ValidationContext, ValidationIssue};

/// Maximum characters of raw text carried into a fallback insight.
const FALLBACK_INSIGHT_CHARS: usize = 500;

/// Finds the first balanced `{...}` or `[...]` span in free text,
/// skipping brace characters inside JSON string literals.
pub fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let bytes = text.as_bytes();
    let open = bytes[start] as char;
    let close = if open == '{' { '}' } else { ']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Two-stage parse: extracted span first, then the whole text.
fn parse_loose(text: &str) -> Option<Value> {
    if let Some(span) = extract_json_span(text) {
        if let Ok(value) = serde_json::from_str(span) {
            return Some(value);
        }
    }
    serde_json::from_str(text).ok()
}

/// Raw proposal shape as the model emits it. Context fields
/// (component type/id) are injected afterwards from the call site.
#[derive(Debug, Deserialize)]
struct RawProposal {
    proposal_type: ProposalType,
    changes: Map<String, Value>,
    rationale: String,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    evidence: Vec<String>,
    #[serde(default)]
    estimated_impact: Option<String>,
}

/// Raw insight shape as the model emits it.
#[derive(Debug, Deserialize)]
struct RawInsight {
    rationale: String,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    evidence: Vec<String>,
    #[serde(default)]
    estimated_impact: Option<String>,
}

/// Raw answer shape as the model emits it.
#[derive(Debug, Deserialize)]
struct RawAnswer {
    answer: String,
    #[serde(default)]
    evidence: Vec<String>,
}

/// Parses a validation response into issues and proposals.
///
/// Objects failing schema validation are dropped individually rather
/// than aborting the batch. Proposals whose `changes` contain a
/// bracket-delimited placeholder are reclassified as warning issues -
/// an incomplete proposal must never be persisted as ready-to-use.
///
/// Degraded fallback: when no JSON can be recovered, returns zero
/// proposals and - only if the raw text mentions error/invalid keywords -
/// one generic `general/validation_error/warning` issue.
pub fn parse_validation_response(
    content: &str,
    context: &ValidationContext,
) -> (Vec<ValidationIssue>, Vec<AiArtifact>) {
    let Some(data) = parse_loose(content) else {
        warn!("validation response was not parseable as JSON");
        return validation_fallback(content);
    };

    let mut issues = Vec::new();
    let mut proposals = Vec::new();

    for raw in data
        .get("issues")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        match serde_json::from_value::<ValidationIssue>(raw.clone()) {
            Ok(issue) => issues.push(issue),
            Err(err) => warn!(%err, "dropping malformed validation issue"),
        }
    }

    for raw in data
        .get("proposals")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let parsed = match serde_json::from_value::<RawProposal>(raw.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(%err, "dropping malformed proposal");
                continue;
            }
        };

        let artifact = AiArtifact {
            id: None,
            project_id: Some(context.project_id.clone()),
            activity_type: ActivityType::Proposal,
            proposal_type: Some(parsed.proposal_type),
            component_type: Some(context.component_type),
            component_id: context.component_id(),
            changes: Some(parsed.changes),
            rationale: parsed.rationale,
            confidence: Some(
                parsed
                    .confidence
                    .as_deref()
                    .map(ConfidenceLevel::parse_lenient)
                    .unwrap_or(ConfidenceLevel::Low),
            ),
            evidence: parsed.evidence,
            estimated_impact: parsed.estimated_impact,
            parent_id: None,
            status: ArtifactStatus::Pending,
            feedback: None,
            modifications: None,
            reviewed_at: None,
            created_at: None,
            expires_at: None,
        };

        if artifact.has_placeholder_changes() {
            warn!("reclassifying placeholder-bearing proposal as an issue");
            issues.push(ValidationIssue {
                field: "general".to_string(),
                issue_type: "incomplete_proposal".to_string(),
                message: artifact.rationale.clone(),
                severity: Severity::Warning,
                suggestion: None,
            });
            continue;
        }

        proposals.push(artifact);
    }

    (issues, proposals)
}

/// Fallback for unparseable validation output.
fn validation_fallback(content: &str) -> (Vec<ValidationIssue>, Vec<AiArtifact>) {
    let lowered = content.to_lowercase();
    if lowered.contains("error") || lowered.contains("invalid") {
        let issue = ValidationIssue {
            field: "general".to_string(),
            issue_type: "validation_error".to_string(),
            message: "AI detected validation issues but response format was invalid".to_string(),
            severity: Severity::Warning,
            suggestion: None,
        };
        return (vec![issue], Vec::new());
    }

    (Vec::new(), Vec::new())
}

/// Parses an insight-generation response into insight artifacts.
///
/// Accepts a JSON array or a single object. When no JSON can be
/// recovered at all, the first ~500 characters of raw text become a
/// single medium-confidence insight with an explicit unparsed-output
/// impact note. A response that parses to an empty array is an empty
/// result, not a fallback.
pub fn parse_insights(content: &str) -> Vec<AiArtifact> {
    let Some(data) = parse_loose(content) else {
        warn!("insight response was not parseable as JSON, wrapping raw text");
        return vec![fallback_insight(content)];
    };

    let items = match data {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut insights = Vec::new();
    for item in items {
        match serde_json::from_value::<RawInsight>(item) {
            Ok(raw) => {
                let confidence = raw
                    .confidence
                    .as_deref()
                    .map(ConfidenceLevel::parse_lenient)
                    .unwrap_or(ConfidenceLevel::Medium);

                let mut insight = AiArtifact::insight(raw.rationale, confidence)
                    .with_evidence(raw.evidence);
                insight.estimated_impact = raw.estimated_impact;
                insights.push(insight);
            }
            Err(err) => warn!(%err, "dropping malformed insight"),
        }
    }

    insights
}

/// Wraps raw text as the single degraded insight.
fn fallback_insight(content: &str) -> AiArtifact {
    let truncated: String = content.chars().take(FALLBACK_INSIGHT_CHARS).collect();
    AiArtifact::insight(truncated, ConfidenceLevel::Medium)
        .with_impact("Unable to parse structured insights")
}

/// Parses a question-answering response.
///
/// When the reply is not valid JSON the entire raw text becomes the
/// answer and evidence is empty - acceptable degraded behavior, not an
/// error.
pub fn parse_answer(content: &str) -> (String, Vec<String>) {
    if let Some(value) = parse_loose(content) {
        if let Ok(parsed) = serde_json::from_value::<RawAnswer>(value) {
            return (parsed.answer, parsed.evidence);
        }
    }

    (content.to_string(), Vec::new())
}
