//! AI artifacts - proposals, insights, questions, and answers.
//!
//! An artifact is a persisted unit of AI output. Proposals carry complete
//! replacement data and expire; insights are non-actionable observations;
//! questions and answers persist a Q&A exchange, the answer linking back
//! to its question through `parent_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::validation::ComponentType;

/// Kind of AI activity an artifact records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    /// Actionable suggestion with complete replacement data.
    Proposal,
    /// Non-actionable observation.
    Insight,
    /// User question.
    Question,
    /// AI answer to a question.
    Answer,
}

/// Category of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalType {
    FieldImprovement,
    MissingInformation,
    StatusConflict,
    ComponentCreation,
    RelationshipSuggestion,
    DocumentBased,
}

/// Review lifecycle of a persisted artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Modified,
    Deferred,
}

impl ArtifactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactStatus::Pending => "pending",
            ArtifactStatus::Accepted => "accepted",
            ArtifactStatus::Rejected => "rejected",
            ArtifactStatus::Modified => "modified",
            ArtifactStatus::Deferred => "deferred",
        }
    }
}

/// Model-reported confidence in a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Lenient mapping from model output wording.
    ///
    /// Matching is case-insensitive and substring-based because model
    /// phrasing is not guaranteed: "High", "HIGH CONFIDENCE", and "high"
    /// all map to `High`; anything unrecognized maps to `Low`.
    pub fn parse_lenient(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("high") {
            ConfidenceLevel::High
        } else if lowered.contains("medium") {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// A unit of AI output, tagged by activity type.
///
/// The store assigns canonical identity on persist; `id` is `None` until
/// then (or holds a locally generated fallback when the store is down).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiArtifact {
    /// Store-assigned id, or a local fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Project the artifact belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// What kind of activity this records.
    pub activity_type: ActivityType,
    /// Category of proposal (proposals only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal_type: Option<ProposalType>,
    /// Component type the artifact targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<ComponentType>,
    /// Component id the artifact targets (proposals only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    /// Complete replacement data (proposals only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Map<String, Value>>,
    /// Reasoning, insight text, question text, or answer text.
    pub rationale: String,
    /// Model-reported confidence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<ConfidenceLevel>,
    /// Supporting evidence.
    #[serde(default)]
    pub evidence: Vec<String>,
    /// Estimated effect on project success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_impact: Option<String>,
    /// Question this answer belongs to (answers only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Review lifecycle status.
    #[serde(default)]
    pub status: ArtifactStatus,
    /// Reviewer feedback recorded by a proposal action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Reviewer edits recorded by a "modified" proposal action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifications: Option<Map<String, Value>>,
    /// When the artifact was reviewed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    /// When the artifact was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When a proposal goes stale (proposals only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AiArtifact {
    /// Creates an insight artifact. Insights carry no changes, no
    /// component id, and never expire.
    pub fn insight(rationale: impl Into<String>, confidence: ConfidenceLevel) -> Self {
        Self {
            id: None,
            project_id: None,
            activity_type: ActivityType::Insight,
            proposal_type: None,
            component_type: None,
            component_id: None,
            changes: None,
            rationale: rationale.into(),
            confidence: Some(confidence),
            evidence: Vec::new(),
            estimated_impact: None,
            parent_id: None,
            status: ArtifactStatus::Pending,
            feedback: None,
            modifications: None,
            reviewed_at: None,
            created_at: None,
            expires_at: None,
        }
    }

    /// Creates a question artifact holding the question text.
    pub fn question(project_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            project_id: Some(project_id.into()),
            activity_type: ActivityType::Question,
            proposal_type: None,
            component_type: None,
            component_id: None,
            changes: None,
            rationale: text.into(),
            confidence: None,
            evidence: Vec::new(),
            estimated_impact: None,
            parent_id: None,
            status: ArtifactStatus::Pending,
            feedback: None,
            modifications: None,
            reviewed_at: None,
            created_at: None,
            expires_at: None,
        }
    }

    /// Creates an answer artifact linked to its question.
    pub fn answer(
        project_id: impl Into<String>,
        question_id: impl Into<String>,
        text: impl Into<String>,
        evidence: Vec<String>,
    ) -> Self {
        Self {
            id: None,
            project_id: Some(project_id.into()),
            activity_type: ActivityType::Answer,
            proposal_type: None,
            component_type: None,
            component_id: None,
            changes: None,
            rationale: text.into(),
            confidence: None,
            evidence,
            estimated_impact: None,
            parent_id: Some(question_id.into()),
            status: ArtifactStatus::Pending,
            feedback: None,
            modifications: None,
            reviewed_at: None,
            created_at: None,
            expires_at: None,
        }
    }

    /// Sets supporting evidence.
    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }

    /// Sets the estimated impact note.
    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.estimated_impact = Some(impact.into());
        self
    }

    /// True when any string value in `changes` contains a
    /// bracket-delimited placeholder like `[Add criterion]`.
    ///
    /// A proposal must be a complete, ready-to-use replacement; one that
    /// still needs caller-supplied detail is malformed and gets
    /// reclassified during recovery.
    pub fn has_placeholder_changes(&self) -> bool {
        fn value_has_placeholder(value: &Value) -> bool {
            match value {
                Value::String(s) => contains_bracket_token(s),
                Value::Array(items) => items.iter().any(value_has_placeholder),
                Value::Object(map) => map.values().any(value_has_placeholder),
                _ => false,
            }
        }

        self.changes
            .as_ref()
            .is_some_and(|changes| changes.values().any(value_has_placeholder))
    }
}

/// Detects a `[...]` span with non-empty content.
fn contains_bracket_token(text: &str) -> bool {
    let mut open = None;
    for (i, ch) in text.char_indices() {
        match ch {
            '[' => open = Some(i),
            ']' => {
                if let Some(start) = open {
                    if i > start + 1 {
                        return true;
                    }
                    open = None;
                }
            }
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn confidence_matching_is_case_insensitive_substring() {
        assert_eq!(ConfidenceLevel::parse_lenient("High"), ConfidenceLevel::High);
        assert_eq!(
            ConfidenceLevel::parse_lenient("HIGH CONFIDENCE"),
            ConfidenceLevel::High
        );
        assert_eq!(ConfidenceLevel::parse_lenient("high"), ConfidenceLevel::High);
        assert_eq!(
            ConfidenceLevel::parse_lenient("Medium-ish"),
            ConfidenceLevel::Medium
        );
        assert_eq!(
            ConfidenceLevel::parse_lenient("not sure"),
            ConfidenceLevel::Low
        );
        assert_eq!(ConfidenceLevel::parse_lenient(""), ConfidenceLevel::Low);
    }

    #[test]
    fn insight_has_no_component_and_never_expires() {
        let insight = AiArtifact::insight("velocity is dropping", ConfidenceLevel::High);
        assert_eq!(insight.activity_type, ActivityType::Insight);
        assert!(insight.component_id.is_none());
        assert!(insight.changes.is_none());
        assert!(insight.proposal_type.is_none());
        assert!(insight.expires_at.is_none());
    }

    #[test]
    fn answer_links_to_question() {
        let answer = AiArtifact::answer("p1", "q-123", "The deadline is Friday.", vec![]);
        assert_eq!(answer.activity_type, ActivityType::Answer);
        assert_eq!(answer.parent_id, Some("q-123".to_string()));
        assert_eq!(answer.rationale, "The deadline is Friday.");
    }

    #[test]
    fn placeholder_detection_in_changes() {
        let mut changes = Map::new();
        changes.insert(
            "description".to_string(),
            json!("Build a shed\n\n1. [Add criterion]\n2. [Add criterion]"),
        );

        let mut artifact = AiArtifact::insight("x", ConfidenceLevel::Low);
        artifact.activity_type = ActivityType::Proposal;
        artifact.changes = Some(changes);
        assert!(artifact.has_placeholder_changes());
    }

    #[test]
    fn complete_changes_pass_placeholder_check() {
        let mut changes = Map::new();
        changes.insert("title".to_string(), json!("Build user dashboard"));
        changes.insert(
            "nested".to_string(),
            json!({"note": "fully specified replacement"}),
        );

        let mut artifact = AiArtifact::insight("x", ConfidenceLevel::Low);
        artifact.activity_type = ActivityType::Proposal;
        artifact.changes = Some(changes);
        assert!(!artifact.has_placeholder_changes());
    }

    #[test]
    fn placeholder_detection_recurses_into_arrays_and_objects() {
        let mut changes = Map::new();
        changes.insert(
            "criteria".to_string(),
            json!(["All tests passing", {"detail": "[specify details]"}]),
        );

        let mut artifact = AiArtifact::insight("x", ConfidenceLevel::Low);
        artifact.activity_type = ActivityType::Proposal;
        artifact.changes = Some(changes);
        assert!(artifact.has_placeholder_changes());
    }

    #[test]
    fn empty_brackets_are_not_placeholders() {
        assert!(!contains_bracket_token("array[] access"));
        assert!(contains_bracket_token("fill in [your name] here"));
        assert!(!contains_bracket_token("no brackets at all"));
    }

    #[test]
    fn artifact_serialization_omits_absent_fields() {
        let insight = AiArtifact::insight("obs", ConfidenceLevel::Medium);
        let json = serde_json::to_string(&insight).unwrap();
        assert!(!json.contains("component_id"));
        assert!(!json.contains("changes"));
        assert!(!json.contains("expires_at"));
        assert!(json.contains("\"activity_type\":\"insight\""));
    }

    #[test]
    fn proposal_shaped_json_round_trips() {
        let raw = json!({
            "activity_type": "proposal",
            "proposal_type": "field_improvement",
            "component_type": "task",
            "component_id": "t-1",
            "changes": {"title": "Review and approve brand identity"},
            "rationale": "Title lacked an action verb",
            "confidence": "high",
            "evidence": ["original title was 'brand'"],
            "estimated_impact": "clearer ownership"
        });

        let artifact: AiArtifact = serde_json::from_value(raw).unwrap();
        assert_eq!(artifact.activity_type, ActivityType::Proposal);
        assert_eq!(artifact.proposal_type, Some(ProposalType::FieldImprovement));
        assert_eq!(artifact.component_id, Some("t-1".to_string()));
        assert_eq!(artifact.confidence, Some(ConfidenceLevel::High));
        assert_eq!(artifact.status, ArtifactStatus::Pending);
    }
}
