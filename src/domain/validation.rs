//! Validation request types - scopes, issues, and the per-call context.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of project component being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Task,
    Risk,
    Decision,
    Milestone,
}

impl ComponentType {
    /// Stable string form used in prompts and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Task => "task",
            ComponentType::Risk => "risk",
            ComponentType::Decision => "decision",
            ComponentType::Milestone => "milestone",
        }
    }
}

/// Validation strictness level. `RulesOnly` requests the narrowest
/// checks, `Full` the most comprehensive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationScope {
    RulesOnly,
    #[default]
    Selective,
    Full,
}

impl ValidationScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationScope::RulesOnly => "rules_only",
            ValidationScope::Selective => "selective",
            ValidationScope::Full => "full",
        }
    }
}

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single finding against a component field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Field the issue applies to ("title", "description", or "general").
    pub field: String,
    /// Machine-readable issue category.
    pub issue_type: String,
    /// Human-readable description.
    pub message: String,
    /// Issue severity.
    pub severity: Severity,
    /// Suggested fix, when the model offered one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A project rule attached to validation context (required fields,
/// length limits, and so on).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub message: String,
}

/// Default rules applied when a project has no stored rule set.
pub fn default_project_rules() -> Vec<ProjectRule> {
    vec![
        ProjectRule {
            rule_type: "required_field".to_string(),
            field: "title".to_string(),
            value: None,
            message: "Title is required".to_string(),
        },
        ProjectRule {
            rule_type: "max_length".to_string(),
            field: "description".to_string(),
            value: Some(Value::from(5000)),
            message: "Description must be less than 5000 characters".to_string(),
        },
    ]
}

/// Immutable context for one validation call.
///
/// Constructed once per request by the orchestrator and handed to the
/// AI service; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Project the component belongs to.
    pub project_id: String,
    /// Kind of component being validated.
    pub component_type: ComponentType,
    /// Arbitrary component fields (title, status, ...).
    pub component_data: Map<String, Value>,
    /// Project-specific rules, when available.
    pub project_rules: Option<Vec<ProjectRule>>,
    /// Related components for cross-checks, when available.
    pub related_components: Option<Vec<Value>>,
    /// Caller-supplied preferences, when available.
    pub user_preferences: Option<Map<String, Value>>,
}

impl ValidationContext {
    /// Creates a context with only the required fields.
    pub fn new(
        project_id: impl Into<String>,
        component_type: ComponentType,
        component_data: Map<String, Value>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            component_type,
            component_data,
            project_rules: None,
            related_components: None,
            user_preferences: None,
        }
    }

    /// Attaches project rules.
    pub fn with_rules(mut self, rules: Vec<ProjectRule>) -> Self {
        self.project_rules = Some(rules);
        self
    }

    /// Attaches related components.
    pub fn with_related_components(mut self, related: Vec<Value>) -> Self {
        self.related_components = Some(related);
        self
    }

    /// Attaches user preferences.
    pub fn with_user_preferences(mut self, prefs: Map<String, Value>) -> Self {
        self.user_preferences = Some(prefs);
        self
    }

    /// The component's own id, when present in its data.
    pub fn component_id(&self) -> Option<String> {
        self.component_data
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_data() -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("id".to_string(), json!("task-42"));
        data.insert("title".to_string(), json!("build"));
        data.insert("status".to_string(), json!("todo"));
        data
    }

    #[test]
    fn context_builder_works() {
        let context = ValidationContext::new("p1", ComponentType::Task, task_data())
            .with_rules(default_project_rules());

        assert_eq!(context.project_id, "p1");
        assert_eq!(context.component_type, ComponentType::Task);
        assert_eq!(context.project_rules.as_ref().unwrap().len(), 2);
        assert!(context.related_components.is_none());
    }

    #[test]
    fn component_id_read_from_data() {
        let context = ValidationContext::new("p1", ComponentType::Task, task_data());
        assert_eq!(context.component_id(), Some("task-42".to_string()));

        let context = ValidationContext::new("p1", ComponentType::Task, Map::new());
        assert_eq!(context.component_id(), None);
    }

    #[test]
    fn scope_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ValidationScope::RulesOnly).unwrap(),
            "\"rules_only\""
        );
        assert_eq!(
            serde_json::to_string(&ValidationScope::Full).unwrap(),
            "\"full\""
        );
    }

    #[test]
    fn severity_deserializes_lowercase() {
        let severity: Severity = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(severity, Severity::Warning);
    }

    #[test]
    fn issue_round_trips_without_suggestion() {
        let issue = ValidationIssue {
            field: "title".to_string(),
            issue_type: "suggestion".to_string(),
            message: "add a noun".to_string(),
            severity: Severity::Info,
            suggestion: None,
        };

        let json = serde_json::to_string(&issue).unwrap();
        assert!(!json.contains("\"suggestion\":"));
        let back: ValidationIssue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, issue);
    }

    #[test]
    fn default_rules_cover_title_and_description() {
        let rules = default_project_rules();
        assert_eq!(rules[0].rule_type, "required_field");
        assert_eq!(rules[0].field, "title");
        assert_eq!(rules[1].rule_type, "max_length");
        assert_eq!(rules[1].value, Some(Value::from(5000)));
    }
}
