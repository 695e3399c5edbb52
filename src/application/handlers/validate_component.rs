//! ValidateComponentHandler - runs AI validation over one component
//! and persists any proposals it produces.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use crate::application::common::{local_artifact_id, record_usage, BackendResolver};
use crate::config::ValidationError;
use crate::domain::artifact::AiArtifact;
use crate::domain::usage::TokenUsage;
use crate::domain::validation::{
    default_project_rules, ComponentType, ProjectRule, ValidationContext, ValidationIssue,
    ValidationScope,
};
use crate::ports::{ProjectStore, UsageLogEntry};

/// Command to validate one component.
#[derive(Debug, Clone)]
pub struct ValidateComponentCommand {
    pub project_id: String,
    pub component_type: ComponentType,
    pub component_data: Map<String, Value>,
    pub scope: ValidationScope,
    /// Project rules to validate against; the built-in defaults apply
    /// when none are supplied.
    pub rules: Option<Vec<ProjectRule>>,
    pub related_components: Vec<Value>,
    pub user_preferences: Map<String, Value>,
}

impl ValidateComponentCommand {
    pub fn new(
        project_id: impl Into<String>,
        component_type: ComponentType,
        component_data: Map<String, Value>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            component_type,
            component_data,
            scope: ValidationScope::Selective,
            rules: None,
            related_components: Vec::new(),
            user_preferences: Map::new(),
        }
    }

    pub fn with_scope(mut self, scope: ValidationScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_rules(mut self, rules: Vec<ProjectRule>) -> Self {
        self.rules = Some(rules);
        self
    }
}

/// Result of a validation run. Always produced; a transport failure
/// upstream shows up as empty findings with zero usage.
#[derive(Debug, Clone)]
pub struct ValidateComponentResult {
    pub issues: Vec<ValidationIssue>,
    /// Persisted proposals, each carrying its store-assigned (or local
    /// fallback) id and expiry.
    pub proposals: Vec<AiArtifact>,
    pub usage: TokenUsage,
    pub processing_time_ms: u64,
}

/// Handler for component validation.
pub struct ValidateComponentHandler {
    store: Arc<dyn ProjectStore>,
    resolver: Arc<dyn BackendResolver>,
    proposal_ttl: Duration,
}

impl ValidateComponentHandler {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        resolver: Arc<dyn BackendResolver>,
        proposal_ttl: Duration,
    ) -> Self {
        Self {
            store,
            resolver,
            proposal_ttl,
        }
    }

    pub async fn handle(
        &self,
        cmd: ValidateComponentCommand,
    ) -> Result<ValidateComponentResult, ValidationError> {
        let started = Instant::now();

        let backend = self.resolver.resolve(&cmd.project_id).await?;

        let context = ValidationContext::new(
            cmd.project_id.clone(),
            cmd.component_type,
            cmd.component_data,
        )
        .with_rules(cmd.rules.unwrap_or_else(default_project_rules))
        .with_related_components(cmd.related_components)
        .with_user_preferences(cmd.user_preferences);

        let outcome = backend.service.validate_component(&context, cmd.scope).await;

        let expires_at = Utc::now() + self.proposal_ttl;
        let mut proposals = Vec::with_capacity(outcome.proposals.len());
        let mut artifact_ids = Vec::new();

        for mut proposal in outcome.proposals {
            proposal.project_id = Some(cmd.project_id.clone());
            proposal.expires_at = Some(expires_at);

            let persisted = match self.store.create_artifact(proposal.clone()).await {
                Ok(persisted) => persisted,
                Err(err) => {
                    warn!(%err, project_id = %cmd.project_id, "proposal persist failed, assigning local id");
                    proposal.id = Some(local_artifact_id());
                    proposal
                }
            };

            if let Some(id) = &persisted.id {
                artifact_ids.push(id.clone());
            }
            proposals.push(persisted);
        }

        let usage = outcome.usage;
        let processing_time_ms = started.elapsed().as_millis() as u64;

        record_usage(
            &self.store,
            UsageLogEntry {
                project_id: cmd.project_id.clone(),
                operation_type: "validation".to_string(),
                provider: backend.service.provider(),
                model: backend.service.model(),
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
                estimated_cost: usage.estimated_cost,
                latency_ms: processing_time_ms,
                success: true,
                artifact_ids,
            },
        )
        .await;

        Ok(ValidateComponentResult {
            issues: outcome.issues,
            proposals,
            usage,
            processing_time_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiService;
    use crate::adapters::store::{InMemoryProjectStore, NullProjectStore};
    use crate::application::common::ResolvedBackend;
    use crate::domain::prompt::PromptOverrides;
    use async_trait::async_trait;
    use serde_json::json;

    struct StubResolver {
        service: Arc<MockAiService>,
    }

    #[async_trait]
    impl BackendResolver for StubResolver {
        async fn resolve(&self, _project_id: &str) -> Result<ResolvedBackend, ValidationError> {
            Ok(ResolvedBackend {
                service: self.service.clone(),
                overrides: PromptOverrides::default(),
            })
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl BackendResolver for FailingResolver {
        async fn resolve(&self, _project_id: &str) -> Result<ResolvedBackend, ValidationError> {
            Err(ValidationError::MissingRequired("OPENAI_API_KEY"))
        }
    }

    fn command() -> ValidateComponentCommand {
        ValidateComponentCommand::new(
            "p1",
            ComponentType::Task,
            json!({"id": "t-1", "title": "brand"}).as_object().cloned().unwrap(),
        )
    }

    fn validation_body() -> String {
        json!({
            "issues": [{
                "field": "title",
                "issue_type": "suggestion",
                "message": "add a noun",
                "severity": "info"
            }],
            "proposals": [{
                "proposal_type": "field_improvement",
                "changes": {"title": "Review and approve brand identity"},
                "rationale": "Title lacked an action verb",
                "confidence": "high"
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn persists_proposals_with_identity_and_expiry() {
        let store = Arc::new(InMemoryProjectStore::new());
        let mock = Arc::new(MockAiService::new().with_response(validation_body()));
        let handler = ValidateComponentHandler::new(
            store.clone(),
            Arc::new(StubResolver {
                service: mock,
            }),
            Duration::hours(24),
        );

        let result = handler.handle(command()).await.unwrap();

        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.proposals.len(), 1);
        let proposal = &result.proposals[0];
        assert!(proposal.id.is_some());
        assert_eq!(proposal.project_id.as_deref(), Some("p1"));
        assert_eq!(proposal.component_id.as_deref(), Some("t-1"));
        assert!(proposal.expires_at.is_some());
        assert!(result.usage.total_tokens > 0);
    }

    #[tokio::test]
    async fn logs_usage_with_artifact_ids() {
        let store = Arc::new(InMemoryProjectStore::new());
        let mock = Arc::new(MockAiService::new().with_response(validation_body()));
        let handler = ValidateComponentHandler::new(
            store.clone(),
            Arc::new(StubResolver { service: mock }),
            Duration::hours(24),
        );

        handler.handle(command()).await.unwrap();

        let usage = store.usage_entries();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].operation_type, "validation");
        assert_eq!(usage[0].artifact_ids.len(), 1);
        assert!(usage[0].success);
    }

    #[tokio::test]
    async fn store_failure_yields_local_ids() {
        let mock = Arc::new(MockAiService::new().with_response(validation_body()));
        let handler = ValidateComponentHandler::new(
            Arc::new(NullProjectStore),
            Arc::new(StubResolver { service: mock }),
            Duration::hours(24),
        );

        let result = handler.handle(command()).await.unwrap();

        assert_eq!(result.proposals.len(), 1);
        assert!(result.proposals[0].id.is_some());
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_empty_result() {
        // Exhausted mock script behaves like a transport failure.
        let mock = Arc::new(MockAiService::new());
        let handler = ValidateComponentHandler::new(
            Arc::new(InMemoryProjectStore::new()),
            Arc::new(StubResolver { service: mock }),
            Duration::hours(24),
        );

        let result = handler.handle(command()).await.unwrap();

        assert!(result.issues.is_empty());
        assert!(result.proposals.is_empty());
        assert_eq!(result.usage, TokenUsage::zero());
    }

    #[tokio::test]
    async fn missing_api_key_surfaces() {
        let handler = ValidateComponentHandler::new(
            Arc::new(InMemoryProjectStore::new()),
            Arc::new(FailingResolver),
            Duration::hours(24),
        );

        let err = handler.handle(command()).await.unwrap_err();
        assert_eq!(err, ValidationError::MissingRequired("OPENAI_API_KEY"));
    }
}
