//! AssessProjectHandler - generates whole-project insights and
//! persists them as artifacts.
//!
//! The assessment prompt is built from a context snapshot and the
//! project's stored prompt overrides. The provider's raw reply goes
//! through response recovery, which always yields at least one insight
//! when any text came back.

use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use crate::application::common::{local_artifact_id, record_usage, BackendResolver};
use crate::application::context_aggregator::ContextAggregator;
use crate::config::ValidationError;
use crate::domain::artifact::AiArtifact;
use crate::domain::prompt;
use crate::domain::recovery;
use crate::domain::usage::TokenUsage;
use crate::ports::{ProjectStore, UsageLogEntry};

/// Command to assess one project.
#[derive(Debug, Clone)]
pub struct AssessProjectCommand {
    pub project_id: String,
}

/// Result of a project assessment.
#[derive(Debug, Clone)]
pub struct AssessProjectResult {
    /// Persisted insights. Empty only when the provider returned
    /// nothing at all.
    pub insights: Vec<AiArtifact>,
    pub usage: TokenUsage,
    pub processing_time_ms: u64,
}

/// Handler for project assessment.
pub struct AssessProjectHandler {
    store: Arc<dyn ProjectStore>,
    resolver: Arc<dyn BackendResolver>,
    aggregator: ContextAggregator,
}

impl AssessProjectHandler {
    pub fn new(store: Arc<dyn ProjectStore>, resolver: Arc<dyn BackendResolver>) -> Self {
        let aggregator = ContextAggregator::new(store.clone());
        Self {
            store,
            resolver,
            aggregator,
        }
    }

    pub async fn handle(
        &self,
        cmd: AssessProjectCommand,
    ) -> Result<AssessProjectResult, ValidationError> {
        let started = Instant::now();

        let backend = self.resolver.resolve(&cmd.project_id).await?;
        let snapshot = self.aggregator.snapshot(&cmd.project_id).await;

        let assessment = prompt::assessment_prompt(&snapshot, &backend.overrides);
        let (raw, usage) = backend
            .service
            .generate_insights(&assessment, &cmd.project_id)
            .await;

        let mut insights = Vec::new();
        let mut artifact_ids = Vec::new();

        if raw.is_empty() {
            warn!(project_id = %cmd.project_id, "insight generation returned nothing");
        } else {
            for mut insight in recovery::parse_insights(&raw) {
                insight.project_id = Some(cmd.project_id.clone());

                let persisted = match self.store.create_artifact(insight.clone()).await {
                    Ok(persisted) => persisted,
                    Err(err) => {
                        warn!(%err, project_id = %cmd.project_id, "insight persist failed, assigning local id");
                        insight.id = Some(local_artifact_id());
                        insight
                    }
                };

                if let Some(id) = &persisted.id {
                    artifact_ids.push(id.clone());
                }
                insights.push(persisted);
            }
        }

        let processing_time_ms = started.elapsed().as_millis() as u64;

        record_usage(
            &self.store,
            UsageLogEntry {
                project_id: cmd.project_id.clone(),
                operation_type: "project_assessment".to_string(),
                provider: backend.service.provider(),
                model: backend.service.model(),
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
                estimated_cost: usage.estimated_cost,
                latency_ms: processing_time_ms,
                success: !raw.is_empty(),
                artifact_ids,
            },
        )
        .await;

        Ok(AssessProjectResult {
            insights,
            usage,
            processing_time_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiService;
    use crate::adapters::store::InMemoryProjectStore;
    use crate::application::common::ResolvedBackend;
    use crate::domain::artifact::{ActivityType, ConfidenceLevel};
    use crate::domain::prompt::PromptOverrides;
    use async_trait::async_trait;
    use serde_json::json;

    struct StubResolver {
        service: Arc<MockAiService>,
        overrides: PromptOverrides,
    }

    #[async_trait]
    impl BackendResolver for StubResolver {
        async fn resolve(&self, _project_id: &str) -> Result<ResolvedBackend, ValidationError> {
            Ok(ResolvedBackend {
                service: self.service.clone(),
                overrides: self.overrides.clone(),
            })
        }
    }

    fn insights_body() -> String {
        json!([
            {
                "rationale": "Four of five tasks have no estimates.",
                "confidence": "high",
                "estimated_impact": "planning accuracy"
            },
            {
                "rationale": "No dependencies are recorded between tasks.",
                "confidence": "medium"
            }
        ])
        .to_string()
    }

    #[tokio::test]
    async fn parses_and_persists_insights() {
        let store = Arc::new(InMemoryProjectStore::new());
        let mock = Arc::new(MockAiService::new().with_response(insights_body()));
        let handler = AssessProjectHandler::new(
            store.clone(),
            Arc::new(StubResolver {
                service: mock,
                overrides: PromptOverrides::default(),
            }),
        );

        let result = handler
            .handle(AssessProjectCommand {
                project_id: "p1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.insights.len(), 2);
        assert!(result.insights.iter().all(|i| i.id.is_some()));
        assert!(result
            .insights
            .iter()
            .all(|i| i.activity_type == ActivityType::Insight));
        assert_eq!(result.insights[0].confidence, Some(ConfidenceLevel::High));

        let usage = store.usage_entries();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].operation_type, "project_assessment");
        assert_eq!(usage[0].artifact_ids.len(), 2);
    }

    #[tokio::test]
    async fn unparseable_reply_falls_back_to_single_insight() {
        let store = Arc::new(InMemoryProjectStore::new());
        let mock = Arc::new(
            MockAiService::new()
                .with_response("The project looks generally healthy but estimates are missing."),
        );
        let handler = AssessProjectHandler::new(
            store,
            Arc::new(StubResolver {
                service: mock,
                overrides: PromptOverrides::default(),
            }),
        );

        let result = handler
            .handle(AssessProjectCommand {
                project_id: "p1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.insights.len(), 1);
        assert!(result.insights[0]
            .rationale
            .contains("generally healthy"));
    }

    #[tokio::test]
    async fn transport_failure_yields_no_insights() {
        let store = Arc::new(InMemoryProjectStore::new());
        let mock = Arc::new(MockAiService::new());
        let handler = AssessProjectHandler::new(
            store.clone(),
            Arc::new(StubResolver {
                service: mock,
                overrides: PromptOverrides::default(),
            }),
        );

        let result = handler
            .handle(AssessProjectCommand {
                project_id: "p1".to_string(),
            })
            .await
            .unwrap();

        assert!(result.insights.is_empty());
        assert_eq!(result.usage, TokenUsage::zero());

        let usage = store.usage_entries();
        assert_eq!(usage.len(), 1);
        assert!(!usage[0].success);
    }

    #[tokio::test]
    async fn overrides_flow_into_the_prompt() {
        let mock = Arc::new(MockAiService::new().with_response(insights_body()));
        let mock_handle = mock.clone();
        let handler = AssessProjectHandler::new(
            Arc::new(InMemoryProjectStore::new()),
            Arc::new(StubResolver {
                service: mock,
                overrides: PromptOverrides {
                    system_prompt: Some("You are a construction site auditor.".to_string()),
                    categories: None,
                    output_format: None,
                },
            }),
        );

        handler
            .handle(AssessProjectCommand {
                project_id: "p1".to_string(),
            })
            .await
            .unwrap();

        let prompts = mock_handle.captured_prompts();
        assert!(prompts[0].contains("construction site auditor"));
        assert!(prompts[0].contains("Focus on the most important 5-15 insights"));
    }
}
