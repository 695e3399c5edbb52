//! AnswerQuestionHandler - answers a free-form question against the
//! project context and persists the exchange.
//!
//! Both sides of the exchange are stored: the question first, then the
//! answer linked to it through `parent_id`. When the store is down the
//! exchange still completes with locally generated identities.

use std::sync::Arc;
use std::time::Instant;

use tracing::warn;

use crate::application::common::{local_artifact_id, record_usage, BackendResolver};
use crate::application::context_aggregator::ContextAggregator;
use crate::config::ValidationError;
use crate::domain::artifact::AiArtifact;
use crate::domain::usage::TokenUsage;
use crate::ports::{ProjectStore, UsageLogEntry};

/// Command to answer one question.
#[derive(Debug, Clone)]
pub struct AnswerQuestionCommand {
    pub project_id: String,
    pub question: String,
}

/// Result of a Q&A exchange.
#[derive(Debug, Clone)]
pub struct AnswerQuestionResult {
    pub answer: String,
    pub evidence: Vec<String>,
    pub question_id: String,
    pub answer_id: String,
    pub usage: TokenUsage,
    pub processing_time_ms: u64,
}

/// Handler for question answering.
pub struct AnswerQuestionHandler {
    store: Arc<dyn ProjectStore>,
    resolver: Arc<dyn BackendResolver>,
    aggregator: ContextAggregator,
}

impl AnswerQuestionHandler {
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
        cmd: AnswerQuestionCommand,
    ) -> Result<AnswerQuestionResult, ValidationError> {
        let started = Instant::now();

        let backend = self.resolver.resolve(&cmd.project_id).await?;
        let snapshot = self.aggregator.snapshot(&cmd.project_id).await;

        let (answer, evidence, usage) = backend
            .service
            .answer_question(&cmd.question, &cmd.project_id, &snapshot)
            .await;

        let question_id = self
            .persist(AiArtifact::question(&cmd.project_id, &cmd.question))
            .await;
        let answer_id = self
            .persist(AiArtifact::answer(
                &cmd.project_id,
                &question_id,
                &answer,
                evidence.clone(),
            ))
            .await;

        let processing_time_ms = started.elapsed().as_millis() as u64;

        record_usage(
            &self.store,
            UsageLogEntry {
                project_id: cmd.project_id.clone(),
                operation_type: "question_answer".to_string(),
                provider: backend.service.provider(),
                model: backend.service.model(),
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
                estimated_cost: usage.estimated_cost,
                latency_ms: processing_time_ms,
                success: true,
                artifact_ids: vec![question_id.clone(), answer_id.clone()],
            },
        )
        .await;

        Ok(AnswerQuestionResult {
            answer,
            evidence,
            question_id,
            answer_id,
            usage,
            processing_time_ms,
        })
    }

    /// Persists an artifact, falling back to a local identity when the
    /// store cannot assign one.
    async fn persist(&self, artifact: AiArtifact) -> String {
        match self.store.create_artifact(artifact).await {
            Ok(persisted) => persisted.id.unwrap_or_else(local_artifact_id),
            Err(err) => {
                warn!(%err, "artifact persist failed, assigning local id");
                local_artifact_id()
            }
        }
    }
}
