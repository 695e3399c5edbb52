//! AiOrchestrator - single entry point over the AI operation handlers
//! and the store passthroughs.

use std::sync::Arc;

use chrono::Duration;

use crate::adapters::ai::ServiceCache;
use crate::application::common::CachedBackendResolver;
use crate::application::handlers::{
    AnswerQuestionCommand, AnswerQuestionHandler, AnswerQuestionResult, AssessProjectCommand,
    AssessProjectHandler, AssessProjectResult, ConnectionReport, ProposalActionCommand,
    ProposalActionHandler, TestConnectionsHandler, ValidateComponentCommand,
    ValidateComponentHandler, ValidateComponentResult,
};
use crate::config::{AiConfig, ValidationError};
use crate::domain::artifact::AiArtifact;
use crate::ports::{
    AiConfiguration, ArtifactFilter, ProjectStore, StoreError, UsageStats,
};

/// Facade wiring the handlers to one store and one service cache.
pub struct AiOrchestrator {
    store: Arc<dyn ProjectStore>,
    validate: ValidateComponentHandler,
    answer: AnswerQuestionHandler,
    assess: AssessProjectHandler,
    proposal: ProposalActionHandler,
    connections: TestConnectionsHandler,
}

impl AiOrchestrator {
    pub fn new(config: AiConfig, store: Arc<dyn ProjectStore>) -> Self {
        let services = Arc::new(ServiceCache::new(config.clone()));
        let resolver = Arc::new(CachedBackendResolver::new(store.clone(), services.clone()));

        Self {
            validate: ValidateComponentHandler::new(
                store.clone(),
                resolver.clone(),
                Duration::hours(config.proposal_expiry_hours),
            ),
            answer: AnswerQuestionHandler::new(store.clone(), resolver.clone()),
            assess: AssessProjectHandler::new(store.clone(), resolver),
            proposal: ProposalActionHandler::new(store.clone()),
            connections: TestConnectionsHandler::new(config, services),
            store,
        }
    }

    /// Validates a component and persists resulting proposals.
    pub async fn validate_component(
        &self,
        cmd: ValidateComponentCommand,
    ) -> Result<ValidateComponentResult, ValidationError> {
        self.validate.handle(cmd).await
    }

    /// Answers a question against the project context.
    pub async fn answer_question(
        &self,
        cmd: AnswerQuestionCommand,
    ) -> Result<AnswerQuestionResult, ValidationError> {
        self.answer.handle(cmd).await
    }

    /// Generates and persists whole-project insights.
    pub async fn assess_project(
        &self,
        cmd: AssessProjectCommand,
    ) -> Result<AssessProjectResult, ValidationError> {
        self.assess.handle(cmd).await
    }

    /// Applies a reviewer decision to a proposal.
    pub async fn proposal_action(
        &self,
        cmd: ProposalActionCommand,
    ) -> Result<AiArtifact, StoreError> {
        self.proposal.handle(cmd).await
    }

    /// Probes connectivity of every provider family.
    pub async fn test_ai_connections(&self) -> Vec<ConnectionReport> {
        self.connections.handle().await
    }

    /// Lists a project's artifacts.
    pub async fn get_artifacts(
        &self,
        project_id: &str,
        filter: &ArtifactFilter,
    ) -> Result<Vec<AiArtifact>, StoreError> {
        self.store.get_artifacts(project_id, filter).await
    }

    /// Aggregated usage for a project.
    pub async fn get_usage_stats(&self, project_id: &str) -> Result<UsageStats, StoreError> {
        self.store.get_usage_stats(project_id).await
    }

    /// Per-project AI configuration.
    pub async fn get_configuration(
        &self,
        project_id: &str,
    ) -> Result<Option<AiConfiguration>, StoreError> {
        self.store.get_configuration(project_id).await
    }

    /// Creates or replaces the per-project AI configuration.
    pub async fn upsert_configuration(
        &self,
        project_id: &str,
        configuration: AiConfiguration,
    ) -> Result<AiConfiguration, StoreError> {
        self.store.upsert_configuration(project_id, configuration).await
    }
}
