//! Project Store Port - the narrow CRUD interface over the external
//! data store (artifacts, usage logs, per-project AI configuration,
//! and read-only project/task data).
//!
//! StoreUnavailable is not an error: every store-dependent operation
//! has a documented degraded path. Orchestrators treat a [`StoreError`]
//! as "absent" data - empty lists, `None`, or locally synthesized
//! placeholder identities - and keep functioning in a reduced mode.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::artifact::{ActivityType, AiArtifact, ArtifactStatus};
use crate::domain::context::{ProjectDetails, TaskDependency, TaskRecord};
use crate::domain::validation::ComponentType;
use crate::ports::ai_service::{AiModel, AiProvider};

/// Store-level failure. Callers degrade on this, never fail.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store is not configured")]
    NotConfigured,

    #[error("database error: {0}")]
    Database(String),

    #[error("row not found: {0}")]
    NotFound(String),
}

/// Filter for artifact queries.
#[derive(Debug, Clone, Default)]
pub struct ArtifactFilter {
    pub status: Option<ArtifactStatus>,
    pub component_type: Option<ComponentType>,
    pub activity_type: Option<ActivityType>,
}

/// Field merge applied by a proposal action. Only status, feedback,
/// modifications, and the review timestamp are ever touched.
#[derive(Debug, Clone)]
pub struct ArtifactUpdate {
    pub status: ArtifactStatus,
    pub reviewed_at: DateTime<Utc>,
    pub feedback: Option<String>,
    pub modifications: Option<Map<String, Value>>,
}

/// Per-project AI configuration row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<AiProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<AiModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_prompt_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_prompt_categories: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_prompt_output_format: Option<String>,
}

/// One usage log row, written after every provider call that completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLogEntry {
    pub project_id: String,
    /// Operation that consumed the tokens ("validation",
    /// "question_answer", "project_assessment").
    pub operation_type: String,
    pub provider: AiProvider,
    pub model: AiModel,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub estimated_cost: f64,
    pub latency_ms: u64,
    pub success: bool,
    #[serde(default)]
    pub artifact_ids: Vec<String>,
}

/// Aggregated usage for a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_requests: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
}

/// The narrow CRUD interface the orchestration core consumes.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Persists an artifact and returns it with store-assigned identity.
    async fn create_artifact(&self, artifact: AiArtifact) -> Result<AiArtifact, StoreError>;

    /// Lists artifacts for a project, applying the filter.
    async fn get_artifacts(
        &self,
        project_id: &str,
        filter: &ArtifactFilter,
    ) -> Result<Vec<AiArtifact>, StoreError>;

    /// Applies a review-action merge to an artifact.
    async fn update_artifact(
        &self,
        artifact_id: &str,
        update: &ArtifactUpdate,
    ) -> Result<AiArtifact, StoreError>;

    /// Appends a usage log row. Best-effort from the caller's view.
    async fn log_usage(&self, entry: &UsageLogEntry) -> Result<(), StoreError>;

    /// Aggregated usage for a project.
    async fn get_usage_stats(&self, project_id: &str) -> Result<UsageStats, StoreError>;

    /// Per-project AI configuration, when one is stored.
    async fn get_configuration(
        &self,
        project_id: &str,
    ) -> Result<Option<AiConfiguration>, StoreError>;

    /// Creates or replaces the per-project AI configuration.
    async fn upsert_configuration(
        &self,
        project_id: &str,
        config: AiConfiguration,
    ) -> Result<AiConfiguration, StoreError>;

    /// Project details, `None` when unknown.
    async fn get_project_details(
        &self,
        project_id: &str,
    ) -> Result<Option<ProjectDetails>, StoreError>;

    /// All non-deleted tasks for a project.
    async fn get_tasks(&self, project_id: &str) -> Result<Vec<TaskRecord>, StoreError>;

    /// All dependencies among a project's tasks.
    async fn get_task_dependencies(
        &self,
        project_id: &str,
    ) -> Result<Vec<TaskDependency>, StoreError>;
}
