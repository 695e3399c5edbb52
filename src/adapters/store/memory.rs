//! In-memory project store for tests and store-less development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::artifact::AiArtifact;
use crate::domain::context::{ProjectDetails, TaskDependency, TaskRecord};
use crate::ports::{
    AiConfiguration, ArtifactFilter, ArtifactUpdate, ProjectStore, StoreError, UsageLogEntry,
    UsageStats,
};

#[derive(Default)]
struct Inner {
    artifacts: HashMap<String, AiArtifact>,
    usage: Vec<UsageLogEntry>,
    configurations: HashMap<String, AiConfiguration>,
    projects: HashMap<String, ProjectDetails>,
    tasks: HashMap<String, Vec<TaskRecord>>,
    dependencies: HashMap<String, Vec<TaskDependency>>,
}

/// HashMap-backed store. Seeding helpers populate project data; the
/// rest behaves like the real store.
#[derive(Default)]
pub struct InMemoryProjectStore {
    inner: Mutex<Inner>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a project row.
    pub fn seed_project(&self, project: ProjectDetails) {
        let mut inner = self.inner.lock().unwrap();
        inner.projects.insert(project.id.clone(), project);
    }

    /// Seeds task rows for a project.
    pub fn seed_tasks(&self, project_id: &str, tasks: Vec<TaskRecord>) {
        let mut inner = self.inner.lock().unwrap();
        inner.tasks.insert(project_id.to_string(), tasks);
    }

    /// Seeds dependency rows for a project.
    pub fn seed_dependencies(&self, project_id: &str, dependencies: Vec<TaskDependency>) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .dependencies
            .insert(project_id.to_string(), dependencies);
    }

    /// Usage log rows written so far, in write order.
    pub fn usage_entries(&self) -> Vec<UsageLogEntry> {
        self.inner.lock().unwrap().usage.clone()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn create_artifact(&self, mut artifact: AiArtifact) -> Result<AiArtifact, StoreError> {
        let id = artifact
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        artifact.created_at.get_or_insert_with(Utc::now);

        let mut inner = self.inner.lock().unwrap();
        inner.artifacts.insert(id, artifact.clone());
        Ok(artifact)
    }

    async fn get_artifacts(
        &self,
        project_id: &str,
        filter: &ArtifactFilter,
    ) -> Result<Vec<AiArtifact>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut matched: Vec<AiArtifact> = inner
            .artifacts
            .values()
            .filter(|a| a.project_id.as_deref() == Some(project_id))
            .filter(|a| filter.status.map_or(true, |s| a.status == s))
            .filter(|a| {
                filter
                    .component_type
                    .map_or(true, |ct| a.component_type == Some(ct))
            })
            .filter(|a| filter.activity_type.map_or(true, |at| a.activity_type == at))
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn update_artifact(
        &self,
        artifact_id: &str,
        update: &ArtifactUpdate,
    ) -> Result<AiArtifact, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let artifact = inner
            .artifacts
            .get_mut(artifact_id)
            .ok_or_else(|| StoreError::NotFound(artifact_id.to_string()))?;

        artifact.status = update.status;
        artifact.reviewed_at = Some(update.reviewed_at);
        if let Some(feedback) = &update.feedback {
            artifact.feedback = Some(feedback.clone());
        }
        if let Some(modifications) = &update.modifications {
            artifact.modifications = Some(modifications.clone());
        }

        Ok(artifact.clone())
    }

    async fn log_usage(&self, entry: &UsageLogEntry) -> Result<(), StoreError> {
        self.inner.lock().unwrap().usage.push(entry.clone());
        Ok(())
    }

    async fn get_usage_stats(&self, project_id: &str) -> Result<UsageStats, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut stats = UsageStats::default();
        for entry in inner.usage.iter().filter(|e| e.project_id == project_id) {
            stats.total_requests += 1;
            stats.total_tokens += u64::from(entry.total_tokens);
            stats.total_cost += entry.estimated_cost;
        }
        Ok(stats)
    }

    async fn get_configuration(
        &self,
        project_id: &str,
    ) -> Result<Option<AiConfiguration>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.configurations.get(project_id).cloned())
    }

    async fn upsert_configuration(
        &self,
        project_id: &str,
        config: AiConfiguration,
    ) -> Result<AiConfiguration, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .configurations
            .insert(project_id.to_string(), config.clone());
        Ok(config)
    }

    async fn get_project_details(
        &self,
        project_id: &str,
    ) -> Result<Option<ProjectDetails>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.projects.get(project_id).cloned())
    }

    async fn get_tasks(&self, project_id: &str) -> Result<Vec<TaskRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.tasks.get(project_id).cloned().unwrap_or_default())
    }

    async fn get_task_dependencies(
        &self,
        project_id: &str,
    ) -> Result<Vec<TaskDependency>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .dependencies
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Store stand-in used when no database is configured. Every operation
/// reports [`StoreError::NotConfigured`], exercising the degraded
/// paths of the orchestrators.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProjectStore;

#[async_trait]
impl ProjectStore for NullProjectStore {
    async fn create_artifact(&self, _artifact: AiArtifact) -> Result<AiArtifact, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn get_artifacts(
        &self,
        _project_id: &str,
        _filter: &ArtifactFilter,
    ) -> Result<Vec<AiArtifact>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn update_artifact(
        &self,
        _artifact_id: &str,
        _update: &ArtifactUpdate,
    ) -> Result<AiArtifact, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn log_usage(&self, _entry: &UsageLogEntry) -> Result<(), StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn get_usage_stats(&self, _project_id: &str) -> Result<UsageStats, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn get_configuration(
        &self,
        _project_id: &str,
    ) -> Result<Option<AiConfiguration>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn upsert_configuration(
        &self,
        _project_id: &str,
        _config: AiConfiguration,
    ) -> Result<AiConfiguration, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn get_project_details(
        &self,
        _project_id: &str,
    ) -> Result<Option<ProjectDetails>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn get_tasks(&self, _project_id: &str) -> Result<Vec<TaskRecord>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn get_task_dependencies(
        &self,
        _project_id: &str,
    ) -> Result<Vec<TaskDependency>, StoreError> {
        Err(StoreError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifact::{ActivityType, ArtifactStatus, ConfidenceLevel};
    use serde_json::Map;

    #[tokio::test]
    async fn create_assigns_identity_and_timestamp() {
        let store = InMemoryProjectStore::new();
        let mut insight = AiArtifact::insight("observation", ConfidenceLevel::High);
        insight.project_id = Some("p1".to_string());

        let saved = store.create_artifact(insight).await.unwrap();
        assert!(saved.id.is_some());
        assert!(saved.created_at.is_some());
    }

    #[tokio::test]
    async fn filter_narrows_by_activity_and_status() {
        let store = InMemoryProjectStore::new();

        let mut insight = AiArtifact::insight("a", ConfidenceLevel::Low);
        insight.project_id = Some("p1".to_string());
        store.create_artifact(insight).await.unwrap();

        let question = AiArtifact::question("p1", "when?");
        store.create_artifact(question).await.unwrap();

        let filter = ArtifactFilter {
            activity_type: Some(ActivityType::Insight),
            ..Default::default()
        };
        let found = store.get_artifacts("p1", &filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].activity_type, ActivityType::Insight);

        let all = store
            .get_artifacts("p1", &ArtifactFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn update_merges_review_fields_only() {
        let store = InMemoryProjectStore::new();
        let mut insight = AiArtifact::insight("a", ConfidenceLevel::Low);
        insight.project_id = Some("p1".to_string());
        let saved = store.create_artifact(insight).await.unwrap();
        let id = saved.id.clone().unwrap();

        let mut modifications = Map::new();
        modifications.insert("title".to_string(), serde_json::json!("edited"));

        let update = ArtifactUpdate {
            status: ArtifactStatus::Modified,
            reviewed_at: Utc::now(),
            feedback: Some("tweaked wording".to_string()),
            modifications: Some(modifications),
        };

        let updated = store.update_artifact(&id, &update).await.unwrap();
        assert_eq!(updated.status, ArtifactStatus::Modified);
        assert_eq!(updated.feedback.as_deref(), Some("tweaked wording"));
        assert!(updated.modifications.is_some());
        assert!(updated.reviewed_at.is_some());
        // Untouched fields survive the merge.
        assert_eq!(updated.rationale, "a");
    }

    #[tokio::test]
    async fn update_unknown_artifact_is_not_found() {
        let store = InMemoryProjectStore::new();
        let update = ArtifactUpdate {
            status: ArtifactStatus::Accepted,
            reviewed_at: Utc::now(),
            feedback: None,
            modifications: None,
        };
        let err = store.update_artifact("missing", &update).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn usage_stats_aggregate_per_project() {
        let store = InMemoryProjectStore::new();
        let entry = |project: &str, tokens: u32, cost: f64| UsageLogEntry {
            project_id: project.to_string(),
            operation_type: "validation".to_string(),
            provider: crate::ports::AiProvider::OpenAi,
            model: crate::ports::AiModel::Gpt4oMini,
            prompt_tokens: tokens / 2,
            completion_tokens: tokens - tokens / 2,
            total_tokens: tokens,
            estimated_cost: cost,
            latency_ms: 100,
            success: true,
            artifact_ids: vec![],
        };

        store.log_usage(&entry("p1", 100, 0.01)).await.unwrap();
        store.log_usage(&entry("p1", 200, 0.02)).await.unwrap();
        store.log_usage(&entry("p2", 400, 0.04)).await.unwrap();

        let stats = store.get_usage_stats("p1").await.unwrap();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.total_tokens, 300);
        assert!((stats.total_cost - 0.03).abs() < 1e-9);
    }

    #[tokio::test]
    async fn configuration_round_trips() {
        let store = InMemoryProjectStore::new();
        assert!(store.get_configuration("p1").await.unwrap().is_none());

        let config = AiConfiguration {
            provider: Some(crate::ports::AiProvider::Anthropic),
            model: Some(crate::ports::AiModel::Claude3Haiku),
            ..Default::default()
        };
        store
            .upsert_configuration("p1", config.clone())
            .await
            .unwrap();

        let loaded = store.get_configuration("p1").await.unwrap();
        assert_eq!(loaded, Some(config));
    }

    #[tokio::test]
    async fn null_store_reports_not_configured() {
        let store = NullProjectStore;
        assert!(matches!(
            store.get_tasks("p1").await,
            Err(StoreError::NotConfigured)
        ));
        assert!(matches!(
            store.get_usage_stats("p1").await,
            Err(StoreError::NotConfigured)
        ));
    }
}
