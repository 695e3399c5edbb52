//! PostgreSQL project store.
//!
//! Uses runtime-checked `sqlx::query` with explicit binds. Enum-typed
//! columns are stored as their wire strings; structured payloads
//! (changes, modifications, evidence) live in JSONB columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::domain::artifact::AiArtifact;
use crate::domain::context::{ProjectDetails, TaskDependency, TaskRecord};
use crate::ports::{
    AiConfiguration, ArtifactFilter, ArtifactUpdate, ProjectStore, StoreError, UsageLogEntry,
    UsageStats,
};

/// PostgreSQL-backed implementation of the project store port.
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool from store configuration.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotConfigured`] when no database URL is set;
    /// [`StoreError::Database`] when the pool cannot connect.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let url = config
            .database_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(StoreError::NotConfigured)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
            .map_err(db_err)?;

        Ok(Self { pool })
    }
}

fn db_err(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
        other => StoreError::Database(other.to_string()),
    }
}

/// Parses an enum column stored as its serde wire string.
fn parse_wire<T: DeserializeOwned>(raw: &str) -> Result<T, StoreError> {
    serde_json::from_value(Value::String(raw.to_string()))
        .map_err(|e| StoreError::Database(format!("bad enum value {raw:?}: {e}")))
}

/// Serializes an enum to its serde wire string.
fn wire_str<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    match serde_json::to_value(value).map_err(|e| StoreError::Database(e.to_string()))? {
        Value::String(s) => Ok(s),
        other => Err(StoreError::Database(format!(
            "expected string wire form, got {other}"
        ))),
    }
}

fn row_to_artifact(row: &PgRow) -> Result<AiArtifact, StoreError> {
    let activity_type: String = row.try_get("activity_type").map_err(db_err)?;
    let proposal_type: Option<String> = row.try_get("proposal_type").map_err(db_err)?;
    let component_type: Option<String> = row.try_get("component_type").map_err(db_err)?;
    let confidence: Option<String> = row.try_get("confidence").map_err(db_err)?;
    let status: String = row.try_get("status").map_err(db_err)?;
    let changes: Option<Value> = row.try_get("changes").map_err(db_err)?;
    let modifications: Option<Value> = row.try_get("modifications").map_err(db_err)?;
    let evidence: Option<Value> = row.try_get("evidence").map_err(db_err)?;

    Ok(AiArtifact {
        id: Some(row.try_get("id").map_err(db_err)?),
        project_id: row.try_get("project_id").map_err(db_err)?,
        activity_type: parse_wire(&activity_type)?,
        proposal_type: proposal_type.as_deref().map(parse_wire).transpose()?,
        component_type: component_type.as_deref().map(parse_wire).transpose()?,
        component_id: row.try_get("component_id").map_err(db_err)?,
        changes: changes.and_then(|v| v.as_object().cloned()),
        rationale: row.try_get("rationale").map_err(db_err)?,
        confidence: confidence.as_deref().map(parse_wire).transpose()?,
        evidence: evidence
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default(),
        estimated_impact: row.try_get("estimated_impact").map_err(db_err)?,
        parent_id: row.try_get("parent_id").map_err(db_err)?,
        status: parse_wire(&status)?,
        feedback: row.try_get("feedback").map_err(db_err)?,
        modifications: modifications.and_then(|v| v.as_object().cloned()),
        reviewed_at: row.try_get("reviewed_at").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        expires_at: row.try_get("expires_at").map_err(db_err)?,
    })
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn create_artifact(&self, mut artifact: AiArtifact) -> Result<AiArtifact, StoreError> {
        let id = artifact
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        let created_at = *artifact.created_at.get_or_insert_with(Utc::now);

        sqlx::query(
            r#"
            INSERT INTO ai_artifacts (
                id, project_id, activity_type, proposal_type, component_type,
                component_id, changes, rationale, confidence, evidence,
                estimated_impact, parent_id, status, created_at, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(&id)
        .bind(&artifact.project_id)
        .bind(wire_str(&artifact.activity_type)?)
        .bind(
            artifact
                .proposal_type
                .as_ref()
                .map(wire_str)
                .transpose()?,
        )
        .bind(
            artifact
                .component_type
                .as_ref()
                .map(wire_str)
                .transpose()?,
        )
        .bind(&artifact.component_id)
        .bind(artifact.changes.as_ref().map(|c| Value::Object(c.clone())))
        .bind(&artifact.rationale)
        .bind(artifact.confidence.as_ref().map(wire_str).transpose()?)
        .bind(
            serde_json::to_value(&artifact.evidence)
                .map_err(|e| StoreError::Database(e.to_string()))?,
        )
        .bind(&artifact.estimated_impact)
        .bind(&artifact.parent_id)
        .bind(wire_str(&artifact.status)?)
        .bind(created_at)
        .bind(artifact.expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(artifact)
    }

    async fn get_artifacts(
        &self,
        project_id: &str,
        filter: &ArtifactFilter,
    ) -> Result<Vec<AiArtifact>, StoreError> {
        let status = filter.status.as_ref().map(wire_str).transpose()?;
        let component_type = filter.component_type.as_ref().map(wire_str).transpose()?;
        let activity_type = filter.activity_type.as_ref().map(wire_str).transpose()?;

        let rows = sqlx::query(
            r#"
            SELECT id, project_id, activity_type, proposal_type, component_type,
                   component_id, changes, rationale, confidence, evidence,
                   estimated_impact, parent_id, status, feedback, modifications,
                   reviewed_at, created_at, expires_at
            FROM ai_artifacts
            WHERE project_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR component_type = $3)
              AND ($4::text IS NULL OR activity_type = $4)
            ORDER BY created_at DESC
            "#,
        )
        .bind(project_id)
        .bind(status)
        .bind(component_type)
        .bind(activity_type)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_artifact).collect()
    }

    async fn update_artifact(
        &self,
        artifact_id: &str,
        update: &ArtifactUpdate,
    ) -> Result<AiArtifact, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE ai_artifacts
            SET status = $2,
                reviewed_at = $3,
                feedback = COALESCE($4, feedback),
                modifications = COALESCE($5, modifications)
            WHERE id = $1
            RETURNING id, project_id, activity_type, proposal_type, component_type,
                      component_id, changes, rationale, confidence, evidence,
                      estimated_impact, parent_id, status, feedback, modifications,
                      reviewed_at, created_at, expires_at
            "#,
        )
        .bind(artifact_id)
        .bind(wire_str(&update.status)?)
        .bind(update.reviewed_at)
        .bind(&update.feedback)
        .bind(
            update
                .modifications
                .as_ref()
                .map(|m| Value::Object(m.clone())),
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or_else(|| StoreError::NotFound(artifact_id.to_string()))?;

        row_to_artifact(&row)
    }

    async fn log_usage(&self, entry: &UsageLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ai_usage_log (
                id, project_id, operation_type, provider, model,
                prompt_tokens, completion_tokens, total_tokens,
                estimated_cost, latency_ms, success, artifact_ids, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&entry.project_id)
        .bind(&entry.operation_type)
        .bind(entry.provider.as_str())
        .bind(entry.model.as_str())
        .bind(entry.prompt_tokens as i32)
        .bind(entry.completion_tokens as i32)
        .bind(entry.total_tokens as i32)
        .bind(entry.estimated_cost)
        .bind(entry.latency_ms as i64)
        .bind(entry.success)
        .bind(
            serde_json::to_value(&entry.artifact_ids)
                .map_err(|e| StoreError::Database(e.to_string()))?,
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_usage_stats(&self, project_id: &str) -> Result<UsageStats, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total_requests,
                   COALESCE(SUM(total_tokens), 0)::bigint AS total_tokens,
                   COALESCE(SUM(estimated_cost), 0)::double precision AS total_cost
            FROM ai_usage_log
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let total_requests: i64 = row.try_get("total_requests").map_err(db_err)?;
        let total_tokens: i64 = row.try_get("total_tokens").map_err(db_err)?;
        let total_cost: f64 = row.try_get("total_cost").map_err(db_err)?;

        Ok(UsageStats {
            total_requests: total_requests.max(0) as u64,
            total_tokens: total_tokens.max(0) as u64,
            total_cost,
        })
    }

    async fn get_configuration(
        &self,
        project_id: &str,
    ) -> Result<Option<AiConfiguration>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT provider, model, assessment_prompt_system,
                   assessment_prompt_categories, assessment_prompt_output_format
            FROM ai_configurations
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let provider: Option<String> = row.try_get("provider").map_err(db_err)?;
        let model: Option<String> = row.try_get("model").map_err(db_err)?;

        Ok(Some(AiConfiguration {
            provider: provider.as_deref().map(parse_wire).transpose()?,
            model: model.as_deref().map(parse_wire).transpose()?,
            assessment_prompt_system: row.try_get("assessment_prompt_system").map_err(db_err)?,
            assessment_prompt_categories: row
                .try_get("assessment_prompt_categories")
                .map_err(db_err)?,
            assessment_prompt_output_format: row
                .try_get("assessment_prompt_output_format")
                .map_err(db_err)?,
        }))
    }

    async fn upsert_configuration(
        &self,
        project_id: &str,
        config: AiConfiguration,
    ) -> Result<AiConfiguration, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ai_configurations (
                project_id, provider, model, assessment_prompt_system,
                assessment_prompt_categories, assessment_prompt_output_format,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (project_id) DO UPDATE SET
                provider = EXCLUDED.provider,
                model = EXCLUDED.model,
                assessment_prompt_system = EXCLUDED.assessment_prompt_system,
                assessment_prompt_categories = EXCLUDED.assessment_prompt_categories,
                assessment_prompt_output_format = EXCLUDED.assessment_prompt_output_format,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(project_id)
        .bind(config.provider.as_ref().map(wire_str).transpose()?)
        .bind(config.model.as_ref().map(wire_str).transpose()?)
        .bind(&config.assessment_prompt_system)
        .bind(&config.assessment_prompt_categories)
        .bind(&config.assessment_prompt_output_format)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(config)
    }

    async fn get_project_details(
        &self,
        project_id: &str,
    ) -> Result<Option<ProjectDetails>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, status
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(ProjectDetails {
            id: row.try_get("id").map_err(db_err)?,
            name: row.try_get("name").map_err(db_err)?,
            description: row.try_get("description").map_err(db_err)?,
            status: row.try_get("status").map_err(db_err)?,
        }))
    }

    async fn get_tasks(&self, project_id: &str) -> Result<Vec<TaskRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, status, priority, estimated_hours
            FROM tasks
            WHERE project_id = $1 AND deleted_at IS NULL
            ORDER BY created_at
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(TaskRecord {
                    id: row.try_get("id").map_err(db_err)?,
                    title: row.try_get("title").map_err(db_err)?,
                    description: row.try_get("description").map_err(db_err)?,
                    status: row.try_get("status").map_err(db_err)?,
                    priority: row.try_get("priority").map_err(db_err)?,
                    estimated_hours: row.try_get("estimated_hours").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn get_task_dependencies(
        &self,
        project_id: &str,
    ) -> Result<Vec<TaskDependency>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.task_id, d.depends_on_task_id, d.dependency_type
            FROM task_dependencies d
            JOIN tasks t ON t.id = d.task_id
            WHERE t.project_id = $1 AND t.deleted_at IS NULL
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(TaskDependency {
                    id: row.try_get("id").map_err(db_err)?,
                    task_id: row.try_get("task_id").map_err(db_err)?,
                    depends_on_task_id: row.try_get("depends_on_task_id").map_err(db_err)?,
                    dependency_type: row.try_get("dependency_type").map_err(db_err)?,
                })
            })
            .collect()
    }
}
