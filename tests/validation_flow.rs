//! End-to-end flow over the handlers with a scripted backend and an
//! in-memory store: validate a component, review the proposal, ask a
//! question, assess the project, and check the usage ledger.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde_json::json;

use helm_ai::adapters::ai::MockAiService;
use helm_ai::adapters::store::InMemoryProjectStore;
use helm_ai::application::{
    AnswerQuestionCommand, AnswerQuestionHandler, AssessProjectCommand, AssessProjectHandler,
    BackendResolver, ProposalAction, ProposalActionCommand, ProposalActionHandler,
    ResolvedBackend, ValidateComponentCommand, ValidateComponentHandler,
};
use helm_ai::config::ValidationError;
use helm_ai::domain::artifact::{ActivityType, ArtifactStatus};
use helm_ai::domain::context::{ProjectDetails, TaskRecord};
use helm_ai::domain::prompt::PromptOverrides;
use helm_ai::domain::validation::{ComponentType, Severity, ValidationScope};
use helm_ai::ports::{ArtifactFilter, ProjectStore};

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

fn seeded_store() -> Arc<InMemoryProjectStore> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let store = Arc::new(InMemoryProjectStore::new());
    store.seed_project(ProjectDetails {
        id: "p1".to_string(),
        name: "Website relaunch".to_string(),
        description: Some("Rebuild the marketing site".to_string()),
        status: "active".to_string(),
    });
    store.seed_tasks(
        "p1",
        vec![
            TaskRecord {
                id: "t-1".to_string(),
                title: "brand".to_string(),
                description: None,
                status: "todo".to_string(),
                priority: "high".to_string(),
                estimated_hours: Some(4.0),
            },
            TaskRecord {
                id: "t-2".to_string(),
                title: "Deploy staging".to_string(),
                description: Some("Set up the staging environment".to_string()),
                status: "done".to_string(),
                priority: "medium".to_string(),
                estimated_hours: Some(2.0),
            },
        ],
    );
    store
}

#[tokio::test]
async fn validation_returns_issues_without_proposals() {
    let store = seeded_store();
    let mock = Arc::new(MockAiService::new().with_response(
        json!({
            "issues": [{
                "field": "title",
                "issue_type": "suggestion",
                "message": "add a noun",
                "severity": "info"
            }],
            "proposals": []
        })
        .to_string(),
    ));

    let handler = ValidateComponentHandler::new(
        store.clone(),
        Arc::new(StubResolver { service: mock }),
        Duration::hours(24),
    );

    let result = handler
        .handle(ValidateComponentCommand::new(
            "p1",
            ComponentType::Task,
            json!({"id": "t-1", "title": "brand"})
                .as_object()
                .cloned()
                .unwrap(),
        ))
        .await
        .unwrap();

    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].field, "title");
    assert_eq!(result.issues[0].severity, Severity::Info);
    assert!(result.proposals.is_empty());
}

#[tokio::test]
async fn proposal_lifecycle_from_validation_to_acceptance() {
    let store = seeded_store();
    let mock = Arc::new(MockAiService::new().with_response(
        json!({
            "issues": [],
            "proposals": [{
                "proposal_type": "field_improvement",
                "changes": {"title": "Review and approve brand identity"},
                "rationale": "Title lacked an action verb",
                "confidence": "high",
                "evidence": ["original title was 'brand'"]
            }]
        })
        .to_string(),
    ));

    let validate = ValidateComponentHandler::new(
        store.clone(),
        Arc::new(StubResolver { service: mock }),
        Duration::hours(24),
    );

    let result = validate
        .handle(
            ValidateComponentCommand::new(
                "p1",
                ComponentType::Task,
                json!({"id": "t-1", "title": "brand"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .with_scope(ValidationScope::Full),
        )
        .await
        .unwrap();

    assert_eq!(result.proposals.len(), 1);
    let proposal_id = result.proposals[0].id.clone().unwrap();
    assert_eq!(result.proposals[0].status, ArtifactStatus::Pending);
    assert_eq!(result.proposals[0].component_id.as_deref(), Some("t-1"));

    let review = ProposalActionHandler::new(store.clone());
    let accepted = review
        .handle(ProposalActionCommand {
            artifact_id: proposal_id.clone(),
            action: ProposalAction::Accept,
            feedback: Some("looks right".to_string()),
            modifications: None,
        })
        .await
        .unwrap();

    assert_eq!(accepted.status, ArtifactStatus::Accepted);
    assert!(accepted.reviewed_at.is_some());

    let pending = store
        .get_artifacts(
            "p1",
            &ArtifactFilter {
                status: Some(ArtifactStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn question_and_assessment_share_the_usage_ledger() {
    let store = seeded_store();
    let mock = Arc::new(
        MockAiService::new()
            .with_response(
                json!({
                    "answer": "One of two tasks is done.",
                    "evidence": ["task t-2 is done"]
                })
                .to_string(),
            )
            .with_response(
                json!([
                    {"rationale": "Only one task carries a description.", "confidence": "medium"}
                ])
                .to_string(),
            ),
    );
    let resolver = Arc::new(StubResolver { service: mock });

    let answer = AnswerQuestionHandler::new(store.clone(), resolver.clone());
    let result = answer
        .handle(AnswerQuestionCommand {
            project_id: "p1".to_string(),
            question: "How far along are we?".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(result.answer, "One of two tasks is done.");

    let assess = AssessProjectHandler::new(store.clone(), resolver);
    let assessment = assess
        .handle(AssessProjectCommand {
            project_id: "p1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(assessment.insights.len(), 1);

    let insights = store
        .get_artifacts(
            "p1",
            &ArtifactFilter {
                activity_type: Some(ActivityType::Insight),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(insights.len(), 1);

    let stats = store.get_usage_stats("p1").await.unwrap();
    assert_eq!(stats.total_requests, 2);
    assert!(stats.total_tokens > 0);
}
