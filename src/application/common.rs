//! Shared machinery for the AI operation handlers: backend resolution
//! from per-project configuration and best-effort usage logging.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::adapters::ai::ServiceCache;
use crate::config::ValidationError;
use crate::domain::prompt::PromptOverrides;
use crate::ports::{AiModel, AiProvider, AiService, ProjectStore, StoreError, UsageLogEntry};

/// Backend resolved for one project: the service to call plus any
/// prompt overrides the project has stored.
pub struct ResolvedBackend {
    pub service: Arc<dyn AiService>,
    pub overrides: PromptOverrides,
}

/// Resolves the AI backend to use for a project.
#[async_trait]
pub trait BackendResolver: Send + Sync {
    /// # Errors
    ///
    /// [`ValidationError::MissingRequired`] when the resolved provider
    /// has no API key configured. This is the one error the AI side of
    /// an operation can raise.
    async fn resolve(&self, project_id: &str) -> Result<ResolvedBackend, ValidationError>;
}

/// Production resolver: per-project configuration from the store,
/// instances from the service cache.
pub struct CachedBackendResolver {
    store: Arc<dyn ProjectStore>,
    services: Arc<ServiceCache>,
}

impl CachedBackendResolver {
    pub fn new(store: Arc<dyn ProjectStore>, services: Arc<ServiceCache>) -> Self {
        Self { store, services }
    }
}

#[async_trait]
impl BackendResolver for CachedBackendResolver {
    /// Per-project configuration wins where present; configuration
    /// fetch failures degrade to the global defaults. A stored provider
    /// without a usable stored model falls back to the default model
    /// when it belongs to that provider, otherwise the provider's
    /// cheapest tier.
    async fn resolve(&self, project_id: &str) -> Result<ResolvedBackend, ValidationError> {
        let configuration = match self.store.get_configuration(project_id).await {
            Ok(configuration) => configuration,
            Err(err) => {
                if !matches!(err, StoreError::NotConfigured) {
                    warn!(%err, project_id, "configuration fetch failed, using defaults");
                }
                None
            }
        };

        let (default_provider, default_model) = self.services.defaults();

        let (provider, model, overrides) = match configuration {
            Some(configuration) => {
                let provider = configuration.provider.unwrap_or(default_provider);
                let model = configuration
                    .model
                    .filter(|m| m.provider() == provider)
                    .unwrap_or_else(|| {
                        if default_model.provider() == provider {
                            default_model
                        } else {
                            cheapest_model(provider)
                        }
                    });
                let overrides = PromptOverrides {
                    system_prompt: configuration.assessment_prompt_system,
                    categories: configuration.assessment_prompt_categories,
                    output_format: configuration.assessment_prompt_output_format,
                };
                (provider, model, overrides)
            }
            None => (default_provider, default_model, PromptOverrides::default()),
        };

        let service = self.services.get_or_create(provider, model).await?;

        Ok(ResolvedBackend { service, overrides })
    }
}

/// Cheapest tier of a provider family.
pub fn cheapest_model(provider: AiProvider) -> AiModel {
    match provider {
        AiProvider::OpenAi => AiModel::Gpt4oMini,
        AiProvider::Anthropic => AiModel::Claude3Haiku,
    }
}

/// Writes a usage log row, swallowing store failures with a warning.
/// Accounting must never break the user-facing flow.
pub async fn record_usage(store: &Arc<dyn ProjectStore>, entry: UsageLogEntry) {
    if let Err(err) = store.log_usage(&entry).await {
        warn!(%err, project_id = %entry.project_id, operation = %entry.operation_type, "usage logging failed");
    }
}

/// Locally generated artifact identity, used when the store cannot
/// assign one.
pub fn local_artifact_id() -> String {
    Uuid::new_v4().to_string()
}
