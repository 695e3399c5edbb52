//! Service cache - one shared [`AiService`] instance per
//! (provider, model) pair.
//!
//! The only error that ever surfaces from the AI side of the core:
//! asking for a provider whose API key is not configured. Everything
//! downstream of a successfully constructed service degrades instead
//! of failing.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::adapters::ai::{AnthropicService, OpenAiService};
use crate::config::{AiConfig, ValidationError};
use crate::ports::{AiModel, AiProvider, AiService, ProviderConfig};

/// Lazily constructed, process-lifetime cache of AI service instances.
pub struct ServiceCache {
    config: AiConfig,
    services: RwLock<HashMap<(AiProvider, AiModel), Arc<dyn AiService>>>,
}

impl ServiceCache {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            services: RwLock::new(HashMap::new()),
        }
    }

    /// Default provider/model pair from configuration.
    pub fn defaults(&self) -> (AiProvider, AiModel) {
        (self.config.default_provider, self.config.default_model)
    }

    /// Returns the cached service for the pair, constructing it on
    /// first use.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingRequired`] when the provider's API key
    /// is not configured. This is the one error the AI side raises.
    pub async fn get_or_create(
        &self,
        provider: AiProvider,
        model: AiModel,
    ) -> Result<Arc<dyn AiService>, ValidationError> {
        let key = (provider, model);

        {
            let services = self.services.read().await;
            if let Some(service) = services.get(&key) {
                return Ok(Arc::clone(service));
            }
        }

        let service = self.build(provider, model)?;

        let mut services = self.services.write().await;
        // Another task may have built it while we held no lock.
        let entry = services.entry(key).or_insert(service);
        Ok(Arc::clone(entry))
    }

    fn build(
        &self,
        provider: AiProvider,
        model: AiModel,
    ) -> Result<Arc<dyn AiService>, ValidationError> {
        let api_key = self
            .config
            .api_key_for(provider)
            .ok_or(match provider {
                AiProvider::OpenAi => ValidationError::MissingRequired("OPENAI_API_KEY"),
                AiProvider::Anthropic => ValidationError::MissingRequired("ANTHROPIC_API_KEY"),
            })?
            .to_string();

        let provider_config = ProviderConfig::new(provider, model, api_key)
            .with_max_tokens(self.config.max_tokens_per_request)
            .with_temperature(self.config.temperature)
            .with_timeout(self.config.timeout());

        info!(%provider, %model, "constructing AI service");

        let service: Arc<dyn AiService> = match provider {
            AiProvider::OpenAi => Arc::new(OpenAiService::new(provider_config)),
            AiProvider::Anthropic => Arc::new(AnthropicService::new(provider_config)),
        };

        Ok(service)
    }

    /// Drops all cached instances. Subsequent lookups rebuild.
    pub async fn clear(&self) {
        self.services.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_openai() -> AiConfig {
        AiConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn returns_same_instance_for_same_pair() {
        let cache = ServiceCache::new(config_with_openai());

        let a = cache
            .get_or_create(AiProvider::OpenAi, AiModel::Gpt4oMini)
            .await
            .unwrap();
        let b = cache
            .get_or_create(AiProvider::OpenAi, AiModel::Gpt4oMini)
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn different_models_get_different_instances() {
        let cache = ServiceCache::new(config_with_openai());

        let mini = cache
            .get_or_create(AiProvider::OpenAi, AiModel::Gpt4oMini)
            .await
            .unwrap();
        let full = cache
            .get_or_create(AiProvider::OpenAi, AiModel::Gpt4o)
            .await
            .unwrap();

        assert!(!Arc::ptr_eq(&mini, &full));
        assert_eq!(mini.model(), AiModel::Gpt4oMini);
        assert_eq!(full.model(), AiModel::Gpt4o);
    }

    #[tokio::test]
    async fn missing_key_surfaces_as_config_error() {
        let cache = ServiceCache::new(config_with_openai());

        let err = cache
            .get_or_create(AiProvider::Anthropic, AiModel::Claude3Haiku)
            .await
            .err()
            .unwrap();

        assert_eq!(err, ValidationError::MissingRequired("ANTHROPIC_API_KEY"));
    }

    #[tokio::test]
    async fn clear_rebuilds_instances() {
        let cache = ServiceCache::new(config_with_openai());

        let before = cache
            .get_or_create(AiProvider::OpenAi, AiModel::Gpt4oMini)
            .await
            .unwrap();
        cache.clear().await;
        let after = cache
            .get_or_create(AiProvider::OpenAi, AiModel::Gpt4oMini)
            .await
            .unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn defaults_come_from_config() {
        let cache = ServiceCache::new(config_with_openai());
        assert_eq!(cache.defaults(), (AiProvider::OpenAi, AiModel::Gpt4oMini));
    }
}
