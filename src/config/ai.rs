//! AI provider configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::ports::{AiModel, AiProvider};

/// AI provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key.
    pub openai_api_key: Option<String>,

    /// Anthropic API key.
    pub anthropic_api_key: Option<String>,

    /// Provider used when a project has no stored configuration.
    #[serde(default = "default_provider")]
    pub default_provider: AiProvider,

    /// Model used when a project has no stored configuration.
    #[serde(default = "default_model")]
    pub default_model: AiModel,

    /// Max tokens per provider request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens_per_request: u32,

    /// Provider request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Temperature for validation requests.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Hours until a persisted proposal goes stale.
    #[serde(default = "default_proposal_expiry")]
    pub proposal_expiry_hours: i64,
}

impl AiConfig {
    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check if OpenAI is configured.
    pub fn has_openai(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Check if Anthropic is configured.
    pub fn has_anthropic(&self) -> bool {
        self.anthropic_api_key
            .as_ref()
            .is_some_and(|k| !k.is_empty())
    }

    /// API key for a provider, when configured.
    pub fn api_key_for(&self, provider: AiProvider) -> Option<&str> {
        let key = match provider {
            AiProvider::OpenAi => self.openai_api_key.as_deref(),
            AiProvider::Anthropic => self.anthropic_api_key.as_deref(),
        };
        key.filter(|k| !k.is_empty())
    }

    /// Validate AI configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_openai() && !self.has_anthropic() {
            return Err(ValidationError::NoAiProviderConfigured);
        }

        match self.default_provider {
            AiProvider::OpenAi if !self.has_openai() => {
                return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
            }
            AiProvider::Anthropic if !self.has_anthropic() => {
                return Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"));
            }
            _ => {}
        }

        if self.default_model.provider() != self.default_provider {
            return Err(ValidationError::InvalidValue {
                field: "default_model",
                reason: format!(
                    "model {} does not belong to provider {}",
                    self.default_model, self.default_provider
                ),
            });
        }

        if self.proposal_expiry_hours <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "proposal_expiry_hours",
                reason: "must be positive".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            max_tokens_per_request: default_max_tokens(),
            request_timeout_secs: default_timeout(),
            temperature: default_temperature(),
            proposal_expiry_hours: default_proposal_expiry(),
        }
    }
}

fn default_provider() -> AiProvider {
    AiProvider::OpenAi
}

fn default_model() -> AiModel {
    AiModel::Gpt4oMini
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_timeout() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.1
}

fn default_proposal_expiry() -> i64 {
    24
}
