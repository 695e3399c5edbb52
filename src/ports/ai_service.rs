//! AI Service Port - the provider-agnostic contract every LLM backend
//! implements.
//!
//! The provider family is a tagged variant ([`AiProvider`]), not an
//! inheritance tree: adding a backend means adding an enum variant and
//! a trait implementation, selected through the service cache.
//!
//! Transport failures are absorbed at this boundary: `validate_component`,
//! `answer_question`, and `generate_insights` return degraded results with
//! zero usage instead of propagating errors, keeping the caller's flow
//! synchronous-successful. Only configuration problems surface (see the
//! factory in `adapters::ai`).

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::artifact::AiArtifact;
use crate::domain::context::ProjectContextSnapshot;
use crate::domain::usage::TokenUsage;
use crate::domain::validation::{ValidationContext, ValidationIssue, ValidationScope};

/// Supported backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAi,
    Anthropic,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Anthropic => "anthropic",
        }
    }
}

impl std::str::FromStr for AiProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(AiProvider::OpenAi),
            "anthropic" => Ok(AiProvider::Anthropic),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported models across both backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiModel {
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "claude-3-haiku-20240307")]
    Claude3Haiku,
    #[serde(rename = "claude-3-sonnet-20240229")]
    Claude3Sonnet,
}

impl AiModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiModel::Gpt4oMini => "gpt-4o-mini",
            AiModel::Gpt4o => "gpt-4o",
            AiModel::Claude3Haiku => "claude-3-haiku-20240307",
            AiModel::Claude3Sonnet => "claude-3-sonnet-20240229",
        }
    }

    /// The backend family this model belongs to.
    pub fn provider(&self) -> AiProvider {
        match self {
            AiModel::Gpt4oMini | AiModel::Gpt4o => AiProvider::OpenAi,
            AiModel::Claude3Haiku | AiModel::Claude3Sonnet => AiProvider::Anthropic,
        }
    }
}

impl std::str::FromStr for AiModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gpt-4o-mini" => Ok(AiModel::Gpt4oMini),
            "gpt-4o" => Ok(AiModel::Gpt4o),
            "claude-3-haiku-20240307" => Ok(AiModel::Claude3Haiku),
            "claude-3-sonnet-20240229" => Ok(AiModel::Claude3Sonnet),
            other => Err(format!("unknown model: {other}")),
        }
    }
}

impl std::fmt::Display for AiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration owned by one AI service instance.
///
/// One instance is cached per (provider, model) pair for the lifetime
/// of the orchestrating process.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: AiProvider,
    pub model: AiModel,
    api_key: Secret<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Creates a configuration with default generation settings.
    pub fn new(provider: AiProvider, model: AiModel, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            model,
            api_key: Secret::new(api_key.into()),
            max_tokens: 4000,
            temperature: 0.1,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key for request signing.
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Result of a validation call: findings plus usage accounting.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub issues: Vec<ValidationIssue>,
    pub proposals: Vec<AiArtifact>,
    pub usage: TokenUsage,
}

/// Transport-level failure talking to a backend.
///
/// Always caught at the AI service boundary and converted to a degraded
/// zero-usage result; never propagated to orchestrators.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl TransportError {
    /// Classifies a reqwest error into the transport taxonomy.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                timeout_secs: timeout.as_secs(),
            }
        } else if err.is_connect() {
            TransportError::Network(format!("connection failed: {err}"))
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// The four-operation contract implemented identically by every backend.
#[async_trait]
pub trait AiService: Send + Sync {
    /// Validates a component, building a scope-specific prompt.
    ///
    /// On transport failure returns empty issues/proposals and zero
    /// usage; the error is logged, not raised.
    async fn validate_component(
        &self,
        context: &ValidationContext,
        scope: ValidationScope,
    ) -> ValidationOutcome;

    /// Answers a question against the project snapshot.
    ///
    /// Returns `(answer_text, evidence, usage)`. A non-JSON reply
    /// becomes the whole answer with empty evidence.
    async fn answer_question(
        &self,
        question: &str,
        project_id: &str,
        snapshot: &ProjectContextSnapshot,
    ) -> (String, Vec<String>, TokenUsage);

    /// Thin passthrough for insight generation: returns the provider's
    /// raw text (expected to be a JSON array) for downstream recovery.
    async fn generate_insights(&self, prompt: &str, project_id: &str) -> (String, TokenUsage);

    /// Sends a minimal request; false (never an error) on any failure.
    async fn test_connection(&self) -> bool;

    /// Backend family of this instance.
    fn provider(&self) -> AiProvider;

    /// Model of this instance.
    fn model(&self) -> AiModel;
}
