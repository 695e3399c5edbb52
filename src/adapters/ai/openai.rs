//! OpenAI backend - implementation of [`AiService`] for the Chat
//! Completions API.
//!
//! Mirrors the Anthropic adapter: one HTTP call per operation, raw text
//! routed through response recovery, transport failures absorbed into
//! degraded zero-usage results.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cost::estimate_cost;
use super::{INSIGHTS_TEMPERATURE, QA_TEMPERATURE};
use crate::domain::context::ProjectContextSnapshot;
use crate::domain::prompt::{
    self, INSIGHTS_PREAMBLE, QUESTION_SYSTEM_PROMPT, VALIDATION_SYSTEM_PROMPT,
};
use crate::domain::recovery;
use crate::domain::usage::TokenUsage;
use crate::domain::validation::{ValidationContext, ValidationScope};
use crate::ports::{AiModel, AiProvider, AiService, ProviderConfig, TransportError, ValidationOutcome};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI implementation of the AI service port.
pub struct OpenAiService {
    config: ProviderConfig,
    base_url: String,
    client: Client,
}

impl OpenAiService {
    /// Creates a service instance for one (provider, model) pair.
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        }
    }

    /// Overrides the API base URL (for tests against a local server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Sends one completion request and returns the text plus usage.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<(String, TokenUsage), TransportError> {
        let request = ChatRequest {
            model: self.config.model.as_str(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(TransportError::AuthenticationFailed);
            }
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TransportError::MalformedResponse("response had no choices".to_string()))?;

        let total = parsed.usage.prompt_tokens + parsed.usage.completion_tokens;
        let usage = TokenUsage::new(
            parsed.usage.prompt_tokens,
            parsed.usage.completion_tokens,
            estimate_cost(self.config.model, total),
        );

        Ok((content, usage))
    }
}

#[async_trait]
impl AiService for OpenAiService {
    async fn validate_component(
        &self,
        context: &ValidationContext,
        scope: ValidationScope,
    ) -> ValidationOutcome {
        let user_prompt = prompt::validation_prompt(context, scope);

        match self
            .complete(
                VALIDATION_SYSTEM_PROMPT,
                &user_prompt,
                self.config.temperature,
                self.config.max_tokens,
            )
            .await
        {
            Ok((content, usage)) => {
                let (issues, proposals) = recovery::parse_validation_response(&content, context);
                debug!(
                    issues = issues.len(),
                    proposals = proposals.len(),
                    "openai validation complete"
                );
                ValidationOutcome {
                    issues,
                    proposals,
                    usage,
                }
            }
            Err(err) => {
                warn!(%err, component_type = %context.component_type.as_str(), "openai validation failed, returning empty result");
                ValidationOutcome::default()
            }
        }
    }

    async fn answer_question(
        &self,
        question: &str,
        project_id: &str,
        snapshot: &ProjectContextSnapshot,
    ) -> (String, Vec<String>, TokenUsage) {
        let user_prompt = prompt::question_prompt(question, project_id, snapshot);

        match self
            .complete(
                QUESTION_SYSTEM_PROMPT,
                &user_prompt,
                QA_TEMPERATURE,
                self.config.max_tokens,
            )
            .await
        {
            Ok((content, usage)) => {
                let (answer, evidence) = recovery::parse_answer(&content);
                (answer, evidence, usage)
            }
            Err(err) => {
                warn!(%err, project_id, "openai question answering failed");
                (
                    "Unable to reach the AI provider right now. Please try again.".to_string(),
                    Vec::new(),
                    TokenUsage::zero(),
                )
            }
        }
    }

    async fn generate_insights(&self, prompt: &str, project_id: &str) -> (String, TokenUsage) {
        match self
            .complete(
                INSIGHTS_PREAMBLE,
                prompt,
                INSIGHTS_TEMPERATURE,
                self.config.max_tokens,
            )
            .await
        {
            Ok((content, usage)) => (content, usage),
            Err(err) => {
                warn!(%err, project_id, "openai insight generation failed");
                (String::new(), TokenUsage::zero())
            }
        }
    }

    async fn test_connection(&self) -> bool {
        match self.complete("Reply with OK.", "Hi", 0.0, 10).await {
            Ok(_) => true,
            Err(err) => {
                warn!(%err, "openai connection test failed");
                false
            }
        }
    }

    fn provider(&self) -> AiProvider {
        AiProvider::OpenAi
    }

    fn model(&self) -> AiModel {
        self.config.model
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: ChatUsage,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
