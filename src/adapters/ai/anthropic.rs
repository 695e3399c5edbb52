//! Anthropic backend - implementation of [`AiService`] for the Claude
//! Messages API.
//!
//! One HTTP call per operation, no streaming. Transport failures are
//! logged and converted to degraded zero-usage results at this
//! boundary.

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

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic implementation of the AI service port.
pub struct AnthropicService {
    config: ProviderConfig,
    base_url: String,
    client: Client,
}

impl AnthropicService {
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

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    /// Sends one completion request and returns the text plus usage.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<(String, TokenUsage), TransportError> {
        let request = AnthropicRequest {
            model: self.config.model.as_str(),
            messages: vec![AnthropicMessage {
                role: "user",
                content: user.to_string(),
            }],
            system: Some(system.to_string()),
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
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

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        let content = parsed
            .content
            .into_iter()
            .filter_map(|block| {
                if block.block_type == "text" {
                    block.text
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        let total = parsed.usage.input_tokens + parsed.usage.output_tokens;
        let usage = TokenUsage::new(
            parsed.usage.input_tokens,
            parsed.usage.output_tokens,
            estimate_cost(self.config.model, total),
        );

        Ok((content, usage))
    }
}

#[async_trait]
impl AiService for AnthropicService {
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
                    "anthropic validation complete"
                );
                ValidationOutcome {
                    issues,
                    proposals,
                    usage,
                }
            }
            Err(err) => {
                warn!(%err, component_type = %context.component_type.as_str(), "anthropic validation failed, returning empty result");
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
                warn!(%err, project_id, "anthropic question answering failed");
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
                warn!(%err, project_id, "anthropic insight generation failed");
                (String::new(), TokenUsage::zero())
            }
        }
    }

    async fn test_connection(&self) -> bool {
        match self.complete("", "Hi", 0.0, 10).await {
            Ok(_) => true,
            Err(err) => {
                warn!(%err, "anthropic connection test failed");
                false
            }
        }
    }

    fn provider(&self) -> AiProvider {
        AiProvider::Anthropic
    }

    fn model(&self) -> AiModel {
        self.config.model
    }
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: &'static str,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_body_deserializes() {
        let body = r#"{
            "content": [{"type": "text", "text": "hello"}],
            "usage": {"input_tokens": 12, "output_tokens": 5}
        }"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.content.len(), 1);
        assert_eq!(parsed.content[0].text.as_deref(), Some("hello"));
        assert_eq!(parsed.usage.input_tokens, 12);
    }

    #[test]
    fn non_text_blocks_are_skipped() {
        let body = r#"{
            "content": [
                {"type": "tool_use", "text": null},
                {"type": "text", "text": "only this"}
            ],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }"#;
        let parsed: AnthropicResponse = serde_json::from_str(body).unwrap();
        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|b| if b.block_type == "text" { b.text } else { None })
            .collect();
        assert_eq!(text, "only this");
    }

    #[test]
    fn request_serializes_with_system() {
        let request = AnthropicRequest {
            model: "claude-3-haiku-20240307",
            messages: vec![AnthropicMessage {
                role: "user",
                content: "question".to_string(),
            }],
            system: Some("be terse".to_string()),
            max_tokens: 4000,
            temperature: 0.1,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-3-haiku-20240307");
        assert_eq!(json["system"], "be terse");
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn service_reports_identity() {
        let config = ProviderConfig::new(AiProvider::Anthropic, AiModel::Claude3Haiku, "sk-ant");
        let service = AnthropicService::new(config);
        assert_eq!(service.provider(), AiProvider::Anthropic);
        assert_eq!(service.model(), AiModel::Claude3Haiku);
    }
}
