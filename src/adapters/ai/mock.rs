//! Mock AI service for tests.
//!
//! Scripted raw responses are run through the same response-recovery
//! pipeline the real backends use, so tests exercise parsing and
//! degradation exactly as production does. Captured prompts let tests
//! assert on what would have been sent over the wire.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::context::ProjectContextSnapshot;
use crate::domain::prompt;
use crate::domain::recovery;
use crate::domain::usage::TokenUsage;
use crate::domain::validation::{ValidationContext, ValidationScope};
use crate::ports::{AiModel, AiProvider, AiService, ValidationOutcome};

/// Scripted [`AiService`] implementation.
pub struct MockAiService {
    provider: AiProvider,
    model: AiModel,
    responses: Mutex<VecDeque<String>>,
    usage_per_call: TokenUsage,
    connection_ok: bool,
    captured_prompts: Mutex<Vec<String>>,
}

impl MockAiService {
    pub fn new() -> Self {
        Self {
            provider: AiProvider::OpenAi,
            model: AiModel::Gpt4oMini,
            responses: Mutex::new(VecDeque::new()),
            usage_per_call: TokenUsage::new(100, 50, 0.0000225),
            connection_ok: true,
            captured_prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_identity(mut self, provider: AiProvider, model: AiModel) -> Self {
        self.provider = provider;
        self.model = model;
        self
    }

    /// Queues one raw response body, consumed in FIFO order.
    pub fn with_response(self, body: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(body.into());
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage_per_call = usage;
        self
    }

    pub fn with_connection_ok(mut self, ok: bool) -> Self {
        self.connection_ok = ok;
        self
    }

    /// Prompts captured across all calls, in order.
    pub fn captured_prompts(&self) -> Vec<String> {
        self.captured_prompts.lock().unwrap().clone()
    }

    /// Pops the next scripted response; `None` simulates a transport
    /// failure (callers see the degraded path).
    fn next_response(&self, sent_prompt: String) -> Option<String> {
        self.captured_prompts.lock().unwrap().push(sent_prompt);
        self.responses.lock().unwrap().pop_front()
    }
}

impl Default for MockAiService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiService for MockAiService {
    async fn validate_component(
        &self,
        context: &ValidationContext,
        scope: ValidationScope,
    ) -> ValidationOutcome {
        let user_prompt = prompt::validation_prompt(context, scope);

        match self.next_response(user_prompt) {
            Some(content) => {
                let (issues, proposals) = recovery::parse_validation_response(&content, context);
                ValidationOutcome {
                    issues,
                    proposals,
                    usage: self.usage_per_call.clone(),
                }
            }
            None => ValidationOutcome::default(),
        }
    }

    async fn answer_question(
        &self,
        question: &str,
        project_id: &str,
        snapshot: &ProjectContextSnapshot,
    ) -> (String, Vec<String>, TokenUsage) {
        let user_prompt = prompt::question_prompt(question, project_id, snapshot);

        match self.next_response(user_prompt) {
            Some(content) => {
                let (answer, evidence) = recovery::parse_answer(&content);
                (answer, evidence, self.usage_per_call.clone())
            }
            None => (
                "Unable to reach the AI provider right now. Please try again.".to_string(),
                Vec::new(),
                TokenUsage::zero(),
            ),
        }
    }

    async fn generate_insights(&self, prompt: &str, _project_id: &str) -> (String, TokenUsage) {
        match self.next_response(prompt.to_string()) {
            Some(content) => (content, self.usage_per_call.clone()),
            None => (String::new(), TokenUsage::zero()),
        }
    }

    async fn test_connection(&self) -> bool {
        self.connection_ok
    }

    fn provider(&self) -> AiProvider {
        self.provider
    }

    fn model(&self) -> AiModel {
        self.model
    }
}
