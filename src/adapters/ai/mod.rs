//! AI adapters - LLM backend implementations of the [`AiService`] port.
//!
//! Each backend follows the same shape: build the prompt from domain
//! templates, make one HTTP call, run the raw text through response
//! recovery, and absorb transport failures into degraded zero-usage
//! results. The [`ServiceCache`] hands out one shared instance per
//! (provider, model) pair.
//!
//! [`AiService`]: crate::ports::AiService

mod anthropic;
mod cost;
mod factory;
mod mock;
mod openai;

pub use anthropic::AnthropicService;
pub use cost::{estimate_cost, rate_per_1k};
pub use factory::ServiceCache;
pub use mock::MockAiService;
pub use openai::OpenAiService;

/// Temperature for conversational question answering.
pub(crate) const QA_TEMPERATURE: f32 = 0.7;

/// Temperature for insight generation.
pub(crate) const INSIGHTS_TEMPERATURE: f32 = 0.3;
