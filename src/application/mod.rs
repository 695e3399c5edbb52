//! Application layer - orchestration over the AI and store ports.
//!
//! Each operation lives in its own handler; [`AiOrchestrator`] wires
//! them to one store and one service cache.

pub mod common;
pub mod context_aggregator;
pub mod handlers;
mod orchestrator;

pub use common::{BackendResolver, CachedBackendResolver, ResolvedBackend};
pub use context_aggregator::ContextAggregator;
pub use handlers::{
    AnswerQuestionCommand, AnswerQuestionHandler, AnswerQuestionResult, AssessProjectCommand,
    AssessProjectHandler, AssessProjectResult, ConnectionReport, ProposalAction,
    ProposalActionCommand, ProposalActionHandler, TestConnectionsHandler,
    ValidateComponentCommand, ValidateComponentHandler, ValidateComponentResult,
};
pub use orchestrator::AiOrchestrator;
