//! Operation handlers - one per AI orchestration operation.

mod answer_question;
mod assess_project;
mod proposal_action;
mod test_connections;
mod validate_component;

pub use answer_question::{AnswerQuestionCommand, AnswerQuestionHandler, AnswerQuestionResult};
pub use assess_project::{AssessProjectCommand, AssessProjectHandler, AssessProjectResult};
pub use proposal_action::{ProposalAction, ProposalActionCommand, ProposalActionHandler};
pub use test_connections::{ConnectionReport, TestConnectionsHandler};
pub use validate_component::{
    ValidateComponentCommand, ValidateComponentHandler, ValidateComponentResult,
};
