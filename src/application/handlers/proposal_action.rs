//! ProposalActionHandler - applies a reviewer's decision to a
//! persisted proposal.
//!
//! Only four fields are ever touched: status, feedback, modifications,
//! and the review timestamp. Everything else on the artifact is
//! immutable after creation.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;

use crate::domain::artifact::{AiArtifact, ArtifactStatus};
use crate::ports::{ArtifactUpdate, ProjectStore, StoreError};

/// Reviewer decision on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalAction {
    Accept,
    Reject,
    Modify,
    Defer,
}

impl ProposalAction {
    fn status(self) -> ArtifactStatus {
        match self {
            ProposalAction::Accept => ArtifactStatus::Accepted,
            ProposalAction::Reject => ArtifactStatus::Rejected,
            ProposalAction::Modify => ArtifactStatus::Modified,
            ProposalAction::Defer => ArtifactStatus::Deferred,
        }
    }
}

/// Command recording one review decision.
#[derive(Debug, Clone)]
pub struct ProposalActionCommand {
    pub artifact_id: String,
    pub action: ProposalAction,
    pub feedback: Option<String>,
    /// Reviewer edits; meaningful for [`ProposalAction::Modify`].
    pub modifications: Option<Map<String, Value>>,
}

/// Handler for proposal review actions.
pub struct ProposalActionHandler {
    store: Arc<dyn ProjectStore>,
}

impl ProposalActionHandler {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    /// Applies the decision and returns the updated artifact.
    ///
    /// This operation is store-centric, so store failures propagate
    /// rather than degrade - there is no meaningful reduced mode for a
    /// review that was not recorded.
    pub async fn handle(&self, cmd: ProposalActionCommand) -> Result<AiArtifact, StoreError> {
        let update = ArtifactUpdate {
            status: cmd.action.status(),
            reviewed_at: Utc::now(),
            feedback: cmd.feedback,
            modifications: cmd.modifications,
        };

        let artifact = self.store.update_artifact(&cmd.artifact_id, &update).await?;

        info!(
            artifact_id = %cmd.artifact_id,
            status = %artifact.status.as_str(),
            "proposal action recorded"
        );

        Ok(artifact)
    }
}
