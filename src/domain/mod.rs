//! Domain - Core types and logic for AI-assisted project validation.
//!
//! Everything here is provider-agnostic: typed artifacts, validation
//! contexts, derived project statistics, prompt construction, and the
//! recovery pipeline that turns loose model output into typed records.

pub mod artifact;
pub mod context;
pub mod prompt;
pub mod recovery;
pub mod usage;
pub mod validation;

pub use artifact::{
    ActivityType, AiArtifact, ArtifactStatus, ConfidenceLevel, ProposalType,
};
pub use context::{
    ProjectContextSnapshot, ProjectDetails, ProjectStats, TaskDependency, TaskRecord,
};
pub use usage::TokenUsage;
pub use validation::{
    ComponentType, Severity, ValidationContext, ValidationIssue, ValidationScope,
};
