//! Ports - interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the orchestration core and the outside world. Adapters implement them.
//!
//! - [`AiService`] - the four-operation contract every LLM backend fulfills
//! - [`ProjectStore`] - the narrow CRUD interface over the external store

mod ai_service;
mod store;

pub use ai_service::{
    AiModel, AiProvider, AiService, ProviderConfig, TransportError, ValidationOutcome,
};
pub use store::{
    AiConfiguration, ArtifactFilter, ArtifactUpdate, ProjectStore, StoreError, UsageLogEntry,
    UsageStats,
};
