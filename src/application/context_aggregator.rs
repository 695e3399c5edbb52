//! Context aggregation - assembles a [`ProjectContextSnapshot`] from
//! three concurrent store fetches.
//!
//! Degrade, never fail: a failed fetch contributes absent data, and a
//! snapshot with no project at all is replaced by the fixed placeholder
//! so downstream prompt building always has something to describe.

use std::sync::Arc;

use tracing::warn;

use crate::domain::context::ProjectContextSnapshot;
use crate::ports::ProjectStore;

/// Builds project context snapshots from the store.
pub struct ContextAggregator {
    store: Arc<dyn ProjectStore>,
}

impl ContextAggregator {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    /// Fetches project details, tasks, and dependencies concurrently
    /// and derives statistics.
    ///
    /// Any failed fetch degrades to absent data. When the project
    /// itself is unknown, the placeholder snapshot is substituted.
    pub async fn snapshot(&self, project_id: &str) -> ProjectContextSnapshot {
        let (project, tasks, dependencies) = tokio::join!(
            self.store.get_project_details(project_id),
            self.store.get_tasks(project_id),
            self.store.get_task_dependencies(project_id),
        );

        let project = match project {
            Ok(project) => project,
            Err(err) => {
                warn!(%err, project_id, "project details fetch failed");
                None
            }
        };
        let tasks = match tasks {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(%err, project_id, "task fetch failed");
                Vec::new()
            }
        };
        let dependencies = match dependencies {
            Ok(dependencies) => dependencies,
            Err(err) => {
                warn!(%err, project_id, "dependency fetch failed");
                Vec::new()
            }
        };

        if project.is_none() {
            warn!(project_id, "no project found, substituting placeholder context");
            return ProjectContextSnapshot::placeholder();
        }

        ProjectContextSnapshot::new(project, tasks, dependencies)
    }
}
