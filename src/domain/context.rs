//! Project context snapshots - derived, point-in-time summaries of a
//! project's tasks, dependencies, and statistics.

use serde::{Deserialize, Serialize};

/// Project details as read from the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
}

/// A task row as read from the store (soft-deleted rows excluded).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
}

/// A dependency edge between two tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDependency {
    pub id: String,
    pub task_id: String,
    pub depends_on_task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_type: Option<String>,
}

/// Statistics derived in one pass over a project's tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    /// Percentage complete, rounded to one decimal. Defined as 0 when
    /// there are no tasks.
    pub completion_percentage: f64,
    pub status_breakdown: std::collections::BTreeMap<String, u32>,
    pub priority_breakdown: std::collections::BTreeMap<String, u32>,
    /// Sum over tasks carrying an estimate; tasks without one are skipped.
    pub total_estimated_hours: f64,
    pub total_dependencies: u32,
}

/// Task status that counts as complete.
const DONE_STATUS: &str = "done";

impl ProjectStats {
    /// Derives statistics from tasks and dependency count in one pass.
    pub fn from_tasks(tasks: &[TaskRecord], total_dependencies: u32) -> Self {
        let mut status_breakdown = std::collections::BTreeMap::new();
        let mut priority_breakdown = std::collections::BTreeMap::new();
        let mut total_estimated_hours = 0.0;
        let mut completed_tasks = 0u32;

        for task in tasks {
            *status_breakdown.entry(task.status.clone()).or_insert(0) += 1;
            *priority_breakdown.entry(task.priority.clone()).or_insert(0) += 1;

            if let Some(hours) = task.estimated_hours {
                total_estimated_hours += hours;
            }

            if task.status == DONE_STATUS {
                completed_tasks += 1;
            }
        }

        let total_tasks = tasks.len() as u32;
        let completion_percentage = if total_tasks == 0 {
            0.0
        } else {
            let raw = f64::from(completed_tasks) / f64::from(total_tasks) * 100.0;
            (raw * 10.0).round() / 10.0
        };

        Self {
            total_tasks,
            completed_tasks,
            completion_percentage,
            status_breakdown,
            priority_breakdown,
            total_estimated_hours,
            total_dependencies,
        }
    }
}

/// Derived, point-in-time summary of a project. Recomputed on every
/// fetch; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectContextSnapshot {
    /// None when the store has no such project (or is unavailable).
    pub project: Option<ProjectDetails>,
    pub tasks: Vec<TaskRecord>,
    pub dependencies: Vec<TaskDependency>,
    pub stats: ProjectStats,
}

impl ProjectContextSnapshot {
    /// Assembles a snapshot, deriving statistics from the fetched rows.
    pub fn new(
        project: Option<ProjectDetails>,
        tasks: Vec<TaskRecord>,
        dependencies: Vec<TaskDependency>,
    ) -> Self {
        let stats = ProjectStats::from_tasks(&tasks, dependencies.len() as u32);
        Self {
            project,
            tasks,
            dependencies,
            stats,
        }
    }

    /// True when the store produced a real project for this snapshot.
    pub fn has_project(&self) -> bool {
        self.project.is_some()
    }

    /// Fixed placeholder snapshot substituted when the store reports no
    /// project: 5 tasks, 1 in progress, none done, all medium priority,
    /// no dependencies. Keeps development and tests functioning without
    /// a configured store.
    pub fn placeholder() -> Self {
        let task = |id: &str, title: &str, description: Option<&str>, status: &str| TaskRecord {
            id: id.to_string(),
            title: title.to_string(),
            description: description.map(str::to_string),
            status: status.to_string(),
            priority: "medium".to_string(),
            estimated_hours: None,
        };

        let tasks = vec![
            task(
                "1",
                "Go to the shops and chat up an assistant",
                Some("See if they are up for it!"),
                "todo",
            ),
            task("2", "red cat", None, "in_progress"),
            task("3", "rrr", None, "todo"),
            task("4", "gggggg", None, "todo"),
            task(
                "5",
                "Go to B&Q and purchase the wood for the shed",
                Some("Go to B&Q and purchase the wood for the shed"),
                "todo",
            ),
        ];

        let project = ProjectDetails {
            id: "placeholder".to_string(),
            name: "Build a garden shed".to_string(),
            description: Some("A project to build a garden shed".to_string()),
            status: "active".to_string(),
        };

        Self::new(Some(project), tasks, Vec::new())
    }
}
