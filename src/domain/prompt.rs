//! Prompt Template Engine - assembles the final prompt strings sent to
//! providers.
//!
//! The assessment prompt is built from four fragments: system preamble,
//! serialized project snapshot, analysis categories, and output-format
//! instructions. Three of the four (system, categories, output format)
//! are independently overridable per project; overrides are resolved
//! before serialization so custom and default fragments never mix
//! within one prompt.

use serde_json::Value;

use crate::domain::context::ProjectContextSnapshot;
use crate::domain::validation::{ValidationContext, ValidationScope};

/// Cap on task lines serialized into a prompt.
const TASK_LINE_CAP: usize = 20;
/// Cap on dependency lines serialized into a prompt.
const DEPENDENCY_LINE_CAP: usize = 10;

/// System instruction for component validation.
///
/// Describes the title/description quality heuristics and the strict
/// rule that findings needing caller-supplied detail must be emitted as
/// issues, never as placeholder-bearing proposals.
pub const VALIDATION_SYSTEM_PROMPT: &str = r#"You're helping someone write better task titles and descriptions. Give them friendly, natural feedback.

Check these things:
1. **Task Title Quality**: Is it clear, professional, and actionable?
2. **Task Description Quality**: Is it clear what needs to be done?
3. **Title-Description Consistency**: Do the title and description actually match? If the title says "Run a race" but the description talks about "Buy a cat", that doesn't make sense!

CRITICAL: When both title and description exist but don't match, flag this as a "title-description mismatch" issue, NOT a missing title issue.

Be helpful and encouraging, not critical or rigid.

Return your feedback in this JSON format:
{
  "issues": [{"field": "title", "issue_type": "suggestion", "message": "your friendly feedback here", "severity": "info", "suggestion": "specific alternative"}],
  "proposals": []
}

CRITICAL RULE: ONLY CREATE PROPOSALS FOR COMPLETE, READY-TO-USE ALTERNATIVES

**Issues** = Guidance and advice (use this 99% of the time)
**Proposals** = Complete, usable alternatives (use this 1% of the time)

NEVER create proposals when:
- You would use placeholders like "[Add criterion]", "[specify details]", etc.
- The user needs to fill in specific information you don't know
- You're suggesting format improvements but can't write the complete replacement

ONLY create proposals when:
- You can write a COMPLETE, ready-to-use replacement
- You know all the specific details needed
- The alternative is immediately actionable without any user input

DEFAULT TO ISSUES: When in doubt, provide guidance in "issues" and leave "proposals" empty."#;

/// System instruction for project Q&A.
pub const QUESTION_SYSTEM_PROMPT: &str = "You are a helpful project management assistant. \
    Provide clear, actionable answers to user questions about their projects.";

/// Instruction prepended to insight-generation prompts.
pub const INSIGHTS_PREAMBLE: &str = "You are a project management expert. Analyze the project \
    data and generate insights as requested. Always return valid JSON in the specified format.";

/// Builds the user prompt for a component validation call.
///
/// Stricter scopes request narrower checks; `Full` asks for the most
/// comprehensive review.
pub fn validation_prompt(context: &ValidationContext, scope: ValidationScope) -> String {
    let mut prompt = format!(
        "You are an AI assistant helping with project management validation. \
         Analyze the following {} data and provide validation feedback.\n\n\
         Component Data:\n{}\n\n\
         Project ID: {}\n\
         Validation Scope: {}\n",
        context.component_type.as_str(),
        format_component_data(context),
        context.project_id,
        scope.as_str(),
    );

    let scope_section = match scope {
        ValidationScope::RulesOnly => {
            "\nPlease check for basic rule violations only:\n\
             - Required fields are present\n\
             - Data types are correct\n\
             - Basic format validation\n"
        }
        ValidationScope::Selective => {
            "\nPlease provide selective validation focusing on:\n\
             - Data quality issues\n\
             - Missing important information\n\
             - Potential improvements\n\
             - Consistency with project standards\n"
        }
        ValidationScope::Full => {
            "\nPlease provide comprehensive validation including:\n\
             - All rule violations\n\
             - Data quality assessment\n\
             - Missing information analysis\n\
             - Improvement suggestions\n\
             - Consistency checks\n\
             - Best practice recommendations\n"
        }
    };

    prompt.push_str(scope_section);

    if let Some(rules) = &context.project_rules {
        if !rules.is_empty() {
            prompt.push_str("\nProject Rules:\n");
            for rule in rules {
                prompt.push_str(&format!("- [{}] {}: {}\n", rule.rule_type, rule.field, rule.message));
            }
        }
    }

    if let Some(related) = &context.related_components {
        if !related.is_empty() {
            prompt.push_str(&format!(
                "\nRelated Components ({}):\n{}\n",
                related.len(),
                related
                    .iter()
                    .map(|c| format!("- {c}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ));
        }
    }

    if let Some(prefs) = &context.user_preferences {
        if !prefs.is_empty() {
            prompt.push_str("\nUser Preferences:\n");
            for (key, value) in prefs {
                prompt.push_str(&format!("- {key}: {value}\n"));
            }
        }
    }

    prompt
}

/// Formats component fields one per line, omitting nulls.
fn format_component_data(context: &ValidationContext) -> String {
    context
        .component_data
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| match value {
            Value::String(s) => format!("{}: {}", key, s),
            other => format!("{}: {}", key, other),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-project overrides for the three customizable assessment prompt
/// fragments. Absent fragments fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptOverrides {
    pub system_prompt: Option<String>,
    pub categories: Option<String>,
    pub output_format: Option<String>,
}

impl PromptOverrides {
    /// True when no fragment is overridden.
    pub fn is_empty(&self) -> bool {
        self.system_prompt.is_none() && self.categories.is_none() && self.output_format.is_none()
    }
}

/// Builds the full project-assessment prompt from a snapshot and
/// resolved overrides.
pub fn assessment_prompt(snapshot: &ProjectContextSnapshot, overrides: &PromptOverrides) -> String {
    let system = overrides
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_ASSESSMENT_SYSTEM);
    let categories = overrides
        .categories
        .as_deref()
        .unwrap_or(DEFAULT_ASSESSMENT_CATEGORIES);
    let output_format = overrides
        .output_format
        .as_deref()
        .unwrap_or(DEFAULT_ASSESSMENT_OUTPUT_FORMAT);

    let (name, status, description) = match &snapshot.project {
        Some(p) => (
            p.name.as_str(),
            p.status.as_str(),
            p.description.as_deref().unwrap_or("No description"),
        ),
        None => ("Unknown project", "unknown", "No description"),
    };

    let stats = &snapshot.stats;

    format!(
        "{system}\n\n\
         Project: {name}\n\
         Status: {status}\n\
         Description: {description}\n\n\
         Task Summary:\n\
         - Total tasks: {total}\n\
         - Completed: {completed}\n\
         - Completion: {completion:.1}%\n\
         - Status breakdown: {status_breakdown:?}\n\
         - Priority breakdown: {priority_breakdown:?}\n\
         - Estimated hours: {hours}\n\
         - Dependencies: {deps}\n\n\
         Tasks:\n{tasks}\n\n\
         Dependencies:\n{dependencies}\n\n\
         Analysis Categories:\n{categories}\n\n\
         {output_format}\n\n\
         Focus on the most important 5-15 insights. Prioritize observations \
         that could have significant impact on project success.",
        total = stats.total_tasks,
        completed = stats.completed_tasks,
        completion = stats.completion_percentage,
        status_breakdown = stats.status_breakdown,
        priority_breakdown = stats.priority_breakdown,
        hours = stats.total_estimated_hours,
        deps = stats.total_dependencies,
        tasks = format_tasks(snapshot),
        dependencies = format_dependencies(snapshot),
    )
}

/// Serializes up to [`TASK_LINE_CAP`] task lines with an "and N more"
/// suffix beyond the cap.
fn format_tasks(snapshot: &ProjectContextSnapshot) -> String {
    if snapshot.tasks.is_empty() {
        return "No tasks found".to_string();
    }

    let mut lines: Vec<String> = snapshot
        .tasks
        .iter()
        .take(TASK_LINE_CAP)
        .map(|task| {
            let description = task.description.as_deref().unwrap_or("No description");
            let truncated: String = description.chars().take(100).collect();
            format!("- {} ({}) - {}", task.title, task.status, truncated)
        })
        .collect();

    if snapshot.tasks.len() > TASK_LINE_CAP {
        lines.push(format!(
            "... and {} more tasks",
            snapshot.tasks.len() - TASK_LINE_CAP
        ));
    }

    lines.join("\n")
}

/// Serializes up to [`DEPENDENCY_LINE_CAP`] dependency lines with the
/// same capping rule as tasks.
fn format_dependencies(snapshot: &ProjectContextSnapshot) -> String {
    if snapshot.dependencies.is_empty() {
        return "No dependencies found".to_string();
    }

    let mut lines: Vec<String> = snapshot
        .dependencies
        .iter()
        .take(DEPENDENCY_LINE_CAP)
        .map(|dep| {
            format!(
                "- Task {} depends on {}",
                dep.task_id, dep.depends_on_task_id
            )
        })
        .collect();

    if snapshot.dependencies.len() > DEPENDENCY_LINE_CAP {
        lines.push(format!(
            "... and {} more dependencies",
            snapshot.dependencies.len() - DEPENDENCY_LINE_CAP
        ));
    }

    lines.join("\n")
}

/// Builds the short context block for a question prompt, serializing
/// available fields defensively - absent fields are omitted entirely.
pub fn question_context_block(snapshot: &ProjectContextSnapshot) -> String {
    let mut block = String::new();

    if let Some(project) = &snapshot.project {
        block.push_str(&format!("\nProject: {}", project.name));
        if let Some(description) = &project.description {
            block.push_str(&format!("\nDescription: {}", description));
        }
    }
    block.push_str(&format!("\nTasks: {}", snapshot.stats.total_tasks));

    block
}

/// Builds the user prompt for a question call.
pub fn question_prompt(question: &str, project_id: &str, snapshot: &ProjectContextSnapshot) -> String {
    format!(
        "User Question: {question}\n\n\
         Project Context:{context}\n\
         Project ID: {project_id}\n\n\
         Please provide a helpful, concise answer to the user's question. \
         If you reference specific information, list your sources as evidence.\n\n\
         Return your response in this JSON format:\n\
         {{\n  \"answer\": \"your detailed answer here\",\n  \"evidence\": [\"source 1\", \"source 2\"]\n}}",
        context = question_context_block(snapshot),
    )
}

/// Default assessment system preamble.
pub const DEFAULT_ASSESSMENT_SYSTEM: &str = "You are a project management expert analyzing a software project.\n\
Your role is to identify patterns, potential issues, and observations that could help the project manager make better decisions.\n\n\
Generate insights (not actionable proposals) - observations that are worth noting but don't require immediate changes.\n\
Focus on patterns, risks, and opportunities that might not be immediately obvious.";

/// Default analysis categories.
pub const DEFAULT_ASSESSMENT_CATEGORIES: &str = "Analyze these categories:\n\n\
**Task Quality Issues:**\n\
- Tasks with vague or incomplete descriptions\n\
- Missing acceptance criteria\n\
- Priority inconsistencies\n\
- Unrealistic time estimates\n\
- Tasks stuck in progress\n\n\
**Dependency Concerns:**\n\
- Circular dependencies\n\
- Long dependency chains\n\
- Bottleneck tasks\n\
- Missing dependencies\n\
- Blocked tasks\n\n\
**Velocity/Progress Patterns:**\n\
- Completion rate trends\n\
- Tasks taking longer than estimated\n\
- Status distribution anomalies\n\
- Milestone risks\n\
- Progress bottlenecks\n\n\
**Risk Indicators:**\n\
- High-priority tasks not started\n\
- Critical path issues\n\
- External dependencies\n\
- Resource constraints\n\
- Technical debt patterns\n\n\
**Resource Allocation:**\n\
- Uneven workload distribution\n\
- Tasks without owners\n\
- Skills mismatch\n\
- Overallocation";

/// Default output-format instructions.
pub const DEFAULT_ASSESSMENT_OUTPUT_FORMAT: &str = r#"Return a JSON array of insights. Each insight should have:

{
  "insight_type": "descriptive category (e.g., 'Task Quality Issue', 'Dependency Bottleneck')",
  "rationale": "Clear 1-2 sentence observation about what you noticed",
  "evidence": ["Specific example 1", "Specific example 2", "..."],
  "confidence": "high|medium|low based on data clarity",
  "estimated_impact": "Brief description of potential effect on project success"
}"#;
