//! Project plan and task-proposal extraction.

use serde::Deserialize;
use tracing::warn;

use super::{non_empty, strip_code_fences, IntentError};
use crate::reasoning::ReasoningGateway;

/// A project plan as produced by the reasoning service.
#[derive(Debug, Clone)]
pub struct ProjectPlan {
    pub stakeholders: Vec<String>,
    pub steps: Vec<String>,
}

#[derive(Deserialize)]
struct RawPlan {
    #[serde(default)]
    stakeholders: Vec<String>,
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Deserialize)]
struct RawStep {
    #[serde(default)]
    description: Option<String>,
}

/// Asks for a project plan and decodes it.
///
/// Planning cannot proceed without a plan, so unlike the lighter
/// extractors this surfaces failure to the caller.
pub async fn extract_project_plan(
    gateway: &ReasoningGateway,
    project_id: &str,
    objective: &str,
) -> Result<ProjectPlan, IntentError> {
    let prompt = format!(
        "You are creating a detailed project plan for project '{project_id}'.\n\
         Objective: {objective}\n\n\
         The plan should include:\n\
         1. All stakeholders involved in the project. Use only these roles: \
         CEO, Marketing, Engineering, Design.\n\
         2. Detailed steps needed to execute the plan, including time and cost estimates. \
         Each step should be written in paragraphs and full sentences.\n\n\
         Return valid JSON only, with this structure:\n\
         {{\n\
           \"stakeholders\": [\"list of stakeholders\"],\n\
           \"steps\": [\n\
             {{\n\
               \"description\": \"Detailed step description with time and cost estimates\"\n\
             }}\n\
           ]\n\
         }}\n\
         Keep it concise. End after providing the JSON. No extra words."
    );

    let response = gateway.extract(&prompt).await;
    if ReasoningGateway::is_failure(&response) {
        return Err(IntentError::Unavailable);
    }

    let raw: RawPlan = serde_json::from_str(strip_code_fences(&response))
        .map_err(|e| IntentError::Malformed(e.to_string()))?;

    Ok(ProjectPlan {
        stakeholders: raw
            .stakeholders
            .into_iter()
            .filter_map(|s| non_empty(Some(s)))
            .collect(),
        steps: raw
            .steps
            .into_iter()
            .filter_map(|s| non_empty(s.description))
            .collect(),
    })
}

/// A task suggestion for one plan step, before validation against the
/// role vocabulary and priority set.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskProposal {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assigned_to: String,
    /// Days from now until the task is due.
    #[serde(default = "default_due_offset")]
    pub due_date_offset: i64,
    #[serde(default = "default_priority_label")]
    pub priority: String,
}

fn default_due_offset() -> i64 {
    7
}

fn default_priority_label() -> String {
    "medium".to_string()
}

#[derive(Deserialize)]
struct RawProposals {
    #[serde(default)]
    tasks: Vec<TaskProposal>,
}

/// Asks for one to three task proposals for a plan step. Malformed output
/// yields no proposals; the step is simply skipped.
pub async fn extract_task_proposals(
    gateway: &ReasoningGateway,
    project_id: &str,
    step_description: &str,
    participants: &[String],
) -> Vec<TaskProposal> {
    let prompt = format!(
        "For project '{project_id}', analyze this step and create appropriate tasks:\n\n\
         Step: {step_description}\n\n\
         Available roles: {}\n\n\
         Create 1-3 specific tasks from this step. Each task should be assigned to the \
         most appropriate role.\n\n\
         Return a JSON object of the form:\n\
         {{\n\
           \"tasks\": [\n\
             {{\n\
               \"title\": \"short task title\",\n\
               \"description\": \"what needs to be done\",\n\
               \"assigned_to\": \"one of the available roles\",\n\
               \"due_date_offset\": 7,\n\
               \"priority\": \"high\" | \"medium\" | \"low\"\n\
             }}\n\
           ]\n\
         }}",
        participants.join(", ")
    );

    let response = gateway.extract(&prompt).await;
    if ReasoningGateway::is_failure(&response) {
        return Vec::new();
    }

    match serde_json::from_str::<RawProposals>(strip_code_fences(&response)) {
        Ok(raw) => raw.tasks,
        Err(err) => {
            warn!(%err, %project_id, "malformed task proposals, skipping step");
            Vec::new()
        }
    }
}
