//! Project planning: plan extraction, the kickoff meeting, task fan-out.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use tracing::{debug, error, info, warn};

use super::{resolve_role_fuzzy, role_email, Node};
use crate::collab::{CalendarProvider, EventDraft};
use crate::intent::plan::{extract_project_plan, extract_task_proposals, ProjectPlan};
use crate::net::{Priority, Task};

impl Node {
    /// Runs the full planning flow for `plan <id> = <objective>`: extract a
    /// plan, persist it, schedule the kickoff meeting, then turn each step
    /// into assigned tasks.
    pub(super) async fn plan_project(&self, project_id: &str, objective: &str) -> Vec<String> {
        info!(node_id = %self.node_id, %project_id, %objective, "planning project");
        self.projects
            .lock()
            .await
            .entry(project_id.to_string())
            .or_default()
            .objective = objective.to_string();

        let plan = match extract_project_plan(&self.gateway, project_id, objective).await {
            Ok(plan) => plan,
            Err(err) => {
                error!(node_id = %self.node_id, %project_id, %err, "plan extraction failed");
                return vec![format!(
                    "Could not generate a project plan for '{project_id}'. \
                     Please try again later."
                )];
            }
        };

        let mut participants: Vec<String> = Vec::new();
        for stakeholder in &plan.stakeholders {
            match resolve_role_fuzzy(stakeholder) {
                Some(role) => {
                    if !participants.iter().any(|p| p == role) {
                        participants.push(role.to_string());
                    }
                }
                None => warn!(%stakeholder, "stakeholder does not map to a known role"),
            }
        }

        {
            let mut projects = self.projects.lock().await;
            let project = projects.entry(project_id.to_string()).or_default();
            project.steps = plan.steps.clone();
            project.participants = participants.clone();
        }

        let mut replies = Vec::new();
        match self.save_plan_artifact(project_id, objective, &plan).await {
            Ok(path) => replies.push(format!(
                "Project plan for '{project_id}' saved to {}",
                path.display()
            )),
            Err(err) => warn!(node_id = %self.node_id, %project_id, %err, "could not save plan"),
        }

        // Kickoff meeting tomorrow, one hour. Held only when at least one
        // stakeholder resolved to a role.
        if participants.is_empty() {
            warn!(node_id = %self.node_id, %project_id, "no mapped stakeholders, skipping kickoff");
            replies.push("Cannot schedule kickoff meeting: no valid participants".to_string());
        } else {
            let start = Utc::now().naive_utc() + Duration::days(1);
            let title = format!("Meeting for project '{project_id}'");
            replies.extend(
                self.create_calendar_meeting(
                    project_id,
                    &title,
                    &participants,
                    start,
                    start + Duration::minutes(60),
                )
                .await,
            );
        }

        let mut task_count = 0usize;
        for step in &plan.steps {
            let proposals =
                extract_task_proposals(&self.gateway, project_id, step, &participants).await;
            for proposal in proposals {
                let Some(assignee) = resolve_role_fuzzy(&proposal.assigned_to) else {
                    warn!(assigned_to = %proposal.assigned_to, "proposed assignee is not a known role");
                    continue;
                };
                let priority = match proposal.priority.parse::<Priority>() {
                    Ok(priority) => priority,
                    Err(err) => {
                        warn!(%err, title = %proposal.title, "skipping task with invalid priority");
                        continue;
                    }
                };
                let due = Utc::now().naive_utc() + Duration::days(proposal.due_date_offset.max(0));
                let task = Task::new(
                    proposal.title,
                    proposal.description,
                    due,
                    assignee,
                    priority,
                    project_id,
                );
                self.schedule_task_reminder(&task).await;
                self.bus.add_task(task).await;
                task_count += 1;
            }
        }

        replies.push(format!(
            "Project '{project_id}' planned: {} steps, {} participants, {task_count} tasks assigned.",
            plan.steps.len(),
            participants.len()
        ));
        replies
    }

    async fn save_plan_artifact(
        &self,
        project_id: &str,
        objective: &str,
        plan: &ProjectPlan,
    ) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.plans_dir).await?;
        let path = self.plans_dir.join(format!("{project_id}_plan.txt"));
        let mut contents = format!(
            "Project: {project_id}\nObjective: {objective}\n\nStakeholders: {}\n\nSteps:\n",
            plan.stakeholders.join(", ")
        );
        for (i, step) in plan.steps.iter().enumerate() {
            contents.push_str(&format!("{}. {step}\n", i + 1));
        }
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }

    /// Best effort: a missing reminder never blocks the task itself.
    async fn schedule_task_reminder(&self, task: &Task) {
        let draft = EventDraft {
            summary: format!("TASK: {}", task.title),
            description: task.description.clone(),
            start: task.due_date,
            end: task.due_date + Duration::hours(1),
            attendees: vec![role_email(&task.assigned_to)],
        };
        if let Err(err) = self.calendar.create(draft).await {
            debug!(node_id = %self.node_id, title = %task.title, %err, "skipping task reminder");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::collab::{InMemoryCalendar, InMemoryMailbox};
    use crate::config::Config;
    use crate::net::{Intercom, Payload, Receiver};
    use crate::node::testutil::harness;
    use crate::node::Node;
    use crate::reasoning::scripted::ScriptedClient;
    use crate::reasoning::ReasoningGateway;

    const PLAN: &str = r#"{
        "stakeholders": ["CEO", "Engineering team", "External auditors"],
        "steps": [
            {"description": "Build the prototype"},
            {"description": "Prepare the launch"}
        ]
    }"#;
    const STEP_ONE_TASKS: &str = r#"{"tasks": [
        {"title": "Draft spec", "description": "Write the spec",
         "assigned_to": "engineering", "due_date_offset": 3, "priority": "high"}
    ]}"#;
    const STEP_TWO_TASKS: &str = r#"{"tasks": [
        {"title": "Press kit", "assigned_to": "marketing", "priority": "someday"}
    ]}"#;

    #[tokio::test]
    async fn plan_command_schedules_kickoff_and_assigns_tasks() {
        let h = harness("ceo", &[PLAN, STEP_ONE_TASKS, STEP_TWO_TASKS]).await;
        h.add_peer("engineering").await;

        let replies = h
            .node
            .receive(Payload::text("plan alpha = ship the beta"), "user")
            .await;

        assert!(replies.iter().any(|r| r.contains("saved to")));
        assert!(replies
            .iter()
            .any(|r| r.contains("Meeting 'Meeting for project 'alpha'' scheduled")));
        // The invalid-priority proposal is dropped.
        assert!(replies
            .iter()
            .any(|r| r.contains("2 steps, 2 participants, 1 tasks assigned")));

        let tasks = h.bus.tasks_for("engineering").await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Draft spec");
        assert_eq!(tasks[0].project_id, "alpha");
        assert!(h.bus.tasks_for("marketing").await.is_empty());

        // Kickoff plus one task reminder.
        let events = h.calendar.events().await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().any(|e| e.summary == "TASK: Draft spec"));

        // The assignee was notified over the bus.
        assert!(h
            .bus
            .journal()
            .await
            .iter()
            .any(|m| m.recipient == "engineering" && m.content.contains("New task assigned")));
    }

    #[tokio::test]
    async fn plan_artifact_lists_numbered_steps() {
        let dir = tempfile::tempdir().unwrap();
        let bus = Arc::new(Intercom::new());
        let gateway = Arc::new(ReasoningGateway::new(
            ScriptedClient::with_responses([PLAN, r#"{"tasks": []}"#, r#"{"tasks": []}"#]),
            &Config::new("k", "m"),
        ));
        let node = Arc::new(Node::new(
            "ceo",
            bus.clone(),
            gateway,
            Arc::new(InMemoryCalendar::new()),
            Arc::new(InMemoryMailbox::new()),
            dir.path(),
        ));
        bus.register("ceo", node.clone()).await;

        node.receive(Payload::text("plan beta = refresh the site"), "user")
            .await;

        let contents = std::fs::read_to_string(dir.path().join("beta_plan.txt")).unwrap();
        assert!(contents.contains("Objective: refresh the site"));
        assert!(contents.contains("1. Build the prototype"));
        assert!(contents.contains("2. Prepare the launch"));
    }

    #[tokio::test]
    async fn unmapped_stakeholders_skip_the_kickoff_meeting() {
        const OUTSIDERS_PLAN: &str = r#"{
            "stakeholders": ["External auditors", "Regulators"],
            "steps": [{"description": "Collect the evidence"}]
        }"#;
        let h = harness("ceo", &[OUTSIDERS_PLAN, r#"{"tasks": []}"#]).await;

        let replies = h
            .node
            .receive(Payload::text("plan audit = pass the annual audit"), "user")
            .await;

        assert!(replies
            .iter()
            .any(|r| r.contains("Cannot schedule kickoff meeting: no valid participants")));
        assert!(h.calendar.events().await.is_empty());
        // The plan itself is still saved and summarized.
        assert!(replies.iter().any(|r| r.contains("saved to")));
        assert!(replies
            .iter()
            .any(|r| r.contains("1 steps, 0 participants, 0 tasks assigned")));
    }

    #[tokio::test]
    async fn failed_plan_extraction_is_reported() {
        let h = harness("ceo", &["this is not a plan"]).await;

        let replies = h
            .node
            .receive(Payload::text("plan gamma = something vague"), "user")
            .await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with("Could not generate a project plan for 'gamma'"));
        assert!(h.calendar.events().await.is_empty());
    }
}
