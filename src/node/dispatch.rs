//! Message dispatch: quick commands, dialog continuation, intent routing
//! and the conversational fallback.

use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

use super::Node;
use crate::dialog::{EmailStep, MeetingOutcome, MeetingStep};
use crate::intent::calendar::{detect_calendar_intent, CalendarAction};
use crate::intent::email::{analyze_email_command, detect_send_email_intent, EmailAction};
use crate::net::USER_SENDER;
use crate::reasoning::ChatMessage;

fn plan_command() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*plan\s+([\w-]+)\s*=\s*(.+)$").unwrap())
}

impl Node {
    pub(super) async fn handle_text(&self, message: &str, sender: &str) -> Vec<String> {
        info!(node_id = %self.node_id, %sender, %message, "text received");

        if sender == USER_SENDER {
            if let Some(replies) = self.try_quick_command(message).await {
                return replies;
            }
        }

        // Active dialogs consume the reply regardless of sender.
        if self.meeting_dialog.lock().await.is_some() {
            return self.continue_meeting_dialog(message).await;
        }
        if self.email_dialog.lock().await.is_some() {
            return self.continue_email_dialog(message).await;
        }

        if sender == USER_SENDER {
            let calendar_intent = detect_calendar_intent(&self.gateway, message).await;
            if let Some(action) = calendar_intent.action {
                return match action {
                    CalendarAction::Schedule => {
                        if calendar_intent.missing.is_empty() {
                            self.handle_meeting_creation(message).await
                        } else {
                            self.start_meeting_dialog(message, calendar_intent.missing)
                                .await
                        }
                    }
                    CalendarAction::Cancel => self.handle_meeting_cancellation(message).await,
                    CalendarAction::List => self.handle_list_meetings().await,
                    CalendarAction::Reschedule => self.handle_meeting_rescheduling(message).await,
                };
            }

            let email_intent = detect_send_email_intent(&self.gateway, message).await;
            if email_intent.is_send_email {
                return self.start_email_composition(email_intent).await;
            }

            let email_action = analyze_email_command(&self.gateway, message).await;
            if !matches!(email_action, EmailAction::None) {
                return self.handle_email_query(email_action).await;
            }
        }

        self.chat_fallback(message, sender).await
    }

    /// `tasks` and `plan <id> = <objective>` bypass intent detection.
    async fn try_quick_command(&self, message: &str) -> Option<Vec<String>> {
        if message.trim().eq_ignore_ascii_case("tasks") {
            return Some(vec![self.list_tasks().await]);
        }
        if let Some(caps) = plan_command().captures(message.trim()) {
            let project_id = caps[1].trim().to_string();
            let objective = caps[2].trim().to_string();
            return Some(self.plan_project(&project_id, &objective).await);
        }
        None
    }

    pub(super) async fn list_tasks(&self) -> String {
        let tasks = self.bus.tasks_for(&self.node_id).await;
        if tasks.is_empty() {
            return format!("No tasks assigned to {}.", self.node_id);
        }
        let mut out = format!("Tasks for {}:\n", self.node_id);
        for (i, task) in tasks.iter().enumerate() {
            out.push_str(&format!(
                "{}. {} (Due: {}, Priority: {})\n   Description: {}\n",
                i + 1,
                task.title,
                task.due_date.format("%Y-%m-%d"),
                task.priority,
                task.description
            ));
        }
        out
    }

    async fn continue_meeting_dialog(&self, message: &str) -> Vec<String> {
        let Some(mut dialog) = self.meeting_dialog.lock().await.take() else {
            return vec![];
        };
        match dialog.record_reply(message) {
            MeetingStep::Ask(question) => {
                *self.meeting_dialog.lock().await = Some(dialog);
                vec![question]
            }
            MeetingStep::Complete(MeetingOutcome::Create { instruction }) => {
                debug!(node_id = %self.node_id, "meeting details complete, re-running scheduling");
                self.handle_meeting_creation(&instruction).await
            }
            MeetingStep::Complete(MeetingOutcome::Reschedule {
                event_id,
                date,
                time,
            }) => {
                self.complete_meeting_reschedule(&event_id, &date, &time)
                    .await
            }
        }
    }

    async fn continue_email_dialog(&self, message: &str) -> Vec<String> {
        let Some(mut dialog) = self.email_dialog.lock().await.take() else {
            return vec![];
        };
        let step = dialog.record_reply(message);
        self.apply_email_step(dialog, step).await
    }

    pub(super) async fn apply_email_step(
        &self,
        dialog: crate::dialog::EmailDialog,
        step: EmailStep,
    ) -> Vec<String> {
        match step {
            EmailStep::Ask(question) => {
                *self.email_dialog.lock().await = Some(dialog);
                vec![question]
            }
            EmailStep::Preview(preview) => {
                *self.email_dialog.lock().await = Some(dialog);
                vec![preview]
            }
            EmailStep::Send(draft) => vec![self.send_composed_email(draft).await],
            EmailStep::Cancelled(notice) => vec![notice],
        }
    }

    async fn chat_fallback(&self, message: &str, sender: &str) -> Vec<String> {
        self.remember(sender, message).await;
        if sender != USER_SENDER {
            // Peer chatter is recorded but never answered, so two nodes
            // cannot talk each other into an endless loop.
            return vec![];
        }

        let history = self.history.lock().await.clone();
        let response = self.gateway.complete(history).await;
        self.history
            .lock()
            .await
            .push(ChatMessage::assistant(response.clone()));
        vec![response]
    }
}
