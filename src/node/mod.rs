//! Role-playing nodes.
//!
//! A node owns its conversation history, dialog state, meeting records and
//! project book. Everything external comes in through handles: the bus, the
//! reasoning gateway and the collaborator providers.

mod dispatch;
mod email;
mod meetings;
mod planning;
#[cfg(test)]
pub(crate) mod testutil;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::collab::{CalendarProvider, MailProvider};
use crate::dialog::{EmailDialog, MeetingDialog};
use crate::net::{Intercom, MeetingRecord, Payload, Receiver};
use crate::reasoning::{ChatMessage, ReasoningGateway};

/// Role names a node can address. Participant and stakeholder resolution
/// is restricted to this set.
pub const ROLES: [&str; 4] = ["ceo", "marketing", "engineering", "design"];

/// Exact lowercase match against the role vocabulary.
pub(crate) fn resolve_role_exact(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    ROLES.iter().find(|role| **role == name).copied()
}

/// Loose match for stakeholder labels like "Engineering team": either side
/// containing the other counts.
pub(crate) fn resolve_role_fuzzy(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }
    ROLES
        .iter()
        .find(|role| name.contains(*role) || role.contains(name.as_str()))
        .copied()
}

/// The email address a role receives mail under.
pub(crate) fn role_email(role: &str) -> String {
    format!("{role}@example.com")
}

/// Local part of an attendee address, lowercased.
pub(crate) fn email_local_part(address: &str) -> String {
    address
        .split('@')
        .next()
        .unwrap_or(address)
        .to_lowercase()
}

/// A project the node is coordinating.
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub objective: String,
    pub steps: Vec<String>,
    pub participants: Vec<String>,
}

pub struct Node {
    node_id: String,
    bus: Arc<Intercom>,
    gateway: Arc<ReasoningGateway>,
    calendar: Arc<dyn CalendarProvider>,
    mail: Arc<dyn MailProvider>,
    plans_dir: PathBuf,
    history: Mutex<Vec<ChatMessage>>,
    meeting_dialog: Mutex<Option<MeetingDialog>>,
    email_dialog: Mutex<Option<EmailDialog>>,
    meetings: Mutex<Vec<MeetingRecord>>,
    projects: Mutex<HashMap<String, Project>>,
}

impl Node {
    pub fn new(
        node_id: impl Into<String>,
        bus: Arc<Intercom>,
        gateway: Arc<ReasoningGateway>,
        calendar: Arc<dyn CalendarProvider>,
        mail: Arc<dyn MailProvider>,
        plans_dir: impl Into<PathBuf>,
    ) -> Self {
        let node_id = node_id.into();
        info!(%node_id, "node created");
        Self {
            node_id,
            bus,
            gateway,
            calendar,
            mail,
            plans_dir: plans_dir.into(),
            history: Mutex::new(Vec::new()),
            meeting_dialog: Mutex::new(None),
            email_dialog: Mutex::new(None),
            meetings: Mutex::new(Vec::new()),
            projects: Mutex::new(HashMap::new()),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Local meeting records, used by listings when the calendar is down.
    pub async fn meeting_records(&self) -> Vec<MeetingRecord> {
        self.meetings.lock().await.clone()
    }

    async fn remember(&self, sender: &str, message: &str) {
        self.history
            .lock()
            .await
            .push(ChatMessage::user(format!("{sender} says: {message}")));
    }
}

#[async_trait]
impl Receiver for Node {
    async fn receive(&self, message: Payload, sender: &str) -> Vec<String> {
        match message {
            Payload::Text(text) => self.handle_text(&text, sender).await,
            Payload::MeetingInvite { record, notice } => {
                info!(node_id = %self.node_id, %sender, "meeting invite received");
                self.meetings.lock().await.push(record);
                self.remember(sender, &notice).await;
                vec![]
            }
            Payload::MeetingUpdate {
                event_id,
                meeting_info,
                notice,
            } => {
                info!(node_id = %self.node_id, %sender, %event_id, "meeting update received");
                let mut meetings = self.meetings.lock().await;
                for record in meetings
                    .iter_mut()
                    .filter(|r| r.event_id.as_deref() == Some(event_id.as_str()))
                {
                    record.meeting_info = meeting_info.clone();
                }
                drop(meetings);
                self.remember(sender, &notice).await;
                vec![]
            }
            Payload::MeetingCancelled { event_id, notice } => {
                info!(node_id = %self.node_id, %sender, %event_id, "meeting cancellation received");
                self.meetings
                    .lock()
                    .await
                    .retain(|r| r.event_id.as_deref() != Some(event_id.as_str()));
                self.remember(sender, &notice).await;
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_resolution_is_strict() {
        assert_eq!(resolve_role_exact(" Design "), Some("design"));
        assert_eq!(resolve_role_exact("designers"), None);
        assert_eq!(resolve_role_exact("hr"), None);
    }

    #[test]
    fn fuzzy_resolution_matches_substrings() {
        assert_eq!(resolve_role_fuzzy("Engineering team"), Some("engineering"));
        assert_eq!(resolve_role_fuzzy("CEO"), Some("ceo"));
        assert_eq!(resolve_role_fuzzy("finance"), None);
        assert_eq!(resolve_role_fuzzy("  "), None);
    }

    #[test]
    fn attendee_addresses_round_trip_through_local_parts() {
        assert_eq!(role_email("design"), "design@example.com");
        assert_eq!(email_local_part("Design@example.com"), "design");
        assert_eq!(email_local_part("plain-name"), "plain-name");
    }
}
