//! Message payloads carried by the intercom.
//!
//! Plain text is what peers and the user normally exchange. Calendar
//! notifications travel as structured variants so the recipient can mirror
//! the change into its own meeting records without parsing prose.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A node's local view of a meeting it attends or created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRecord {
    /// Project or ad-hoc meeting identifier, not the calendar event id.
    pub project_id: String,
    /// Human-readable summary line for listings.
    pub meeting_info: String,
    /// Backing calendar event, absent for local-only fallback records.
    pub event_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    /// A meeting was created and the recipient is a participant.
    MeetingInvite {
        record: MeetingRecord,
        notice: String,
    },
    /// A meeting the recipient attends moved to a new time.
    MeetingUpdate {
        event_id: String,
        meeting_info: String,
        notice: String,
    },
    /// A meeting the recipient attends was cancelled.
    MeetingCancelled {
        event_id: String,
        notice: String,
    },
}

impl Payload {
    pub fn text(message: impl Into<String>) -> Self {
        Payload::Text(message.into())
    }

    /// The human-readable line recorded in the journal and in histories.
    pub fn notice_text(&self) -> &str {
        match self {
            Payload::Text(message) => message,
            Payload::MeetingInvite { notice, .. } => notice,
            Payload::MeetingUpdate { notice, .. } => notice,
            Payload::MeetingCancelled { notice, .. } => notice,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.notice_text())
    }
}

impl From<String> for Payload {
    fn from(message: String) -> Self {
        Payload::Text(message)
    }
}

impl From<&str> for Payload {
    fn from(message: &str) -> Self {
        Payload::Text(message.to_string())
    }
}
