//! Calendar intent and detail extraction.

use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};

use super::{non_empty, strip_code_fences, IntentError};
use crate::reasoning::ReasoningGateway;

/// A recognized calendar operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarAction {
    Schedule,
    Cancel,
    List,
    Reschedule,
}

/// A piece of meeting information the extractor flagged as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeetingField {
    Time,
    Participants,
    Date,
    Title,
}

impl MeetingField {
    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "time" => Some(MeetingField::Time),
            "participants" => Some(MeetingField::Participants),
            "date" => Some(MeetingField::Date),
            "title" => Some(MeetingField::Title),
            _ => None,
        }
    }
}

impl fmt::Display for MeetingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeetingField::Time => write!(f, "time"),
            MeetingField::Participants => write!(f, "participants"),
            MeetingField::Date => write!(f, "date"),
            MeetingField::Title => write!(f, "title"),
        }
    }
}

/// Outcome of calendar intent detection. `action` is `None` when the
/// message is not a calendar command.
#[derive(Debug, Clone, Default)]
pub struct CalendarIntent {
    pub action: Option<CalendarAction>,
    pub missing: Vec<MeetingField>,
}

#[derive(Deserialize)]
struct RawCalendarIntent {
    #[serde(default)]
    is_calendar_command: bool,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    missing_info: Vec<String>,
}

/// Classifies a message as a calendar command (or not).
///
/// Malformed or failed extraction collapses to "not a calendar command".
pub async fn detect_calendar_intent(gateway: &ReasoningGateway, message: &str) -> CalendarIntent {
    let prompt = format!(
        "Analyze this message and determine if it's a calendar-related command: '{message}'\n\
         Return JSON with:\n\
         - is_calendar_command: boolean\n\
         - action: string (\"schedule_meeting\", \"cancel_meeting\", \"list_meetings\", \
         \"reschedule_meeting\", or null)\n\
         - missing_info: array of strings (what information is missing: \
         \"time\", \"participants\", \"date\", \"title\")"
    );

    let response = gateway.extract(&prompt).await;
    if ReasoningGateway::is_failure(&response) {
        return CalendarIntent::default();
    }

    let raw: RawCalendarIntent = match serde_json::from_str(strip_code_fences(&response)) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(%err, "malformed calendar intent, treating as non-calendar");
            return CalendarIntent::default();
        }
    };

    if !raw.is_calendar_command {
        return CalendarIntent::default();
    }

    let action = match raw.action.as_deref().map(str::trim) {
        Some("schedule_meeting") => Some(CalendarAction::Schedule),
        Some("cancel_meeting") => Some(CalendarAction::Cancel),
        Some("list_meetings") => Some(CalendarAction::List),
        Some("reschedule_meeting") => Some(CalendarAction::Reschedule),
        other => {
            debug!(action = ?other, "unrecognized calendar action, treating as non-calendar");
            None
        }
    };

    let missing = raw
        .missing_info
        .iter()
        .filter_map(|label| {
            let field = MeetingField::from_label(label);
            if field.is_none() {
                debug!(%label, "skipping unknown missing-info label");
            }
            field
        })
        .collect();

    CalendarIntent { action, missing }
}

/// Meeting details pulled out of a scheduling message. Date and time are
/// left absent when unstated; defaults belong to the scheduling handler.
#[derive(Debug, Clone, Default)]
pub struct MeetingDetails {
    pub title: Option<String>,
    pub participants: Vec<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration_minutes: Option<i64>,
}

#[derive(Deserialize)]
struct RawMeetingDetails {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    participants: Vec<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    duration: Option<serde_json::Value>,
}

fn coerce_minutes(value: Option<serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extracts meeting details from a scheduling message. Malformed output
/// collapses to empty details, which the handler reports as missing fields.
pub async fn extract_meeting_details(gateway: &ReasoningGateway, message: &str) -> MeetingDetails {
    let prompt = format!(
        "Extract complete meeting details from: '{message}'\n\n\
         Return JSON with:\n\
         - title: meeting title\n\
         - participants: array of participants (use only: ceo, marketing, engineering, design)\n\
         - date: meeting date (YYYY-MM-DD format)\n\
         - time: meeting time (HH:MM format)\n\
         - duration: duration in minutes (default 60)\n\n\
         If any information is missing, leave the field empty (don't guess)."
    );

    let response = gateway.extract(&prompt).await;
    if ReasoningGateway::is_failure(&response) {
        return MeetingDetails::default();
    }

    let raw: RawMeetingDetails = match serde_json::from_str(strip_code_fences(&response)) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(%err, "malformed meeting details");
            return MeetingDetails::default();
        }
    };

    MeetingDetails {
        title: non_empty(raw.title),
        participants: raw
            .participants
            .into_iter()
            .filter_map(|p| non_empty(Some(p)))
            .collect(),
        date: non_empty(raw.date),
        time: non_empty(raw.time),
        duration_minutes: coerce_minutes(raw.duration),
    }
}

/// Details for moving an existing meeting. `new_time` carries a default
/// when unstated; an empty identifier means extraction came up dry.
#[derive(Debug, Clone)]
pub struct RescheduleDetails {
    /// Lowercased free-text handle for the target meeting.
    pub meeting_identifier: String,
    pub original_date: Option<String>,
    pub new_date: Option<String>,
    pub new_time: String,
    pub new_duration_minutes: Option<i64>,
}

const DEFAULT_RESCHEDULE_TIME: &str = "10:00";

#[derive(Deserialize)]
struct RawReschedule {
    #[serde(default)]
    meeting_identifier: Option<serde_json::Value>,
    #[serde(default)]
    original_date: Option<String>,
    #[serde(default)]
    new_date: Option<String>,
    #[serde(default)]
    new_time: Option<String>,
    #[serde(default)]
    new_duration: Option<serde_json::Value>,
}

pub async fn extract_reschedule_details(
    gateway: &ReasoningGateway,
    message: &str,
) -> RescheduleDetails {
    let prompt = format!(
        "Extract meeting rescheduling details from this message: '{message}'\n\n\
         Identify EXACTLY which meeting needs rescheduling by looking for:\n\
         1. Meeting title or topic (as a simple text string)\n\
         2. Participants involved (as names only)\n\
         3. Original date/time\n\n\
         And what the new schedule should be:\n\
         1. New date (YYYY-MM-DD format)\n\
         2. New time (HH:MM format in 24-hour time)\n\
         3. New duration in minutes (as a number only)\n\n\
         Return a JSON object with these fields:\n\
         - meeting_identifier: A simple text string to identify which meeting to reschedule\n\
         - original_date: Original meeting date if mentioned (YYYY-MM-DD format or null)\n\
         - new_date: New meeting date (YYYY-MM-DD format)\n\
         - new_time: New meeting time (HH:MM format)\n\
         - new_duration: New duration in minutes (or null to keep the same)\n\n\
         IMPORTANT: ALL values must be simple strings or integers, not objects or arrays.\n\
         The meeting_identifier MUST be a simple string."
    );

    let empty = RescheduleDetails {
        meeting_identifier: String::new(),
        original_date: None,
        new_date: None,
        new_time: DEFAULT_RESCHEDULE_TIME.to_string(),
        new_duration_minutes: None,
    };

    let response = gateway.extract(&prompt).await;
    if ReasoningGateway::is_failure(&response) {
        return empty;
    }

    let raw: RawReschedule = match serde_json::from_str(strip_code_fences(&response)) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(%err, "malformed reschedule details");
            return empty;
        }
    };

    let meeting_identifier = match raw.meeting_identifier {
        Some(serde_json::Value::String(s)) => s.trim().to_lowercase(),
        Some(other) => other.to_string().to_lowercase(),
        None => String::new(),
    };

    RescheduleDetails {
        meeting_identifier,
        original_date: non_empty(raw.original_date),
        new_date: non_empty(raw.new_date),
        new_time: non_empty(raw.new_time).unwrap_or_else(|| DEFAULT_RESCHEDULE_TIME.to_string()),
        new_duration_minutes: coerce_minutes(raw.new_duration),
    }
}

/// Cancellation filters. Absent filters do not constrain matching, so a
/// fully empty set matches every upcoming meeting.
#[derive(Debug, Clone, Default)]
pub struct CancellationFilters {
    pub title: Option<String>,
    /// Lowercased participant names.
    pub participants: Vec<String>,
    pub date: Option<String>,
}

#[derive(Deserialize)]
struct RawCancellation {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    with_participants: Vec<String>,
    #[serde(default)]
    date: Option<String>,
}

/// Extracts cancellation filters. Unlike the other calendar extractors this
/// returns an error on malformed output, because an accidental empty filter
/// set would cancel every meeting.
pub async fn extract_cancellation_filters(
    gateway: &ReasoningGateway,
    message: &str,
) -> Result<CancellationFilters, IntentError> {
    let prompt = format!(
        "Extract meeting cancellation details from this message: '{message}'\n\n\
         Return a JSON object with these fields:\n\
         - title: The meeting title or topic to cancel (or null if not specified)\n\
         - with_participants: Array of participants in the meeting to cancel \
         (or empty if not specified)\n\
         - date: Meeting date to cancel (YYYY-MM-DD format, or null if not specified)\n\n\
         Only include information that is explicitly mentioned."
    );

    let response = gateway.extract(&prompt).await;
    if ReasoningGateway::is_failure(&response) {
        return Err(IntentError::Unavailable);
    }

    let raw: RawCancellation = serde_json::from_str(strip_code_fences(&response))
        .map_err(|e| IntentError::Malformed(e.to_string()))?;

    Ok(CancellationFilters {
        title: non_empty(raw.title).map(|t| t.to_lowercase()),
        participants: raw
            .with_participants
            .into_iter()
            .filter_map(|p| non_empty(Some(p)))
            .map(|p| p.to_lowercase())
            .collect(),
        date: non_empty(raw.date),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::reasoning::scripted::ScriptedClient;
    use std::sync::Arc;

    fn gateway(responses: &[&str]) -> ReasoningGateway {
        let client = ScriptedClient::with_responses(responses.iter().copied());
        ReasoningGateway::new(client, &Config::new("k", "m"))
    }

    #[tokio::test]
    async fn recognizes_schedule_intent_with_missing_fields() {
        let gw = gateway(&[r#"{
            "is_calendar_command": true,
            "action": "schedule_meeting",
            "missing_info": ["date", "time", "whatever"]
        }"#]);

        let intent = detect_calendar_intent(&gw, "set up a sync with design").await;
        assert_eq!(intent.action, Some(CalendarAction::Schedule));
        assert_eq!(intent.missing, vec![MeetingField::Date, MeetingField::Time]);
    }

    #[tokio::test]
    async fn unknown_action_is_not_a_calendar_command() {
        let gw = gateway(&[
            r#"{"is_calendar_command": true, "action": "book_room", "missing_info": []}"#,
        ]);
        let intent = detect_calendar_intent(&gw, "book the big room").await;
        assert_eq!(intent.action, None);
    }

    #[tokio::test]
    async fn malformed_intent_collapses_to_default() {
        let gw = gateway(&["not json at all"]);
        let intent = detect_calendar_intent(&gw, "anything").await;
        assert_eq!(intent.action, None);
        assert!(intent.missing.is_empty());
    }

    #[tokio::test]
    async fn provider_outage_collapses_to_default() {
        let gw = gateway(&[]);
        let intent = detect_calendar_intent(&gw, "anything").await;
        assert_eq!(intent.action, None);
    }

    #[tokio::test]
    async fn meeting_details_leave_absent_fields_empty() {
        let gw = gateway(&[r#"{
            "title": "Sprint review",
            "participants": ["engineering", "design"],
            "date": "",
            "time": "",
            "duration": "45"
        }"#]);

        let details = extract_meeting_details(&gw, "sprint review with eng and design").await;
        assert_eq!(details.title.as_deref(), Some("Sprint review"));
        assert_eq!(details.participants, vec!["engineering", "design"]);
        assert_eq!(details.date, None);
        assert_eq!(details.time, None);
        assert_eq!(details.duration_minutes, Some(45));
    }

    #[tokio::test]
    async fn meeting_details_survive_code_fences() {
        let gw = gateway(&["```json\n{\"title\": \"Standup\", \"participants\": [\"ceo\"]}\n```"]);
        let details = extract_meeting_details(&gw, "standup with the ceo").await;
        assert_eq!(details.title.as_deref(), Some("Standup"));
    }

    #[tokio::test]
    async fn reschedule_defaults_time_and_lowercases_identifier() {
        let gw = gateway(&[r#"{
            "meeting_identifier": "Sprint Review",
            "new_date": "2026-09-03"
        }"#]);

        let details = extract_reschedule_details(&gw, "move the sprint review").await;
        assert_eq!(details.meeting_identifier, "sprint review");
        assert_eq!(details.new_date.as_deref(), Some("2026-09-03"));
        assert_eq!(details.new_time, "10:00");
        assert_eq!(details.new_duration_minutes, None);
    }

    #[tokio::test]
    async fn malformed_reschedule_yields_empty_identifier() {
        let gw = gateway(&["oops"]);
        let details = extract_reschedule_details(&gw, "move the thing").await;
        assert!(details.meeting_identifier.is_empty());
    }

    #[tokio::test]
    async fn malformed_cancellation_is_an_error_not_a_match_all() {
        let gw = gateway(&["{broken"]);
        let result = extract_cancellation_filters(&gw, "cancel everything").await;
        assert!(matches!(result, Err(IntentError::Malformed(_))));
    }

    #[tokio::test]
    async fn cancellation_filters_are_lowercased() {
        let gw = gateway(&[r#"{
            "title": "Budget Review",
            "with_participants": ["Marketing"],
            "date": null
        }"#]);
        let filters = extract_cancellation_filters(&gw, "cancel the budget review")
            .await
            .unwrap();
        assert_eq!(filters.title.as_deref(), Some("budget review"));
        assert_eq!(filters.participants, vec!["marketing"]);
        assert_eq!(filters.date, None);
    }
}
