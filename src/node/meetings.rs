//! Meeting scheduling, listing, rescheduling and cancellation.

use chrono::{Duration, NaiveDateTime, Utc};
use tracing::{error, info, warn};

use super::{email_local_part, resolve_role_exact, role_email, Node};
use crate::collab::{CalendarEvent, CalendarProvider, EventDraft};
use crate::dialog::{MeetingDialog, MeetingMode, MeetingStep};
use crate::intent::calendar::{
    extract_cancellation_filters, extract_meeting_details, extract_reschedule_details,
    CancellationFilters, MeetingDetails, MeetingField,
};
use crate::net::{MeetingRecord, Payload};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const DEFAULT_DURATION_MINUTES: i64 = 60;

fn parse_meeting_datetime(date: &str, time: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), DATETIME_FORMAT)
}

/// How well an event matches a reschedule request. Title containment beats
/// word overlap; a matching original date outweighs both.
fn score_event(event: &CalendarEvent, identifier: &str, original_date: Option<&str>) -> u32 {
    let mut score = 0;
    let title = event.summary.to_lowercase();
    if title.contains(identifier) {
        score += 3;
    } else if identifier.split_whitespace().any(|word| title.contains(word)) {
        score += 1;
    }
    if event
        .attendees
        .iter()
        .any(|attendee| attendee.to_lowercase().contains(identifier))
    {
        score += 2;
    }
    if let Some(date) = original_date {
        if event.start.to_string().contains(date) {
            score += 4;
        }
    }
    score
}

fn matches_cancellation(event: &CalendarEvent, filters: &CancellationFilters) -> bool {
    if let Some(title) = &filters.title {
        if !event.summary.to_lowercase().contains(title) {
            return false;
        }
    }
    if !filters.participants.is_empty() {
        let locals: Vec<String> = event.attendees.iter().map(|a| email_local_part(a)).collect();
        if !filters.participants.iter().any(|p| locals.contains(p)) {
            return false;
        }
    }
    if let Some(date) = &filters.date {
        if !event.start.to_string().contains(date) {
            return false;
        }
    }
    true
}

impl Node {
    /// Opens a collection dialog for a scheduling request with known gaps.
    pub(super) async fn start_meeting_dialog(
        &self,
        message: &str,
        missing: Vec<MeetingField>,
    ) -> Vec<String> {
        let (dialog, step) = MeetingDialog::start(message, missing, vec![], MeetingMode::Create);
        match step {
            MeetingStep::Ask(question) => {
                *self.meeting_dialog.lock().await = Some(dialog);
                vec![question]
            }
            // Nothing was actually missing; schedule right away.
            MeetingStep::Complete(_) => self.handle_meeting_creation(message).await,
        }
    }

    pub(super) async fn handle_meeting_creation(&self, message: &str) -> Vec<String> {
        let details = extract_meeting_details(&self.gateway, message).await;

        let Some(title) = details.title.clone() else {
            let absent = if details.participants.is_empty() {
                "title, participants"
            } else {
                "title"
            };
            return vec![format!("Cannot schedule meeting: missing {absent}")];
        };
        if details.participants.is_empty() {
            return vec!["Cannot schedule meeting: missing participants".to_string()];
        }

        let mut participants: Vec<String> = details
            .participants
            .iter()
            .filter_map(|p| resolve_role_exact(p))
            .map(String::from)
            .collect();
        if participants.is_empty() {
            return vec!["Cannot schedule meeting: no valid participants".to_string()];
        }
        if !participants.contains(&self.node_id) {
            participants.push(self.node_id.clone());
        }

        let now = Utc::now().naive_utc();
        let date = details
            .date
            .clone()
            .unwrap_or_else(|| now.format("%Y-%m-%d").to_string());
        let time = details
            .time
            .clone()
            .unwrap_or_else(|| (now + Duration::hours(1)).format("%H:%M").to_string());

        let start = match parse_meeting_datetime(&date, &time) {
            Ok(start) if start >= now => start,
            Ok(_) => {
                let notice = format!(
                    "The meeting time {date} at {time} is in the past. \
                     Please provide a future date and time."
                );
                return self.recollect_date_time(notice, &details).await;
            }
            Err(_) => {
                let notice = "I couldn't understand the date/time format. Please provide \
                              the date in YYYY-MM-DD format and time in HH:MM format."
                    .to_string();
                return self.recollect_date_time(notice, &details).await;
            }
        };

        let duration = details
            .duration_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(DEFAULT_DURATION_MINUTES);
        let end = start + Duration::minutes(duration);

        let meeting_id = format!("meeting_{}", Utc::now().timestamp());
        self.create_calendar_meeting(&meeting_id, &title, &participants, start, end)
            .await
    }

    /// Re-enters date/time collection, preserving whatever was already
    /// extracted.
    async fn recollect_date_time(&self, notice: String, details: &MeetingDetails) -> Vec<String> {
        let mut seed = Vec::new();
        if let Some(title) = &details.title {
            seed.push((MeetingField::Title, title.clone()));
        }
        if !details.participants.is_empty() {
            seed.push((MeetingField::Participants, details.participants.join(", ")));
        }
        let (dialog, step) = MeetingDialog::start(
            "Schedule a meeting.",
            vec![MeetingField::Date, MeetingField::Time],
            seed,
            MeetingMode::Create,
        );
        let mut replies = vec![notice];
        if let MeetingStep::Ask(question) = step {
            *self.meeting_dialog.lock().await = Some(dialog);
            replies.push(question);
        }
        replies
    }

    pub(super) async fn create_calendar_meeting(
        &self,
        meeting_id: &str,
        title: &str,
        participants: &[String],
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Vec<String> {
        let draft = EventDraft {
            summary: title.to_string(),
            description: String::new(),
            start,
            end,
            attendees: participants.iter().map(|p| role_email(p)).collect(),
        };

        let event = match self.calendar.create(draft).await {
            Ok(event) => event,
            Err(err) => {
                warn!(node_id = %self.node_id, %err, "calendar create failed, keeping a local record");
                return self
                    .fallback_schedule_meeting(meeting_id, title, participants)
                    .await;
            }
        };

        let date = start.format("%Y-%m-%d");
        let time = start.format("%H:%M");
        info!(node_id = %self.node_id, event_id = %event.id, %title, "meeting created");

        let record = MeetingRecord {
            project_id: meeting_id.to_string(),
            meeting_info: title.to_string(),
            event_id: Some(event.id.clone()),
        };
        self.meetings.lock().await.push(record.clone());

        let notice = format!(
            "New meeting: '{title}' scheduled by {} for {date} at {time}",
            self.node_id
        );
        for participant in participants {
            if participant != &self.node_id && self.bus.is_registered(participant).await {
                self.bus
                    .send(
                        &self.node_id,
                        participant,
                        Payload::MeetingInvite {
                            record: record.clone(),
                            notice: notice.clone(),
                        },
                    )
                    .await;
            }
        }

        vec![format!(
            "Meeting '{title}' scheduled for {date} at {time} with {}",
            participants.join(", ")
        )]
    }

    /// Local-only scheduling when the calendar service is down. The record
    /// has no event id and participants still get their invite.
    pub(super) async fn fallback_schedule_meeting(
        &self,
        project_id: &str,
        title: &str,
        participants: &[String],
    ) -> Vec<String> {
        let meeting_info = format!("{title} (scheduled locally by {})", self.node_id);
        let record = MeetingRecord {
            project_id: project_id.to_string(),
            meeting_info: meeting_info.clone(),
            event_id: None,
        };
        self.meetings.lock().await.push(record.clone());

        let notice = format!("New meeting: {meeting_info}");
        for participant in participants {
            if participant != &self.node_id && self.bus.is_registered(participant).await {
                self.bus
                    .send(
                        &self.node_id,
                        participant,
                        Payload::MeetingInvite {
                            record: record.clone(),
                            notice: notice.clone(),
                        },
                    )
                    .await;
            }
        }

        vec![format!(
            "Calendar service unavailable. Scheduled local meeting: {meeting_info}"
        )]
    }

    pub(super) async fn handle_list_meetings(&self) -> Vec<String> {
        match self.calendar.list_upcoming(10).await {
            Ok(events) if events.is_empty() => vec!["No upcoming meetings found.".to_string()],
            Ok(events) => {
                let mut out = String::from("Upcoming meetings:");
                for event in events {
                    let attendees = event
                        .attendees
                        .iter()
                        .map(|a| email_local_part(a))
                        .collect::<Vec<_>>()
                        .join(", ");
                    out.push_str(&format!(
                        "\n  - {} on {} with {attendees}",
                        event.summary,
                        event.start.format("%Y-%m-%d at %H:%M")
                    ));
                }
                vec![out]
            }
            Err(err) => {
                warn!(node_id = %self.node_id, %err, "calendar unavailable, listing local records");
                let meetings = self.meetings.lock().await;
                if meetings.is_empty() {
                    return vec!["No meetings scheduled.".to_string()];
                }
                let mut out = String::from("Upcoming meetings (local records):");
                for record in meetings.iter() {
                    out.push_str(&format!("\n  - {}", record.meeting_info));
                }
                vec![out]
            }
        }
    }

    pub(super) async fn handle_meeting_rescheduling(&self, message: &str) -> Vec<String> {
        let details = extract_reschedule_details(&self.gateway, message).await;
        if details.meeting_identifier.is_empty() {
            return vec!["Could not determine which meeting to reschedule.".to_string()];
        }
        let Some(new_date) = details.new_date.clone() else {
            return vec!["No new date specified for rescheduling.".to_string()];
        };

        let events = match self.calendar.list_upcoming(20).await {
            Ok(events) => events,
            Err(err) => {
                error!(node_id = %self.node_id, %err, "failed to fetch calendar events");
                return vec!["Error fetching calendar events.".to_string()];
            }
        };
        if events.is_empty() {
            return vec!["No upcoming meetings found to reschedule.".to_string()];
        }

        // First event with the strictly best score wins.
        let mut target: Option<&CalendarEvent> = None;
        let mut best_score = 0;
        for event in &events {
            let score = score_event(
                event,
                &details.meeting_identifier,
                details.original_date.as_deref(),
            );
            if score > best_score {
                best_score = score;
                target = Some(event);
            }
        }
        let Some(target) = target else {
            return vec![format!(
                "Could not find a meeting matching '{}'",
                details.meeting_identifier
            )];
        };

        let now = Utc::now().naive_utc();
        let new_start = match parse_meeting_datetime(&new_date, &details.new_time) {
            Ok(start) if start >= now => start,
            Ok(_) => {
                let notice = format!(
                    "The rescheduled time {new_date} at {} is in the past. \
                     Please provide a future date and time.",
                    details.new_time
                );
                return self.recollect_reschedule(notice, target).await;
            }
            Err(_) => {
                let notice = "I couldn't understand the date/time format. Please provide \
                              the date in YYYY-MM-DD format and time in HH:MM format."
                    .to_string();
                return self.recollect_reschedule(notice, target).await;
            }
        };

        let original_duration = (target.end - target.start).num_minutes();
        let duration = details
            .new_duration_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(original_duration);

        let mut moved = target.clone();
        moved.start = new_start;
        moved.end = new_start + Duration::minutes(duration);

        match self.calendar.update(&target.id, moved).await {
            Ok(updated) => self.finish_reschedule(updated, duration).await,
            Err(err) => {
                error!(node_id = %self.node_id, %err, "failed to update calendar event");
                vec!["There was an error rescheduling the meeting. Please try again.".to_string()]
            }
        }
    }

    /// Dialog completion for a reschedule: the event is known, only the new
    /// date and time were collected.
    pub(super) async fn complete_meeting_reschedule(
        &self,
        event_id: &str,
        date: &str,
        time: &str,
    ) -> Vec<String> {
        let event = match self.calendar.get(event_id).await {
            Ok(event) => event,
            Err(err) => {
                error!(node_id = %self.node_id, %err, %event_id, "target event vanished");
                return vec![
                    "There was an error rescheduling the meeting. Please try again.".to_string(),
                ];
            }
        };

        let now = Utc::now().naive_utc();
        let new_start = match parse_meeting_datetime(date, time) {
            Ok(start) if start >= now => start,
            Ok(_) => {
                let notice = format!(
                    "The provided time {date} at {time} is still in the past. \
                     Please provide a future date and time."
                );
                return self.recollect_reschedule(notice, &event).await;
            }
            Err(_) => {
                let notice = "I couldn't understand the date/time format. Please provide \
                              the date in YYYY-MM-DD format and time in HH:MM format."
                    .to_string();
                return self.recollect_reschedule(notice, &event).await;
            }
        };

        let duration = (event.end - event.start).num_minutes();
        let mut moved = event.clone();
        moved.start = new_start;
        moved.end = new_start + Duration::minutes(duration);

        match self.calendar.update(&event.id, moved).await {
            Ok(updated) => self.finish_reschedule(updated, duration).await,
            Err(err) => {
                error!(node_id = %self.node_id, %err, "failed to update calendar event");
                vec!["There was an error rescheduling the meeting. Please try again.".to_string()]
            }
        }
    }

    async fn recollect_reschedule(&self, notice: String, event: &CalendarEvent) -> Vec<String> {
        let (dialog, step) = MeetingDialog::start(
            "",
            vec![MeetingField::Date, MeetingField::Time],
            vec![],
            MeetingMode::Reschedule {
                event_id: event.id.clone(),
                title: event.summary.clone(),
            },
        );
        let mut replies = vec![notice];
        if let MeetingStep::Ask(question) = step {
            *self.meeting_dialog.lock().await = Some(dialog);
            replies.push(question);
        }
        replies
    }

    /// Mirrors the updated event into local records and notifies attendees.
    async fn finish_reschedule(&self, updated: CalendarEvent, duration: i64) -> Vec<String> {
        let formatted_date = updated.start.format("%B %d, %Y").to_string();
        let formatted_time = updated.start.format("%I:%M %p").to_string();
        let meeting_info = format!(
            "{} (Rescheduled to {formatted_date} at {formatted_time})",
            updated.summary
        );

        {
            let mut meetings = self.meetings.lock().await;
            for record in meetings
                .iter_mut()
                .filter(|r| r.event_id.as_deref() == Some(updated.id.as_str()))
            {
                record.meeting_info = meeting_info.clone();
            }
        }

        let notice = format!(
            "Your meeting '{}' has been rescheduled by {}.\n\
             New date: {formatted_date}\n\
             New time: {formatted_time}\n\
             Duration: {duration} minutes",
            updated.summary, self.node_id
        );
        for attendee in &updated.attendees {
            let attendee_id = email_local_part(attendee);
            if attendee_id != self.node_id && self.bus.is_registered(&attendee_id).await {
                self.bus
                    .send(
                        &self.node_id,
                        &attendee_id,
                        Payload::MeetingUpdate {
                            event_id: updated.id.clone(),
                            meeting_info: meeting_info.clone(),
                            notice: notice.clone(),
                        },
                    )
                    .await;
            }
        }

        vec![format!(
            "Meeting '{}' has been rescheduled to {formatted_date} at {formatted_time}.",
            updated.summary
        )]
    }

    pub(super) async fn handle_meeting_cancellation(&self, message: &str) -> Vec<String> {
        let filters = match extract_cancellation_filters(&self.gateway, message).await {
            Ok(filters) => filters,
            Err(err) => {
                error!(node_id = %self.node_id, %err, "cancellation extraction failed");
                return vec!["Error cancelling meeting.".to_string()];
            }
        };

        let events = match self.calendar.list_upcoming(10).await {
            Ok(events) => events,
            Err(err) => {
                error!(node_id = %self.node_id, %err, "failed to fetch calendar events");
                return vec!["Error fetching calendar events.".to_string()];
            }
        };
        if events.is_empty() {
            return vec!["No upcoming meetings found to cancel.".to_string()];
        }

        let mut replies = Vec::new();
        let mut cancelled = 0;
        for event in events {
            if !matches_cancellation(&event, &filters) {
                continue;
            }

            if let Err(err) = self.calendar.delete(&event.id).await {
                error!(node_id = %self.node_id, %err, event_id = %event.id, "delete failed");
                replies.push("Error cancelling meeting.".to_string());
                break;
            }

            self.meetings
                .lock()
                .await
                .retain(|r| r.event_id.as_deref() != Some(event.id.as_str()));
            cancelled += 1;
            info!(node_id = %self.node_id, event_id = %event.id, summary = %event.summary, "meeting cancelled");
            replies.push(format!("Cancelled meeting: {}", event.summary));

            let notice = format!(
                "Meeting '{}' has been cancelled by {}",
                event.summary, self.node_id
            );
            for attendee in &event.attendees {
                let attendee_id = email_local_part(attendee);
                if attendee_id != self.node_id && self.bus.is_registered(&attendee_id).await {
                    self.bus
                        .send(
                            &self.node_id,
                            &attendee_id,
                            Payload::MeetingCancelled {
                                event_id: event.id.clone(),
                                notice: notice.clone(),
                            },
                        )
                        .await;
                }
            }
        }

        if cancelled == 0 {
            replies.push("No meetings found matching the cancellation criteria".to_string());
        } else {
            replies.push(format!("Cancelled {cancelled} meeting(s)"));
        }
        replies
    }
}
