//! Calendar provider trait and the in-memory implementation.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

/// A scheduled event as the provider stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Attendee email addresses.
    pub attendees: Vec<String>,
}

/// An event to be created.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub summary: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub attendees: Vec<String>,
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Future events ordered by start time.
    async fn list_upcoming(&self, limit: usize) -> Result<Vec<CalendarEvent>>;
    async fn create(&self, draft: EventDraft) -> Result<CalendarEvent>;
    async fn update(&self, event_id: &str, event: CalendarEvent) -> Result<CalendarEvent>;
    async fn delete(&self, event_id: &str) -> Result<()>;
    async fn get(&self, event_id: &str) -> Result<CalendarEvent>;
}

/// Process-local calendar. `set_available(false)` makes every call fail,
/// which exercises the local-record fallback paths.
#[derive(Default)]
pub struct InMemoryCalendar {
    events: Mutex<Vec<CalendarEvent>>,
    unavailable: AtomicBool,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("calendar service not available");
        }
        Ok(())
    }

    pub async fn events(&self) -> Vec<CalendarEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl CalendarProvider for InMemoryCalendar {
    async fn list_upcoming(&self, limit: usize) -> Result<Vec<CalendarEvent>> {
        self.check_available()?;
        let now = Utc::now().naive_utc();
        let mut upcoming: Vec<CalendarEvent> = self
            .events
            .lock()
            .await
            .iter()
            .filter(|event| event.start >= now)
            .cloned()
            .collect();
        upcoming.sort_by_key(|event| event.start);
        upcoming.truncate(limit);
        Ok(upcoming)
    }

    async fn create(&self, draft: EventDraft) -> Result<CalendarEvent> {
        self.check_available()?;
        let event = CalendarEvent {
            id: Uuid::new_v4().to_string(),
            summary: draft.summary,
            description: draft.description,
            start: draft.start,
            end: draft.end,
            attendees: draft.attendees,
        };
        self.events.lock().await.push(event.clone());
        Ok(event)
    }

    async fn update(&self, event_id: &str, event: CalendarEvent) -> Result<CalendarEvent> {
        self.check_available()?;
        let mut events = self.events.lock().await;
        let slot = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| anyhow!("event not found: {event_id}"))?;
        *slot = CalendarEvent {
            id: event_id.to_string(),
            ..event
        };
        Ok(slot.clone())
    }

    async fn delete(&self, event_id: &str) -> Result<()> {
        self.check_available()?;
        let mut events = self.events.lock().await;
        let before = events.len();
        events.retain(|e| e.id != event_id);
        if events.len() == before {
            bail!("event not found: {event_id}");
        }
        Ok(())
    }

    async fn get(&self, event_id: &str) -> Result<CalendarEvent> {
        self.check_available()?;
        self.events
            .lock()
            .await
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or_else(|| anyhow!("event not found: {event_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(summary: &str, hours_from_now: i64) -> EventDraft {
        let start = Utc::now().naive_utc() + Duration::hours(hours_from_now);
        EventDraft {
            summary: summary.to_string(),
            description: String::new(),
            start,
            end: start + Duration::hours(1),
            attendees: vec!["ceo@example.com".to_string()],
        }
    }

    #[tokio::test]
    async fn list_upcoming_orders_and_excludes_past() {
        let calendar = InMemoryCalendar::new();
        calendar.create(draft("later", 48)).await.unwrap();
        calendar.create(draft("sooner", 2)).await.unwrap();
        calendar.create(draft("done", -5)).await.unwrap();

        let upcoming = calendar.list_upcoming(10).await.unwrap();
        let summaries: Vec<&str> = upcoming.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(summaries, vec!["sooner", "later"]);
    }

    #[tokio::test]
    async fn update_replaces_and_keeps_id() {
        let calendar = InMemoryCalendar::new();
        let event = calendar.create(draft("standup", 3)).await.unwrap();

        let mut moved = event.clone();
        moved.start += Duration::hours(2);
        moved.end += Duration::hours(2);
        let updated = calendar.update(&event.id, moved.clone()).await.unwrap();
        assert_eq!(updated.id, event.id);
        assert_eq!(updated.start, moved.start);
    }

    #[tokio::test]
    async fn delete_missing_event_fails() {
        let calendar = InMemoryCalendar::new();
        assert!(calendar.delete("nope").await.is_err());
    }

    #[tokio::test]
    async fn unavailable_calendar_fails_every_call() {
        let calendar = InMemoryCalendar::new();
        calendar.set_available(false);
        assert!(calendar.create(draft("x", 1)).await.is_err());
        assert!(calendar.list_upcoming(5).await.is_err());
    }
}
