//! External collaborator services behind traits.
//!
//! Nodes hold `Arc<dyn CalendarProvider>` and `Arc<dyn MailProvider>`.
//! The in-memory implementations back the demo binary and the tests.

mod calendar;
mod mail;

pub use calendar::{CalendarEvent, CalendarProvider, EventDraft, InMemoryCalendar};
pub use mail::{InMemoryMailbox, LabelKind, MailLabel, MailMessage, MailProvider, OutgoingEmail};
