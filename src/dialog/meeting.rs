//! Multi-turn collection of missing meeting details.
//!
//! The dialog is a pure state machine: it never talks to the bus or the
//! calendar. Callers feed it replies and act on the returned step.

use std::collections::{HashMap, VecDeque};

use crate::intent::calendar::MeetingField;

/// What the dialog is collecting details for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingMode {
    Create,
    Reschedule { event_id: String, title: String },
}

/// Result of feeding the dialog a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MeetingStep {
    /// More details are needed; send this question back.
    Ask(String),
    Complete(MeetingOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeetingOutcome {
    /// All details gathered; re-run scheduling over this composite
    /// instruction.
    Create { instruction: String },
    /// All details gathered for moving an existing event.
    Reschedule {
        event_id: String,
        date: String,
        time: String,
    },
}

#[derive(Debug)]
pub struct MeetingDialog {
    initial_message: String,
    missing: VecDeque<MeetingField>,
    collected: HashMap<MeetingField, String>,
    mode: MeetingMode,
}

impl MeetingDialog {
    /// Starts a collection dialog. `seed` carries details already known
    /// (e.g. title and participants preserved across a failed date parse).
    /// With nothing missing the dialog completes immediately.
    pub fn start(
        initial_message: impl Into<String>,
        missing: Vec<MeetingField>,
        seed: Vec<(MeetingField, String)>,
        mode: MeetingMode,
    ) -> (Self, MeetingStep) {
        let mut dialog = Self {
            initial_message: initial_message.into(),
            missing: missing.into_iter().collect(),
            collected: seed.into_iter().collect(),
            mode,
        };
        let step = dialog.next_step();
        (dialog, step)
    }

    pub fn is_rescheduling(&self) -> bool {
        matches!(self.mode, MeetingMode::Reschedule { .. })
    }

    /// Records the reply against the field currently being asked for and
    /// returns the next step.
    pub fn record_reply(&mut self, reply: &str) -> MeetingStep {
        if let Some(field) = self.missing.pop_front() {
            self.collected.insert(field, reply.trim().to_string());
        }
        self.next_step()
    }

    fn next_step(&mut self) -> MeetingStep {
        match self.missing.front() {
            Some(field) => MeetingStep::Ask(self.question_for(*field)),
            None => MeetingStep::Complete(self.outcome()),
        }
    }

    fn question_for(&self, field: MeetingField) -> String {
        let question = match field {
            MeetingField::Time => {
                "What time should the meeting be scheduled? \
                 (Please use HH:MM format in 24-hour time, e.g., 14:30)"
            }
            MeetingField::Date => {
                "On what date should the meeting be scheduled? \
                 (Please use YYYY-MM-DD format, e.g., 2023-12-31)"
            }
            MeetingField::Participants => {
                "Who should attend the meeting? Please list all participants."
            }
            MeetingField::Title => "What is the title or topic of the meeting?",
        };

        let context = if self.is_rescheduling() {
            " for rescheduling"
        } else if matches!(field, MeetingField::Date | MeetingField::Time)
            && self.missing.contains(&MeetingField::Date)
            && self.missing.contains(&MeetingField::Time)
        {
            " (please ensure it's a future date and time)"
        } else {
            ""
        };

        format!("{question}{context}")
    }

    fn outcome(&self) -> MeetingOutcome {
        match &self.mode {
            MeetingMode::Create => MeetingOutcome::Create {
                instruction: self.composite_instruction(),
            },
            MeetingMode::Reschedule { event_id, .. } => MeetingOutcome::Reschedule {
                event_id: event_id.clone(),
                date: self
                    .collected
                    .get(&MeetingField::Date)
                    .cloned()
                    .unwrap_or_default(),
                time: self
                    .collected
                    .get(&MeetingField::Time)
                    .cloned()
                    .unwrap_or_default(),
            },
        }
    }

    /// Combines the initial command with every collected detail into one
    /// instruction suitable for re-extraction.
    fn composite_instruction(&self) -> String {
        let mut message = format!("{} ", self.initial_message);
        if let Some(title) = self.collected.get(&MeetingField::Title) {
            message.push_str(&format!("Title: {title}. "));
        }
        if let Some(date) = self.collected.get(&MeetingField::Date) {
            message.push_str(&format!("Date: {date}. "));
        }
        if let Some(time) = self.collected.get(&MeetingField::Time) {
            message.push_str(&format!("Time: {time}. "));
        }
        if let Some(participants) = self.collected.get(&MeetingField::Participants) {
            message.push_str(&format!("Participants: {participants}."));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asks_fields_in_order_then_completes() {
        let (mut dialog, step) = MeetingDialog::start(
            "schedule a meeting",
            vec![MeetingField::Title, MeetingField::Date, MeetingField::Time],
            vec![],
            MeetingMode::Create,
        );
        assert_eq!(
            step,
            MeetingStep::Ask("What is the title or topic of the meeting?".to_string())
        );

        let step = dialog.record_reply("Roadmap review");
        match step {
            MeetingStep::Ask(q) => {
                assert!(q.contains("YYYY-MM-DD"));
                assert!(q.contains("future date and time"));
            }
            other => panic!("unexpected step: {other:?}"),
        }

        let step = dialog.record_reply("2026-09-10");
        assert!(matches!(step, MeetingStep::Ask(_)));

        let step = dialog.record_reply("14:00");
        match step {
            MeetingStep::Complete(MeetingOutcome::Create { instruction }) => {
                assert!(instruction.starts_with("schedule a meeting "));
                assert!(instruction.contains("Title: Roadmap review."));
                assert!(instruction.contains("Date: 2026-09-10."));
                assert!(instruction.contains("Time: 14:00."));
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn nothing_missing_completes_immediately() {
        let (_, step) = MeetingDialog::start(
            "meet with design tomorrow at 10:00 about icons",
            vec![],
            vec![],
            MeetingMode::Create,
        );
        assert!(matches!(
            step,
            MeetingStep::Complete(MeetingOutcome::Create { .. })
        ));
    }

    #[test]
    fn seeded_details_survive_into_the_instruction() {
        let (mut dialog, _) = MeetingDialog::start(
            "Schedule a meeting.",
            vec![MeetingField::Date, MeetingField::Time],
            vec![
                (MeetingField::Title, "Launch sync".to_string()),
                (MeetingField::Participants, "ceo, design".to_string()),
            ],
            MeetingMode::Create,
        );
        dialog.record_reply("2026-09-11");
        let step = dialog.record_reply("09:30");
        match step {
            MeetingStep::Complete(MeetingOutcome::Create { instruction }) => {
                assert!(instruction.contains("Title: Launch sync."));
                assert!(instruction.contains("Participants: ceo, design."));
                assert!(instruction.contains("Date: 2026-09-11."));
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn reschedule_mode_flags_questions_and_yields_event() {
        let (mut dialog, step) = MeetingDialog::start(
            "",
            vec![MeetingField::Date, MeetingField::Time],
            vec![],
            MeetingMode::Reschedule {
                event_id: "evt-1".to_string(),
                title: "Sprint review".to_string(),
            },
        );
        match step {
            MeetingStep::Ask(q) => assert!(q.ends_with(" for rescheduling")),
            other => panic!("unexpected step: {other:?}"),
        }

        dialog.record_reply("2026-09-12");
        let step = dialog.record_reply("15:00");
        assert_eq!(
            step,
            MeetingStep::Complete(MeetingOutcome::Reschedule {
                event_id: "evt-1".to_string(),
                date: "2026-09-12".to_string(),
                time: "15:00".to_string(),
            })
        );
    }
}
