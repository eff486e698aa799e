//! Multi-turn email composition with preview and confirmation.

use regex::Regex;
use std::collections::VecDeque;
use std::sync::OnceLock;

use crate::intent::email::EmailField;

/// A fully collected email awaiting send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailDraft {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmailState {
    Collecting,
    Confirming,
}

/// Result of feeding the dialog a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum EmailStep {
    /// More details are needed; send this question back.
    Ask(String),
    /// All details collected; show this preview and wait for confirmation.
    Preview(String),
    /// The user confirmed; send the draft.
    Send(EmailDraft),
    /// The user declined or gave an unrecognized confirmation reply.
    Cancelled(String),
}

#[derive(Debug)]
pub struct EmailDialog {
    state: EmailState,
    missing: VecDeque<EmailField>,
    draft: EmailDraft,
}

impl EmailDialog {
    /// Starts composition with whatever the intent already extracted.
    /// With nothing missing the dialog goes straight to the preview.
    pub fn start(missing: Vec<EmailField>, draft: EmailDraft) -> (Self, EmailStep) {
        let mut dialog = Self {
            state: EmailState::Collecting,
            missing: missing.into_iter().collect(),
            draft,
        };
        let step = dialog.next_collection_step();
        (dialog, step)
    }

    pub fn record_reply(&mut self, reply: &str) -> EmailStep {
        match self.state {
            EmailState::Confirming => {
                if is_confirmation_positive(reply) {
                    EmailStep::Send(self.draft.clone())
                } else {
                    EmailStep::Cancelled(
                        "Email sending cancelled. You can start over or modify your request."
                            .to_string(),
                    )
                }
            }
            EmailState::Collecting => {
                let Some(field) = self.missing.pop_front() else {
                    return self.next_collection_step();
                };
                match field {
                    EmailField::Recipient => self.draft.recipient = reply.trim().to_string(),
                    EmailField::Body => self.draft.body = reply.to_string(),
                    EmailField::Subject => {
                        // A subject reply may carry the body too.
                        if let Some((subject, body)) = split_subject_and_body(reply) {
                            self.draft.subject = subject;
                            if !body.is_empty() && self.missing.contains(&EmailField::Body) {
                                self.draft.body = body;
                                self.missing.retain(|f| *f != EmailField::Body);
                            }
                        } else {
                            self.draft.subject = reply.trim().to_string();
                        }
                    }
                }
                self.next_collection_step()
            }
        }
    }

    fn next_collection_step(&mut self) -> EmailStep {
        match self.missing.front() {
            Some(field) => EmailStep::Ask(self.question_for(*field)),
            None => {
                self.state = EmailState::Confirming;
                EmailStep::Preview(self.preview())
            }
        }
    }

    fn question_for(&self, field: EmailField) -> String {
        match field {
            EmailField::Recipient => {
                "To whom would you like to send this email? \
                 (Please provide an email address or name)"
                    .to_string()
            }
            EmailField::Subject if self.missing.contains(&EmailField::Body) => {
                "What should be the subject and body of your email? You can provide both \
                 by saying something like 'The subject is X, body is Y'."
                    .to_string()
            }
            EmailField::Subject => "What should be the subject of your email?".to_string(),
            EmailField::Body => {
                "Please write the content of your email. \
                 You can include multiple paragraphs."
                    .to_string()
            }
        }
    }

    fn preview(&self) -> String {
        let subject = if self.draft.subject.is_empty() {
            "(No subject)"
        } else {
            &self.draft.subject
        };
        format!(
            " Email Preview \n\n\
             To: {}\n\
             Subject: {}\n\
             ---\n\
             {}\n\
             ---\n\n\
             Would you like me to send this email? (Yes/No)",
            self.draft.recipient, subject, self.draft.body
        )
    }
}

/// Splits a reply that carries both subject and body, either as the phrase
/// "the subject is X, body is Y" or with `subject:` plus a `body:`,
/// `message:` or `content:` marker.
pub fn split_subject_and_body(message: &str) -> Option<(String, String)> {
    static PHRASE: OnceLock<Regex> = OnceLock::new();
    static MARKER_SUBJECT: OnceLock<Regex> = OnceLock::new();
    static MARKER_BODY: OnceLock<Regex> = OnceLock::new();

    let phrase = PHRASE.get_or_init(|| {
        Regex::new(
            r#"(?i)the\s+subject\s+is\s+["']?(.*?)["']?,?\s+(?:the\s+)?body(?:\s+message)?\s+is\s+["']?(.*?)["']?$"#,
        )
        .unwrap()
    });
    if let Some(caps) = phrase.captures(message) {
        return Some((caps[1].trim().to_string(), caps[2].trim().to_string()));
    }

    let marker_body =
        MARKER_BODY.get_or_init(|| Regex::new(r"(?i)(?:body|message|content):").unwrap());
    let marker_subject =
        MARKER_SUBJECT.get_or_init(|| Regex::new(r"(?i)subject:(.*?)(?:$|,|\n)").unwrap());
    if let Some(split) = marker_body.find(message) {
        let subject_part = &message[..split.start()];
        let body_part = message[split.end()..].trim();
        if let Some(caps) = marker_subject.captures(subject_part) {
            return Some((caps[1].trim().to_string(), body_part.to_string()));
        }
    }

    None
}

const POSITIVE_INDICATORS: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "yup",
    "sure",
    "ok",
    "okay",
    "fine",
    "send",
    "send it",
    "send email",
    "send the email",
    "confirm",
    "confirmed",
    "confirmation",
    "approve",
    "approved",
    "go ahead",
    "proceed",
    "do it",
    "looks good",
];

const NEGATIVE_INDICATORS: &[&str] = &[
    "no",
    "nope",
    "don't",
    "do not",
    "cancel",
    "stop",
    "abort",
    "don't send",
    "do not send",
    "wait",
    "hold on",
    "nevermind",
];

/// Whether a confirmation reply means "send". Negative indicators win over
/// positive ones, and an unrecognized reply counts as a decline.
pub fn is_confirmation_positive(message: &str) -> bool {
    let message = message.trim().to_lowercase();
    if NEGATIVE_INDICATORS.iter().any(|n| message.contains(n)) {
        return false;
    }
    POSITIVE_INDICATORS.iter().any(|p| message.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_missing_fields_then_previews() {
        let (mut dialog, step) = EmailDialog::start(
            vec![EmailField::Recipient, EmailField::Subject, EmailField::Body],
            EmailDraft::default(),
        );
        assert!(matches!(step, EmailStep::Ask(ref q) if q.contains("To whom")));

        let step = dialog.record_reply("marketing");
        // Subject and body are both outstanding, so the combined question fires.
        assert!(matches!(step, EmailStep::Ask(ref q) if q.contains("subject and body")));

        let step = dialog.record_reply("Subject: Launch update, body: We ship Friday.");
        match step {
            EmailStep::Preview(preview) => {
                assert!(preview.contains("To: marketing"));
                assert!(preview.contains("Subject: Launch update"));
                assert!(preview.contains("We ship Friday."));
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn body_only_gap_previews_after_one_reply() {
        let draft = EmailDraft {
            recipient: "marketing".to_string(),
            subject: "Launch".to_string(),
            body: String::new(),
        };
        let (mut dialog, step) = EmailDialog::start(vec![EmailField::Body], draft);
        assert!(matches!(step, EmailStep::Ask(ref q) if q.contains("content of your email")));

        let step = dialog.record_reply("Campaign goes live Monday.");
        match step {
            EmailStep::Preview(preview) => {
                assert!(preview.contains("To: marketing"));
                assert!(preview.contains("Subject: Launch"));
                assert!(preview.contains("Campaign goes live Monday."));
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn nothing_missing_goes_straight_to_preview() {
        let draft = EmailDraft {
            recipient: "design".to_string(),
            subject: String::new(),
            body: "Please review the mockups.".to_string(),
        };
        let (_, step) = EmailDialog::start(vec![], draft);
        match step {
            EmailStep::Preview(preview) => {
                assert!(preview.contains("Subject: (No subject)"));
                assert!(preview.contains("Would you like me to send this email? (Yes/No)"));
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn positive_confirmation_sends_the_draft() {
        let draft = EmailDraft {
            recipient: "ceo".to_string(),
            subject: "Weekly".to_string(),
            body: "All green.".to_string(),
        };
        let (mut dialog, _) = EmailDialog::start(vec![], draft.clone());
        assert_eq!(dialog.record_reply("go ahead"), EmailStep::Send(draft));
    }

    #[test]
    fn unrecognized_confirmation_cancels() {
        let (mut dialog, _) = EmailDialog::start(vec![], EmailDraft::default());
        assert!(matches!(
            dialog.record_reply("maybe tomorrow?"),
            EmailStep::Cancelled(_)
        ));
    }

    #[test]
    fn negative_wins_over_positive() {
        assert!(!is_confirmation_positive("yes wait, don't send it"));
        assert!(is_confirmation_positive("Looks good!"));
        assert!(!is_confirmation_positive("hmm"));
    }

    #[test]
    fn splits_phrase_pattern() {
        let (subject, body) =
            split_subject_and_body("The subject is Launch plan, the body is See attached timeline")
                .unwrap();
        assert_eq!(subject, "Launch plan");
        assert_eq!(body, "See attached timeline");
    }

    #[test]
    fn splits_marker_pattern() {
        let (subject, body) =
            split_subject_and_body("subject: Q3 numbers\nbody: Revenue is up 12%.").unwrap();
        assert_eq!(subject, "Q3 numbers");
        assert_eq!(body, "Revenue is up 12%.");
    }

    #[test]
    fn splits_message_and_content_markers() {
        let (subject, body) =
            split_subject_and_body("subject: Q3 numbers, message: Revenue is up 12%.").unwrap();
        assert_eq!(subject, "Q3 numbers");
        assert_eq!(body, "Revenue is up 12%.");

        let (subject, body) =
            split_subject_and_body("subject: Renewal\ncontent: The contract is attached.").unwrap();
        assert_eq!(subject, "Renewal");
        assert_eq!(body, "The contract is attached.");
    }

    #[test]
    fn plain_text_does_not_split() {
        assert_eq!(split_subject_and_body("just a subject line"), None);
    }
}
