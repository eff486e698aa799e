//! Email composition, sending and mailbox queries.

use tracing::{error, info, warn};

use super::{resolve_role_exact, role_email, Node};
use crate::collab::{LabelKind, MailMessage, MailProvider, OutgoingEmail};
use crate::dialog::{EmailDialog, EmailDraft};
use crate::intent::email::{EmailAction, SendEmailIntent, SummaryStyle};
use crate::reasoning::ChatMessage;

/// Maps a recipient the way people type them: full addresses pass through,
/// known role names get their role address, anything else becomes a local
/// address at the default domain.
fn resolve_recipient_address(recipient: &str) -> String {
    let recipient = recipient.trim();
    if recipient.contains('@') {
        return recipient.to_string();
    }
    if let Some(role) = resolve_role_exact(recipient) {
        return role_email(role);
    }
    format!("{}@example.com", recipient.to_lowercase().replace(' ', ""))
}

/// Falls back to the first body line as a subject when it reads like one.
fn derive_subject(body: &str, node_id: &str) -> String {
    let first_line = body.lines().next().unwrap_or("").trim();
    if first_line.len() > 5 && first_line.len() < 80 {
        first_line.to_string()
    } else {
        format!("Message from {node_id}")
    }
}

impl Node {
    /// Opens (or immediately previews) a composition dialog from a detected
    /// send request.
    pub(super) async fn start_email_composition(&self, intent: SendEmailIntent) -> Vec<String> {
        let draft = EmailDraft {
            recipient: intent.recipient,
            subject: intent.subject,
            body: intent.body,
        };
        let (dialog, step) = EmailDialog::start(intent.missing, draft);
        self.apply_email_step(dialog, step).await
    }

    pub(super) async fn send_composed_email(&self, draft: EmailDraft) -> String {
        if draft.recipient.is_empty() || draft.body.is_empty() {
            return "Cannot send email - missing recipient or body content.".to_string();
        }
        let subject = if draft.subject.is_empty() {
            derive_subject(&draft.body, &self.node_id)
        } else {
            draft.subject
        };
        let to = resolve_recipient_address(&draft.recipient);

        let email = OutgoingEmail {
            to: to.clone(),
            subject,
            body: draft.body,
        };
        match self.mail.send(email).await {
            Ok(message_id) => {
                info!(node_id = %self.node_id, %to, %message_id, "email sent");
                format!("Email sent successfully to {to}!")
            }
            Err(err) => {
                error!(node_id = %self.node_id, %to, %err, "failed to send email");
                "There was an error sending your email. Please try again later.".to_string()
            }
        }
    }

    pub(super) async fn handle_email_query(&self, action: EmailAction) -> Vec<String> {
        match action {
            EmailAction::FetchRecent { count, style } => {
                self.fetch_and_summarize("", count, style, "I couldn't find any recent emails.")
                    .await
            }
            EmailAction::Search {
                query,
                count,
                style,
            } => {
                if query.is_empty() {
                    return vec![
                        "I need a search query to look for emails. Please tell me what to \
                         search for."
                            .to_string(),
                    ];
                }
                self.fetch_and_summarize(
                    &query,
                    count,
                    style,
                    "I couldn't find any emails matching your search.",
                )
                .await
            }
            EmailAction::AdvancedSearch { criteria, style } => {
                if criteria.is_empty() {
                    return vec![
                        "I couldn't understand your search criteria. Please try rephrasing \
                         your request."
                            .to_string(),
                    ];
                }
                let limit = criteria.max_results;
                self.fetch_and_summarize(
                    &criteria.to_query(),
                    limit,
                    style,
                    "I couldn't find any emails matching your search.",
                )
                .await
            }
            EmailAction::ListLabels => self.list_mail_labels().await,
            EmailAction::None => vec![],
        }
    }

    async fn fetch_and_summarize(
        &self,
        query: &str,
        limit: usize,
        style: SummaryStyle,
        empty_notice: &str,
    ) -> Vec<String> {
        let ids = match self.mail.list_messages(query, limit).await {
            Ok(ids) => ids,
            Err(err) => {
                error!(node_id = %self.node_id, %err, "failed to list messages");
                return vec![
                    "I couldn't retrieve your emails. Please try again later.".to_string(),
                ];
            }
        };
        if ids.is_empty() {
            return vec![empty_notice.to_string()];
        }

        let mut messages = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.mail.get_message(id).await {
                Ok(message) => messages.push(message),
                Err(err) => warn!(node_id = %self.node_id, %id, %err, "skipping unreadable message"),
            }
        }
        if messages.is_empty() {
            return vec![empty_notice.to_string()];
        }

        vec![self.summarize_emails(&messages, style).await]
    }

    async fn list_mail_labels(&self) -> Vec<String> {
        let labels = match self.mail.list_labels().await {
            Ok(labels) => labels,
            Err(err) => {
                error!(node_id = %self.node_id, %err, "failed to list labels");
                return vec!["I couldn't retrieve your email labels.".to_string()];
            }
        };
        if labels.is_empty() {
            return vec!["You have no email labels.".to_string()];
        }

        let (system, custom): (Vec<_>, Vec<_>) = labels
            .into_iter()
            .partition(|label| label.kind == LabelKind::System);

        let mut out = String::from("Your email labels:\n");
        if !system.is_empty() {
            out.push_str("\nSystem Labels:\n");
            for label in &system {
                out.push_str(&format!("  - {}\n", label.name));
            }
        }
        if !custom.is_empty() {
            out.push_str("\nCustom Labels:\n");
            for label in &custom {
                out.push_str(&format!("  - {}\n", label.name));
            }
        }
        vec![out.trim_end().to_string()]
    }

    async fn summarize_emails(&self, messages: &[MailMessage], style: SummaryStyle) -> String {
        let mut listing = String::new();
        for (i, message) in messages.iter().enumerate() {
            listing.push_str(&format!(
                "Email {}:\nFrom: {}\nSubject: {}\nDate: {}\nSnippet: {}\n\n",
                i + 1,
                message.sender,
                message.subject,
                message.date.format("%Y-%m-%d %H:%M"),
                message.snippet
            ));
        }
        let directive = match style {
            SummaryStyle::Concise => {
                "Summarize these emails in a concise way, highlighting only the most \
                 important information:"
            }
            SummaryStyle::Detailed => {
                "Summarize these emails in detail, covering the key points of each message:"
            }
        };
        self.gateway
            .complete(vec![ChatMessage::user(format!("{directive}\n\n{listing}"))])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::collab::MailLabel;
    use crate::net::{Payload, Receiver};
    use crate::node::testutil::{harness, NOT_CALENDAR};

    fn message(id: &str, sender: &str, subject: &str, minutes_ago: i64) -> MailMessage {
        MailMessage {
            id: id.to_string(),
            sender: sender.to_string(),
            subject: subject.to_string(),
            date: Utc::now() - Duration::minutes(minutes_ago),
            snippet: format!("{subject} snippet"),
            body: format!("{subject} body"),
            labels: vec!["INBOX".to_string()],
        }
    }

    #[test]
    fn recipient_resolution_covers_addresses_roles_and_names() {
        assert_eq!(
            resolve_recipient_address("pat@corp.example"),
            "pat@corp.example"
        );
        assert_eq!(resolve_recipient_address("Marketing"), "marketing@example.com");
        assert_eq!(
            resolve_recipient_address("Jordan Reyes"),
            "jordanreyes@example.com"
        );
    }

    #[test]
    fn subject_derivation_uses_a_plausible_first_line() {
        assert_eq!(
            derive_subject("Quarterly numbers attached.\nSee tab 2.", "ceo"),
            "Quarterly numbers attached."
        );
        assert_eq!(derive_subject("ok", "ceo"), "Message from ceo");
        let long = "x".repeat(120);
        assert_eq!(derive_subject(&long, "design"), "Message from design");
    }

    #[tokio::test]
    async fn composition_collects_missing_fields_then_sends() {
        let intent = r#"{"is_send_email": true, "recipient": "design",
                         "missing_info": ["subject", "body"]}"#;
        let h = harness("ceo", &[NOT_CALENDAR, intent]).await;

        let replies = h
            .node
            .receive(Payload::text("send an email to design"), "user")
            .await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("subject"));

        let replies = h.node.receive(Payload::text("Icon handoff"), "user").await;
        assert!(replies[0].contains("body") || replies[0].contains("content"));

        let replies = h
            .node
            .receive(Payload::text("Final icons are in the shared drive."), "user")
            .await;
        assert!(replies[0].contains("Email Preview"));
        assert!(replies[0].contains("To: design"));
        assert!(replies[0].contains("Subject: Icon handoff"));

        let replies = h.node.receive(Payload::text("yes"), "user").await;
        assert_eq!(
            replies,
            vec!["Email sent successfully to design@example.com!".to_string()]
        );

        let sent = h.mailbox.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "design@example.com");
        assert_eq!(sent[0].subject, "Icon handoff");
        assert_eq!(sent[0].body, "Final icons are in the shared drive.");
    }

    #[tokio::test]
    async fn declined_preview_cancels_without_sending() {
        let intent = r#"{"is_send_email": true, "recipient": "marketing",
                         "subject": "Budget", "body": "Numbers attached.",
                         "missing_info": []}"#;
        let h = harness("ceo", &[NOT_CALENDAR, intent]).await;

        let replies = h
            .node
            .receive(Payload::text("email marketing the budget"), "user")
            .await;
        assert!(replies[0].contains("Email Preview"));

        let replies = h.node.receive(Payload::text("no"), "user").await;
        assert!(replies[0].contains("cancelled"));
        assert!(h.mailbox.sent().await.is_empty());
    }

    #[tokio::test]
    async fn mail_outage_reports_a_send_failure() {
        let intent = r#"{"is_send_email": true, "recipient": "design",
                         "subject": "Hi", "body": "Quick question.",
                         "missing_info": []}"#;
        let h = harness("ceo", &[NOT_CALENDAR, intent]).await;
        h.mailbox.set_available(false);

        h.node.receive(Payload::text("email design"), "user").await;
        let replies = h.node.receive(Payload::text("yes"), "user").await;
        assert_eq!(
            replies,
            vec!["There was an error sending your email. Please try again later.".to_string()]
        );
    }

    #[tokio::test]
    async fn fetch_recent_summarizes_messages() {
        let action = r#"{"action": "fetch_recent", "count": 2, "summary_type": "concise"}"#;
        let h = harness(
            "ceo",
            &[
                NOT_CALENDAR,
                r#"{"is_send_email": false}"#,
                action,
                "Two updates from marketing, nothing urgent.",
            ],
        )
        .await;
        h.mailbox.deliver(message("m1", "a@example.com", "Update", 30)).await;
        h.mailbox.deliver(message("m2", "b@example.com", "Numbers", 10)).await;

        let replies = h
            .node
            .receive(Payload::text("summarize my recent emails"), "user")
            .await;
        assert_eq!(
            replies,
            vec!["Two updates from marketing, nothing urgent.".to_string()]
        );

        // The summary prompt carries sender and subject lines.
        let calls = h.client.calls();
        let prompt = &calls.last().unwrap().last().unwrap().content;
        assert!(prompt.contains("From: b@example.com"));
        assert!(prompt.contains("Subject: Update"));
    }

    #[tokio::test]
    async fn empty_mailbox_is_reported_plainly() {
        let action = r#"{"action": "fetch_recent"}"#;
        let h = harness(
            "ceo",
            &[NOT_CALENDAR, r#"{"is_send_email": false}"#, action],
        )
        .await;

        let replies = h.node.receive(Payload::text("any new mail?"), "user").await;
        assert_eq!(replies, vec!["I couldn't find any recent emails.".to_string()]);
    }

    #[tokio::test]
    async fn advanced_search_builds_an_operator_query() {
        let action = r#"{"action": "advanced_search",
                         "criteria": {"from": "a@example.com", "subject": "Status"},
                         "summary_type": "detailed"}"#;
        let h = harness(
            "ceo",
            &[
                NOT_CALENDAR,
                r#"{"is_send_email": false}"#,
                action,
                "One status update from a@example.com.",
            ],
        )
        .await;
        h.mailbox.deliver(message("m1", "a@example.com", "Status", 5)).await;

        let replies = h
            .node
            .receive(Payload::text("unread mail from a@example.com"), "user")
            .await;
        assert_eq!(
            replies,
            vec!["One status update from a@example.com.".to_string()]
        );
    }

    #[tokio::test]
    async fn label_listing_groups_system_and_custom() {
        let action = r#"{"action": "list_labels"}"#;
        let h = harness(
            "ceo",
            &[NOT_CALENDAR, r#"{"is_send_email": false}"#, action],
        )
        .await;
        h.mailbox
            .add_label(MailLabel {
                id: "INBOX".to_string(),
                name: "Inbox".to_string(),
                kind: LabelKind::System,
            })
            .await;
        h.mailbox
            .add_label(MailLabel {
                id: "l1".to_string(),
                name: "Launches".to_string(),
                kind: LabelKind::User,
            })
            .await;

        let replies = h.node.receive(Payload::text("list my labels"), "user").await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("System Labels:\n  - Inbox"));
        assert!(replies[0].contains("Custom Labels:\n  - Launches"));
    }
}
