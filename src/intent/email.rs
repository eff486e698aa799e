//! Email intent extraction: send requests and mailbox queries.

use serde::Deserialize;
use std::fmt;
use tracing::warn;

use super::{non_empty, strip_code_fences};
use crate::reasoning::ReasoningGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailField {
    Recipient,
    Subject,
    Body,
}

impl EmailField {
    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "recipient" => Some(EmailField::Recipient),
            "subject" => Some(EmailField::Subject),
            "body" => Some(EmailField::Body),
            _ => None,
        }
    }
}

impl fmt::Display for EmailField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmailField::Recipient => write!(f, "recipient"),
            EmailField::Subject => write!(f, "subject"),
            EmailField::Body => write!(f, "body"),
        }
    }
}

/// Outcome of send-email detection, with whatever draft fields the message
/// already carried.
#[derive(Debug, Clone, Default)]
pub struct SendEmailIntent {
    pub is_send_email: bool,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub missing: Vec<EmailField>,
}

#[derive(Deserialize)]
struct RawSendEmail {
    #[serde(default)]
    is_send_email: bool,
    #[serde(default)]
    recipient: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    missing_info: Vec<String>,
}

/// Detects a request to compose and send an email. Malformed output
/// collapses to "not a send request".
pub async fn detect_send_email_intent(
    gateway: &ReasoningGateway,
    message: &str,
) -> SendEmailIntent {
    let prompt = format!(
        "Analyze this message and determine if it's requesting to send an email:\n\
         \"{message}\"\n\n\
         A message is considered an email sending request if:\n\
         1. It contains phrases like \"send email\", \"write email\", \"send mail\", \
         \"compose email\", \"draft email\", etc.\n\
         2. There's a clear intention to create and send an email to someone\n\n\
         Return JSON with:\n\
         - is_send_email: boolean (true if the message is about sending an email)\n\
         - recipient: string (email address or name of recipient if specified, empty string if not)\n\
         - subject: string (email subject line if specified, empty string if not)\n\
         - body: string (email content if specified, empty string if not)\n\
         - missing_info: array of strings (what information is missing: \
         \"recipient\", \"subject\", \"body\")"
    );

    let response = gateway.extract(&prompt).await;
    if ReasoningGateway::is_failure(&response) {
        return SendEmailIntent::default();
    }

    let raw: RawSendEmail = match serde_json::from_str(strip_code_fences(&response)) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(%err, "malformed send-email intent");
            return SendEmailIntent::default();
        }
    };

    SendEmailIntent {
        is_send_email: raw.is_send_email,
        recipient: non_empty(raw.recipient).unwrap_or_default(),
        subject: non_empty(raw.subject).unwrap_or_default(),
        body: non_empty(raw.body).unwrap_or_default(),
        missing: raw
            .missing_info
            .iter()
            .filter_map(|label| EmailField::from_label(label))
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStyle {
    Concise,
    Detailed,
}

/// Search criteria for a mailbox query, mirroring Gmail-style operators.
#[derive(Debug, Clone, Default)]
pub struct EmailCriteria {
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub keywords: Vec<String>,
    pub has_attachment: bool,
    pub is_unread: bool,
    pub label: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub max_results: usize,
}

impl EmailCriteria {
    pub fn is_empty(&self) -> bool {
        self.from.is_none()
            && self.to.is_none()
            && self.subject.is_none()
            && self.keywords.is_empty()
            && !self.has_attachment
            && !self.is_unread
            && self.label.is_none()
            && self.after.is_none()
            && self.before.is_none()
    }

    /// Builds a Gmail-style query string. Absent criteria are omitted.
    pub fn to_query(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(from) = &self.from {
            parts.push(format!("from:{from}"));
        }
        if let Some(to) = &self.to {
            parts.push(format!("to:{to}"));
        }
        if let Some(subject) = &self.subject {
            parts.push(format!("subject:{subject}"));
        }
        if self.has_attachment {
            parts.push("has:attachment".to_string());
        }
        if let Some(label) = &self.label {
            parts.push(format!("label:{label}"));
        }
        if self.is_unread {
            parts.push("is:unread".to_string());
        }
        if let Some(after) = &self.after {
            parts.push(format!("after:{after}"));
        }
        if let Some(before) = &self.before {
            parts.push(format!("before:{before}"));
        }
        if !self.keywords.is_empty() {
            parts.push(self.keywords.join(" "));
        }
        parts.join(" ")
    }
}

/// A recognized mailbox query. `None` means the message is not about the
/// mailbox at all.
#[derive(Debug, Clone)]
pub enum EmailAction {
    FetchRecent {
        count: usize,
        style: SummaryStyle,
    },
    Search {
        query: String,
        count: usize,
        style: SummaryStyle,
    },
    AdvancedSearch {
        criteria: EmailCriteria,
        style: SummaryStyle,
    },
    ListLabels,
    None,
}

#[derive(Deserialize)]
struct RawEmailAnalysis {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    criteria: RawCriteria,
    #[serde(default)]
    summary_type: Option<String>,
    #[serde(default)]
    count: Option<usize>,
    #[serde(default)]
    query: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawCriteria {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    has_attachment: bool,
    #[serde(default)]
    is_unread: bool,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    before: Option<String>,
    #[serde(default)]
    max_results: Option<usize>,
}

const DEFAULT_FETCH_COUNT: usize = 5;
const DEFAULT_SEARCH_RESULTS: usize = 10;

/// Analyzes a message for mailbox queries (fetch, search, labels).
/// Malformed output collapses to [`EmailAction::None`].
pub async fn analyze_email_command(gateway: &ReasoningGateway, message: &str) -> EmailAction {
    let prompt = format!(
        "Analyze this email-related command in detail:\n\
         '{message}'\n\n\
         Return a JSON object with the following structure:\n\
         {{\n\
             \"action\": \"list_labels\" | \"advanced_search\" | \"fetch_recent\" | \"search\" | \"none\",\n\
             \"criteria\": {{\n\
                 \"from\": \"sender email or name\",\n\
                 \"to\": \"recipient email\",\n\
                 \"subject\": \"subject text\",\n\
                 \"keywords\": [\"word1\", \"word2\"],\n\
                 \"has_attachment\": true/false,\n\
                 \"is_unread\": true/false,\n\
                 \"label\": \"label name\",\n\
                 \"after\": \"YYYY/MM/DD\",\n\
                 \"before\": \"YYYY/MM/DD\",\n\
                 \"max_results\": 10\n\
             }},\n\
             \"count\": 5,\n\
             \"query\": \"free text search\",\n\
             \"summary_type\": \"concise\" | \"detailed\"\n\
         }}\n\n\
         Include only the fields that are explicitly mentioned or clearly implied in the command.\n\
         Convert date references like \"yesterday\", \"last week\", \"2 days ago\" to YYYY/MM/DD format."
    );

    let response = gateway.extract(&prompt).await;
    if ReasoningGateway::is_failure(&response) {
        return EmailAction::None;
    }

    let raw: RawEmailAnalysis = match serde_json::from_str(strip_code_fences(&response)) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(%err, "malformed email command analysis");
            return EmailAction::None;
        }
    };

    let style = match raw.summary_type.as_deref().map(str::trim) {
        Some("detailed") => SummaryStyle::Detailed,
        _ => SummaryStyle::Concise,
    };

    let criteria = EmailCriteria {
        from: non_empty(raw.criteria.from),
        to: non_empty(raw.criteria.to),
        subject: non_empty(raw.criteria.subject),
        keywords: raw
            .criteria
            .keywords
            .into_iter()
            .filter_map(|k| non_empty(Some(k)))
            .collect(),
        has_attachment: raw.criteria.has_attachment,
        is_unread: raw.criteria.is_unread,
        label: non_empty(raw.criteria.label),
        after: non_empty(raw.criteria.after),
        before: non_empty(raw.criteria.before),
        max_results: raw.criteria.max_results.unwrap_or(DEFAULT_SEARCH_RESULTS),
    };

    match raw.action.as_deref().map(str::trim) {
        Some("list_labels") => EmailAction::ListLabels,
        Some("advanced_search") => EmailAction::AdvancedSearch { criteria, style },
        Some("fetch_recent") => EmailAction::FetchRecent {
            count: raw.count.unwrap_or(DEFAULT_FETCH_COUNT),
            style,
        },
        Some("search") => {
            let query = non_empty(raw.query)
                .unwrap_or_else(|| criteria.keywords.join(" "));
            EmailAction::Search {
                query,
                count: raw.count.unwrap_or(DEFAULT_FETCH_COUNT),
                style,
            }
        }
        _ => EmailAction::None,
    }
}
