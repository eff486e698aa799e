//! Mail provider trait and the in-memory mailbox.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

/// An email ready to go out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// A stored inbox message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailMessage {
    pub id: String,
    pub sender: String,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub snippet: String,
    pub body: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    System,
    User,
}

#[derive(Debug, Clone)]
pub struct MailLabel {
    pub id: String,
    pub name: String,
    pub kind: LabelKind,
}

#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Message ids matching the query, newest first. An empty query
    /// matches everything.
    async fn list_messages(&self, query: &str, limit: usize) -> Result<Vec<String>>;
    async fn get_message(&self, id: &str) -> Result<MailMessage>;
    /// Returns the id of the sent message.
    async fn send(&self, email: OutgoingEmail) -> Result<String>;
    async fn list_labels(&self) -> Result<Vec<MailLabel>>;
}

/// Process-local mailbox. Query matching is naive substring search over
/// sender, subject and body; `key:value` operators are matched on their
/// value part.
#[derive(Default)]
pub struct InMemoryMailbox {
    inbox: Mutex<Vec<MailMessage>>,
    sent: Mutex<Vec<OutgoingEmail>>,
    labels: Mutex<Vec<MailLabel>>,
    unavailable: AtomicBool,
}

impl InMemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("mail service not available");
        }
        Ok(())
    }

    pub async fn deliver(&self, message: MailMessage) {
        self.inbox.lock().await.push(message);
    }

    pub async fn add_label(&self, label: MailLabel) {
        self.labels.lock().await.push(label);
    }

    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.clone()
    }

    fn matches(message: &MailMessage, query: &str) -> bool {
        let haystack = format!(
            "{} {} {}",
            message.sender, message.subject, message.body
        )
        .to_lowercase();
        query
            .split_whitespace()
            .all(|term| {
                let needle = term.split_once(':').map_or(term, |(_, v)| v);
                haystack.contains(&needle.to_lowercase())
            })
    }
}

#[async_trait]
impl MailProvider for InMemoryMailbox {
    async fn list_messages(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        self.check_available()?;
        let mut matching: Vec<&MailMessage> = Vec::new();
        let inbox = self.inbox.lock().await;
        for message in inbox.iter() {
            if query.trim().is_empty() || Self::matches(message, query) {
                matching.push(message);
            }
        }
        matching.sort_by_key(|m| std::cmp::Reverse(m.date));
        Ok(matching.iter().take(limit).map(|m| m.id.clone()).collect())
    }

    async fn get_message(&self, id: &str) -> Result<MailMessage> {
        self.check_available()?;
        self.inbox
            .lock()
            .await
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("message not found: {id}"))
    }

    async fn send(&self, email: OutgoingEmail) -> Result<String> {
        self.check_available()?;
        self.sent.lock().await.push(email);
        Ok(Uuid::new_v4().to_string())
    }

    async fn list_labels(&self) -> Result<Vec<MailLabel>> {
        self.check_available()?;
        Ok(self.labels.lock().await.clone())
    }
}
