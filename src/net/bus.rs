//! In-process message bus connecting the role nodes.
//!
//! The bus owns the task list and a journal of every send attempt. Delivery
//! is queue based: a send enqueues the envelope and the outermost call drains
//! the queue, so a node that sends from inside `receive` never re-enters
//! another node's `receive` mid-delivery.

use crate::net::payload::Payload;
use crate::net::task::Task;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Sender id used for bus-originated notifications such as task assignments.
pub const SYSTEM_SENDER: &str = "system";

/// Sender id for messages typed by the operator.
pub const USER_SENDER: &str = "user";

/// Anything that can be registered on the bus and handed messages.
///
/// The returned strings are replies meant for whoever is driving the node
/// (the operator console prints them). Peer-to-peer deliveries usually
/// return an empty vec.
#[async_trait]
pub trait Receiver: Send + Sync {
    async fn receive(&self, message: Payload, sender: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    UnknownRecipient,
}

/// Journal entry for one send attempt, delivered or not.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub sender: String,
    pub recipient: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

struct Envelope {
    sender: String,
    recipient: String,
    payload: Payload,
}

#[derive(Default)]
struct DispatchQueue {
    pending: VecDeque<Envelope>,
    draining: bool,
}

#[derive(Default)]
pub struct Intercom {
    nodes: RwLock<HashMap<String, Arc<dyn Receiver>>>,
    tasks: Mutex<Vec<Task>>,
    journal: Mutex<Vec<MessageRecord>>,
    queue: Mutex<DispatchQueue>,
}

impl Intercom {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, node_id: &str, node: Arc<dyn Receiver>) {
        info!(node_id, "node registered on intercom");
        self.nodes.write().await.insert(node_id.to_string(), node);
    }

    /// Removes a node. Unknown ids are a no-op.
    pub async fn unregister(&self, node_id: &str) {
        if self.nodes.write().await.remove(node_id).is_some() {
            info!(node_id, "node unregistered from intercom");
        }
    }

    pub async fn is_registered(&self, node_id: &str) -> bool {
        self.nodes.read().await.contains_key(node_id)
    }

    pub async fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.nodes.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Routes a payload to a registered node.
    ///
    /// Every attempt is journaled first, including sends to unknown
    /// recipients. Delivery order matches send order even when recipients
    /// send further messages from inside `receive`.
    pub async fn send(&self, sender: &str, recipient: &str, payload: Payload) -> DeliveryStatus {
        self.journal.lock().await.push(MessageRecord {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            content: payload.notice_text().to_string(),
            timestamp: Utc::now(),
        });
        info!(sender, recipient, content = %payload, "intercom send");

        if !self.is_registered(recipient).await {
            warn!(recipient, "message to unknown recipient dropped");
            return DeliveryStatus::UnknownRecipient;
        }

        {
            let mut queue = self.queue.lock().await;
            queue.pending.push_back(Envelope {
                sender: sender.to_string(),
                recipient: recipient.to_string(),
                payload,
            });
            if queue.draining {
                // A delivery higher up the stack owns the drain loop.
                return DeliveryStatus::Delivered;
            }
            queue.draining = true;
        }

        loop {
            let envelope = {
                let mut queue = self.queue.lock().await;
                match queue.pending.pop_front() {
                    Some(envelope) => envelope,
                    None => {
                        queue.draining = false;
                        break;
                    }
                }
            };
            let node = self.nodes.read().await.get(&envelope.recipient).cloned();
            match node {
                Some(node) => {
                    let replies = node.receive(envelope.payload, &envelope.sender).await;
                    for reply in replies {
                        debug!(node_id = %envelope.recipient, %reply, "node reply");
                    }
                }
                None => warn!(
                    recipient = %envelope.recipient,
                    "recipient unregistered before delivery"
                ),
            }
        }

        DeliveryStatus::Delivered
    }

    /// Stores a task and pushes a text notification to the assignee.
    ///
    /// The task is kept even when the assignee is not registered; only the
    /// notification is skipped in that case.
    pub async fn add_task(&self, task: Task) {
        let assignee = task.assigned_to.clone();
        let notification = task.notification_line();
        info!(task_id = %task.id, %assignee, title = %task.title, "task added");
        self.tasks.lock().await.push(task);

        if self.is_registered(&assignee).await {
            self.send(SYSTEM_SENDER, &assignee, Payload::text(notification))
                .await;
        } else {
            warn!(%assignee, "task assignee not registered, skipping notification");
        }
    }

    pub async fn tasks_for(&self, node_id: &str) -> Vec<Task> {
        self.tasks
            .lock()
            .await
            .iter()
            .filter(|task| task.assigned_to == node_id)
            .cloned()
            .collect()
    }

    pub async fn journal(&self) -> Vec<MessageRecord> {
        self.journal.lock().await.clone()
    }
}
