//! Shared fixtures for node tests.

use std::sync::Arc;

use super::Node;
use crate::collab::{InMemoryCalendar, InMemoryMailbox};
use crate::config::Config;
use crate::net::Intercom;
use crate::reasoning::scripted::ScriptedClient;
use crate::reasoning::ReasoningGateway;

pub(crate) struct Harness {
    pub bus: Arc<Intercom>,
    pub calendar: Arc<InMemoryCalendar>,
    pub mailbox: Arc<InMemoryMailbox>,
    pub client: Arc<ScriptedClient>,
    pub node: Arc<Node>,
}

impl Harness {
    /// Registers a second node backed by the same bus and providers,
    /// with its own empty script.
    pub(crate) async fn add_peer(&self, node_id: &str) -> Arc<Node> {
        let gateway = Arc::new(ReasoningGateway::new(
            ScriptedClient::with_responses(std::iter::empty::<String>()),
            &Config::new("k", "m"),
        ));
        let peer = Arc::new(Node::new(
            node_id,
            self.bus.clone(),
            gateway,
            self.calendar.clone(),
            self.mailbox.clone(),
            std::env::temp_dir(),
        ));
        self.bus.register(node_id, peer.clone()).await;
        peer
    }
}

/// Builds a registered node with scripted reasoning responses.
pub(crate) async fn harness(node_id: &str, responses: &[&str]) -> Harness {
    let bus = Arc::new(Intercom::new());
    let calendar = Arc::new(InMemoryCalendar::new());
    let mailbox = Arc::new(InMemoryMailbox::new());
    let client = ScriptedClient::with_responses(responses.iter().copied());
    let gateway = Arc::new(ReasoningGateway::new(client.clone(), &Config::new("k", "m")));
    let node = Arc::new(Node::new(
        node_id,
        bus.clone(),
        gateway,
        calendar.clone(),
        mailbox.clone(),
        std::env::temp_dir(),
    ));
    bus.register(node_id, node.clone()).await;
    Harness {
        bus,
        calendar,
        mailbox,
        client,
        node,
    }
}

pub(crate) const NOT_CALENDAR: &str = r#"{"is_calendar_command": false}"#;
pub(crate) const NOT_SEND_EMAIL: &str = r#"{"is_send_email": false}"#;
pub(crate) const NOT_EMAIL_QUERY: &str = r#"{"action": "none"}"#;
