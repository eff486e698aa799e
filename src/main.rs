//! intercom - demo front end.
//!
//! Registers the four role nodes on one bus and drives them from stdin
//! with `node: message` lines.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intercom::collab::{InMemoryCalendar, InMemoryMailbox};
use intercom::net::USER_SENDER;
use intercom::node::ROLES;
use intercom::reasoning::OpenAiClient;
use intercom::{Config, Intercom, Node, Payload, ReasoningGateway, Receiver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intercom=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(model = %config.model, base_url = %config.base_url, "configuration loaded");

    let client = Arc::new(OpenAiClient::new(
        config.api_key.clone(),
        config.base_url.clone(),
    ));
    let gateway = Arc::new(ReasoningGateway::new(client, &config));
    let bus = Arc::new(Intercom::new());
    let calendar = Arc::new(InMemoryCalendar::new());
    let mailbox = Arc::new(InMemoryMailbox::new());

    let mut nodes: HashMap<String, Arc<Node>> = HashMap::new();
    for role in ROLES {
        let node = Arc::new(Node::new(
            role,
            bus.clone(),
            gateway.clone(),
            calendar.clone(),
            mailbox.clone(),
            config.plans_dir.clone(),
        ));
        bus.register(role, node.clone()).await;
        nodes.insert(role.to_string(), node);
    }

    println!("Nodes online: {}.", ROLES.join(", "));
    println!("Talk to a node with 'node: message'. 'quit' exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let Some((target, message)) = line.split_once(':') else {
            println!("Use 'node: message' (nodes: {}).", ROLES.join(", "));
            continue;
        };
        let target = target.trim().to_lowercase();
        let message = message.trim();
        if message.is_empty() {
            continue;
        }

        let Some(node) = nodes.get(&target) else {
            println!("No node named '{target}'. Nodes: {}.", ROLES.join(", "));
            continue;
        };
        for reply in node.receive(Payload::text(message), USER_SENDER).await {
            println!("[{target}] {reply}");
        }
    }

    info!("shutting down");
    Ok(())
}
