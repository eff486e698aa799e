//! # Intercom
//!
//! In-process message bus and task coordination for a small network of
//! role-playing LLM agents (ceo, marketing, engineering, design).
//!
//! ```text
//!   front end (CLI / HTTP, out of tree)
//!        │  Payload::Text
//!        ▼
//!   ┌─────────┐   register/send/add_task   ┌──────────┐
//!   │  Node   │◄──────────────────────────►│ Intercom │
//!   └────┬────┘                            └──────────┘
//!        │ dispatch: quick command → active dialog →
//!        │ intent extraction → action handler → chat fallback
//!        ▼
//!   collaborators: reasoning service, calendar, mail
//! ```
//!
//! ## Modules
//! - `net`: the `Intercom` bus, `Task`, and the `Receiver` capability
//! - `reasoning`: chat types, the reasoning-service client, and the gateway
//! - `intent`: stateless extractors turning free text into typed intents
//! - `dialog`: multi-turn field-collection state machines (meetings, email)
//! - `node`: the addressable agent and its action handlers
//! - `collab`: calendar and mail collaborator seams + in-memory variants

pub mod collab;
pub mod config;
pub mod dialog;
pub mod intent;
pub mod net;
pub mod node;
pub mod reasoning;

pub use config::Config;
pub use net::{DeliveryStatus, Intercom, Payload, Priority, Receiver, Task};
pub use node::Node;
pub use reasoning::ReasoningGateway;
