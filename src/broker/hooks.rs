use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::broker::message::Message;

/// Identity of the client that published a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub id: String,
    /// `None` for anonymous clients.
    pub username: Option<String>,
    pub address: Option<IpAddr>,
}

/// A publish on its way through the broker, before fan-out.
///
/// Hooks may rewrite `payload`; topic and client identity are routing
/// metadata and stay as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub topic: String,
    pub payload: Vec<u8>,
    pub client: ClientInfo,
}

impl MessageEvent {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>, client: ClientInfo) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            client,
        }
    }

    /// Turns the event into the broker message that gets fanned out.
    pub fn into_message(self, timestamp: i64) -> Message {
        Message::from_bytes(self.topic, self.payload, timestamp)
    }
}

/// What a hook tells the broker to do with the publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    /// Deliver normally (possibly with a rewritten payload).
    Continue,
    /// Drop the publish.
    Suppress,
}

pub type HookId = u64;

/// Callback invoked for every publish before it reaches subscribers.
#[async_trait]
pub trait MessageHook: fmt::Debug + Send + Sync {
    async fn on_message(&self, event: &mut MessageEvent) -> HookStatus;
}

/// Runs `hooks` in registration order. The first `Suppress` stops the chain.
pub async fn run_message_hooks(
    hooks: &[Arc<dyn MessageHook>],
    event: &mut MessageEvent,
) -> HookStatus {
    for hook in hooks {
        if hook.on_message(event).await == HookStatus::Suppress {
            return HookStatus::Suppress;
        }
    }
    HookStatus::Continue
}
