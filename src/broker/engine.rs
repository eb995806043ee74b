use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::broker::hooks::{HookId, MessageHook};
use crate::broker::message::Message;
use crate::broker::topic::{SubscriberId, Topic};
use crate::client::Client;
use tungstenite::protocol::Message as WsMessage;

/// Hook API versions this broker can host.
const HOOK_API_VERSIONS: &[i32] = &[4, 5];

/// Represents the broker that manages topics and clients
/// It allows clients to subscribe to topics, publish messages, and manage client connections
/// Publishes pass through the registered message hooks before they are fanned out
#[derive(Debug, Default)]
pub struct Broker {
    topics: HashMap<String, Topic>,
    clients: HashMap<SubscriberId, Client>,
    hooks: Vec<(HookId, Arc<dyn MessageHook>)>,
    next_hook_id: HookId,
}

impl Broker {
    /// Creates a new instance of the Broker
    /// Initializes an empty set of topics, clients and hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new client with the broker
    pub fn register_client(&mut self, client: Client) {
        self.clients.insert(client.id.clone(), client);
    }

    /// Removes a client from the broker
    pub fn remove_client(&mut self, client_id: &SubscriberId) {
        self.clients.remove(client_id);
    }

    pub fn client(&self, client_id: &SubscriberId) -> Option<&Client> {
        self.clients.get(client_id)
    }

    /// Records the username a client identified with.
    pub fn set_username(&mut self, client_id: &SubscriberId, username: Option<String>) -> bool {
        match self.clients.get_mut(client_id) {
            Some(client) => {
                client.username = username;
                true
            }
            None => false,
        }
    }

    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics.get(name)
    }

    /// Subscribes a client to a topic. Automatically creates the topic if it doesn't exist.
    pub fn subscribe(&mut self, topic: &str, subscriber: SubscriberId) {
        let topic = self
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| Topic::new(topic));
        topic.subscribe(subscriber);
    }

    /// Unsubscribes a client from a topic
    /// If the topic does not exist, it will not perform any action
    pub fn unsubscribe(&mut self, topic: &str, subscriber: &SubscriberId) {
        if let Some(t) = self.topics.get_mut(topic) {
            t.unsubscribe(subscriber);
        }
    }

    /// Hook API versions this broker accepts from plugins.
    pub fn supported_hook_versions() -> &'static [i32] {
        HOOK_API_VERSIONS
    }

    /// Adds a hook that sees every publish before delivery.
    pub fn register_hook(&mut self, hook: Arc<dyn MessageHook>) -> HookId {
        self.next_hook_id += 1;
        let id = self.next_hook_id;
        self.hooks.push((id, hook));
        debug!(hook_id = id, "message hook registered");
        id
    }

    /// Removes a hook. Returns false when `id` is not registered.
    pub fn unregister_hook(&mut self, id: HookId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(hook_id, _)| *hook_id != id);
        self.hooks.len() != before
    }

    /// Snapshot of the registered hooks, in registration order.
    ///
    /// Callers run the hooks on the snapshot so the broker is not locked
    /// while a hook waits on the network.
    pub fn message_hooks(&self) -> Vec<Arc<dyn MessageHook>> {
        self.hooks.iter().map(|(_, hook)| hook.clone()).collect()
    }

    /// Publishes a message to all subscribers of a topic
    /// If the topic does not exist, it will not send the message
    /// The message is serialized to JSON before it is sent
    /// Returns the number of subscribers the message was handed to
    pub fn publish(&self, msg: Message) -> usize {
        let Some(topic) = self.topics.get(&msg.topic) else {
            debug!(topic = %msg.topic, "topic not found");
            return 0;
        };

        let text = match serde_json::to_string(&msg) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize message");
                return 0;
            }
        };
        let ws_msg = WsMessage::text(text);
        let mut delivered = 0;
        for sub_id in &topic.subscribers {
            if let Some(client) = self.clients.get(sub_id) {
                if let Err(e) = client.sender.send(ws_msg.clone()) {
                    warn!(client = %sub_id, error = %e, "failed to send to subscriber");
                } else {
                    delivered += 1;
                }
            } else {
                warn!(client = %sub_id, "no client registered with id");
            }
        }
        delivered
    }

    /// Cleans up a client by removing it and unsubscribing it from all topics
    /// This is useful for when a client disconnects or is no longer active
    pub fn cleanup_client(&mut self, client_id: &SubscriberId) {
        self.remove_client(client_id);

        for (topic, subscribers) in self.topics.iter_mut() {
            subscribers.unsubscribe(client_id);
            debug!(client = %client_id, %topic, "unsubscribed");
        }

        info!(client = %client_id, "cleaned up client");
    }
}
