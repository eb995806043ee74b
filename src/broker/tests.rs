use super::Broker;
use super::hooks::{ClientInfo, HookStatus, MessageEvent, MessageHook, run_message_hooks};
use super::message::{Message, PayloadEncoding};
use super::topic::Topic;
use crate::client::Client;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

#[derive(Debug)]
struct Fixed {
    status: HookStatus,
    rewrite: Option<&'static [u8]>,
    seen: AtomicUsize,
}

impl Fixed {
    fn new(status: HookStatus, rewrite: Option<&'static [u8]>) -> Arc<Self> {
        Arc::new(Self {
            status,
            rewrite,
            seen: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl MessageHook for Fixed {
    async fn on_message(&self, event: &mut MessageEvent) -> HookStatus {
        self.seen.fetch_add(1, Ordering::SeqCst);
        if let Some(payload) = self.rewrite {
            event.payload = payload.to_vec();
        }
        self.status
    }
}

fn message(topic: &str, payload: &str) -> Message {
    Message {
        topic: topic.to_string(),
        payload: payload.to_string(),
        timestamp: 0,
        encoding: None,
    }
}

#[test]
fn test_topic_new() {
    let topic = Topic::new("test_topic");
    assert_eq!(topic.name, "test_topic");
    assert!(topic.subscribers.is_empty());
}

#[test]
fn test_topic_subscribe_and_unsubscribe() {
    let mut topic = Topic::new("test_topic");
    topic.subscribe("client1".to_string());
    assert!(topic.subscribers.contains("client1"));
    topic.unsubscribe(&"client1".to_string());
    assert!(!topic.subscribers.contains("client1"));
}

#[test]
fn test_broker_register_and_remove_client() {
    let mut broker = Broker::default();
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let client_id = client.id.clone();

    broker.register_client(client);
    assert!(broker.client(&client_id).is_some());

    broker.remove_client(&client_id);
    assert!(broker.client(&client_id).is_none());
}

#[test]
fn test_broker_set_username() {
    let mut broker = Broker::default();
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let client_id = client.id.clone();
    broker.register_client(client);

    assert!(broker.set_username(&client_id, Some("bob".to_string())));
    assert_eq!(
        broker.client(&client_id).unwrap().username.as_deref(),
        Some("bob")
    );
    assert!(!broker.set_username(&"ghost".to_string(), None));
}

#[test]
fn test_broker_subscribe_and_unsubscribe() {
    let mut broker = Broker::default();
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let client_id = client.id.clone();
    broker.register_client(client);

    broker.subscribe("test_topic", client_id.clone());
    assert!(broker.topic("test_topic").unwrap().subscribers.contains(&client_id));

    broker.unsubscribe("test_topic", &client_id);
    assert!(!broker.topic("test_topic").unwrap().subscribers.contains(&client_id));
}

#[test]
fn test_broker_publish() {
    let mut broker = Broker::default();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let client_id = client.id.clone();
    broker.register_client(client);
    broker.subscribe("test_topic", client_id);

    assert_eq!(broker.publish(message("test_topic", "hello")), 1);

    match rx.try_recv().unwrap() {
        WsMessage::Text(text) => {
            let received: Message = serde_json::from_str(&text).unwrap();
            assert_eq!(received, message("test_topic", "hello"));
        }
        other => panic!("Expected a text message, got {other:?}"),
    }
}

#[test]
fn test_broker_cleanup_client() {
    let mut broker = Broker::default();
    let (tx, _) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let client_id = client.id.clone();
    broker.register_client(client);
    broker.subscribe("test_topic", client_id.clone());

    broker.cleanup_client(&client_id);
    assert!(broker.client(&client_id).is_none());
    assert!(!broker.topic("test_topic").unwrap().subscribers.contains(&client_id));
}

#[test]
fn test_publish_to_nonexistent_topic() {
    let broker = Broker::default();
    assert_eq!(broker.publish(message("nonexistent_topic", "hello")), 0);
}

#[test]
fn test_publish_to_client_with_closed_channel() {
    let mut broker = Broker::default();
    let (tx, rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx);
    let client_id = client.id.clone();
    broker.register_client(client);
    broker.subscribe("test_topic", client_id);

    // Drop the receiver to close the channel
    drop(rx);

    assert_eq!(broker.publish(message("test_topic", "hello")), 0);
}

#[test]
fn test_register_and_unregister_hooks() {
    let mut broker = Broker::default();
    let first = broker.register_hook(Fixed::new(HookStatus::Continue, None));
    let second = broker.register_hook(Fixed::new(HookStatus::Continue, None));
    assert_ne!(first, second);
    assert_eq!(broker.message_hooks().len(), 2);

    assert!(broker.unregister_hook(first));
    assert!(!broker.unregister_hook(first));
    assert_eq!(broker.message_hooks().len(), 1);
}

#[test]
fn test_supported_hook_versions_include_current() {
    assert!(Broker::supported_hook_versions().contains(&5));
}

#[tokio::test]
async fn test_hooks_run_in_order_and_stop_at_suppress() {
    let rewrite = Fixed::new(HookStatus::Continue, Some(&b"rewritten"[..]));
    let suppress = Fixed::new(HookStatus::Suppress, None);
    let never = Fixed::new(HookStatus::Continue, Some(&b"too late"[..]));
    let hooks: Vec<Arc<dyn MessageHook>> = vec![rewrite.clone(), suppress.clone(), never.clone()];

    let mut event = MessageEvent::new("t", b"original".to_vec(), ClientInfo::default());
    assert_eq!(run_message_hooks(&hooks, &mut event).await, HookStatus::Suppress);

    assert_eq!(event.payload, b"rewritten");
    assert_eq!(rewrite.seen.load(Ordering::SeqCst), 1);
    assert_eq!(suppress.seen.load(Ordering::SeqCst), 1);
    assert_eq!(never.seen.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_hooks_means_continue() {
    let mut event = MessageEvent::new("t", b"p".to_vec(), ClientInfo::default());
    assert_eq!(run_message_hooks(&[], &mut event).await, HookStatus::Continue);
    assert_eq!(event.payload, b"p");
}

#[test]
fn test_event_into_message_keeps_topic() {
    let event = MessageEvent::new("news", b"clean".to_vec(), ClientInfo::default());
    assert_eq!(event.into_message(7), Message {
        topic: "news".to_string(),
        payload: "clean".to_string(),
        timestamp: 7,
        encoding: None,
    });
}

#[test]
fn test_binary_payload_survives_delivery() {
    let event = MessageEvent::new("raw", vec![0xff, 0x00, 0xfe], ClientInfo::default());
    let message = event.into_message(3);
    assert_eq!(message.encoding, Some(PayloadEncoding::Base64));
    assert_eq!(message.payload, "/wD+");
    assert_eq!(message.payload_bytes().unwrap(), vec![0xff, 0x00, 0xfe]);

    let json = serde_json::to_value(&message).unwrap();
    assert_eq!(json["encoding"], "base64");
    let text = serde_json::to_value(Message::from_bytes("t", b"hi".to_vec(), 0)).unwrap();
    assert!(text.get("encoding").is_none());
}
