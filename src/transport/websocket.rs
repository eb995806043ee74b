use futures_util::{SinkExt, StreamExt};
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::hooks::{ClientInfo, HookStatus, MessageEvent, run_message_hooks};
use crate::broker::Broker;
use crate::broker::topic::SubscriberId;
use crate::client::Client;
use crate::transport::message::ClientMessage;

/// Binds `addr` and serves websocket clients until the listener fails.
pub async fn start_websocket_server(addr: &str, broker: Arc<Mutex<Broker>>) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "WebSocket server listening");
    serve(listener, broker).await
}

/// Accepts connections on an already bound listener.
pub async fn serve(listener: TcpListener, broker: Arc<Mutex<Broker>>) -> io::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                spawn(handle_connection(stream, peer, broker.clone()));
            }
            Err(e) => warn!(error = %e, "accept failed"),
        }
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, broker: Arc<Mutex<Broker>>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "WebSocket handshake error");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Create channel for this client
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let client = Client::new(tx).with_address(peer.ip());
    let client_id = client.id.clone();

    // Register client before doing anything else
    lock(&broker).register_client(client);
    info!(client = %client_id, %peer, "client connected");

    // Forward messages from broker → client
    let client_id_clone = client_id.clone();
    spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = ws_sender.send(msg).await {
                warn!(client = %client_id_clone, error = %e, "failed to send message");
                break;
            }
        }
        debug!(client = %client_id_clone, "send loop closed");
    });

    // Handle incoming messages from client
    while let Some(Ok(msg)) = ws_receiver.next().await {
        if !msg.is_text() {
            continue;
        }
        if let Ok(text) = msg.to_text() {
            handle_client_message(&broker, &client_id, text).await;
        }
    }

    info!(client = %client_id, "client disconnected");
    lock(&broker).cleanup_client(&client_id);
}

/// Applies one client message to the broker.
///
/// Publishes are run through the broker's message hooks first; the broker
/// lock is released while the hooks run.
pub async fn handle_client_message(
    broker: &Arc<Mutex<Broker>>,
    client_id: &SubscriberId,
    text: &str,
) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Connect { username }) => {
            debug!(client = %client_id, username = ?username, "client identified");
            lock(broker).set_username(client_id, username);
        }

        Ok(ClientMessage::Subscribe { topic }) => {
            lock(broker).subscribe(&topic, client_id.clone());
            debug!(client = %client_id, %topic, "subscribed");
        }

        Ok(ClientMessage::Unsubscribe { topic }) => {
            lock(broker).unsubscribe(&topic, client_id);
            debug!(client = %client_id, %topic, "unsubscribed");
        }

        Ok(ClientMessage::Publish {
            topic,
            payload,
            timestamp,
        }) => {
            publish(broker, client_id, topic, payload, timestamp).await;
        }

        Err(err) => {
            warn!(client = %client_id, error = %err, "invalid client message");
        }
    }
}

async fn publish(
    broker: &Arc<Mutex<Broker>>,
    client_id: &SubscriberId,
    topic: String,
    payload: String,
    timestamp: Option<i64>,
) -> HookStatus {
    let (hooks, client) = {
        let broker = lock(broker);
        let client = broker
            .client(client_id)
            .map(Client::info)
            .unwrap_or_else(|| ClientInfo {
                id: client_id.clone(),
                ..ClientInfo::default()
            });
        (broker.message_hooks(), client)
    };

    let mut event = MessageEvent::new(topic, payload.into_bytes(), client);
    let status = run_message_hooks(&hooks, &mut event).await;

    match status {
        HookStatus::Suppress => {
            info!(client = %client_id, topic = %event.topic, "publish suppressed");
        }
        HookStatus::Continue => {
            let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp());
            let topic = event.topic.clone();
            let delivered = lock(broker).publish(event.into_message(timestamp));
            debug!(client = %client_id, %topic, delivered, "published");
        }
    }
    status
}

fn lock(broker: &Mutex<Broker>) -> MutexGuard<'_, Broker> {
    broker.lock().unwrap_or_else(PoisonError::into_inner)
}
