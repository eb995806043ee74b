use std::net::IpAddr;

use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;

use crate::broker::hooks::ClientInfo;

/// Represents a connected WebSocket client in the Pub/Sub system.
///
/// Each client is uniquely identified by an `id` and has a channel (`sender`)
/// for sending messages to the client over WebSocket.
#[derive(Debug)]
pub struct Client {
    /// Broker-assigned identifier (`client-<uuid>`).
    pub id: String,

    /// Set once the client sends a `connect` message with a username.
    pub username: Option<String>,

    /// Peer address of the websocket connection.
    pub address: Option<IpAddr>,

    /// Channel to send WebSocket messages to the client.
    pub sender: UnboundedSender<WsMessage>,
}

impl Client {
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: format!("client-{}", uuid::Uuid::new_v4()),
            username: None,
            address: None,
            sender,
        }
    }

    pub fn with_address(mut self, address: IpAddr) -> Self {
        self.address = Some(address);
        self
    }

    /// Identity handed to message hooks.
    pub fn info(&self) -> ClientInfo {
        ClientInfo {
            id: self.id.clone(),
            username: self.username.clone(),
            address: self.address,
        }
    }
}
