use serde::Deserialize;

/// Messages a websocket client can send, tagged by `type`.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Identifies the client; the username is passed to message hooks.
    #[serde(rename = "connect")]
    Connect {
        #[serde(default)]
        username: Option<String>,
    },

    #[serde(rename = "subscribe")]
    Subscribe { topic: String },

    #[serde(rename = "unsubscribe")]
    Unsubscribe { topic: String },

    #[serde(rename = "publish")]
    Publish {
        topic: String,
        payload: String,
        /// Seconds since the epoch; the broker stamps the message when absent.
        #[serde(default)]
        timestamp: Option<i64>,
    },
}
