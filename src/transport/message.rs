use serde::{Deserialize, Serialize};

/// Control messages the client sends to the broker.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "subscribe")]
    Subscribe { topic: String },

    #[serde(rename = "unsubscribe")]
    Unsubscribe { topic: String },
}

/// A push notification delivered by the broker.
///
/// `payload` is a JSON-encoded webhook-style document; it is decoded before
/// handlers see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    pub topic: String,
    pub payload: String,
    pub timestamp: i64,
}
