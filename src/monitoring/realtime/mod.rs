//! Realtime health channel
//!
//! Subscribers join rooms and receive compact health events pushed by the
//! background monitor.

mod broadcaster;
mod payload;


pub use broadcaster::{RealtimeBroadcaster, Subscription};
pub use payload::{
    CompactChange, CompactService, CompactSnapshot, CompactSystem, Heartbeat, Pong,
    RealtimeEvent, ServiceUpdate,
};

use serde::Deserialize;

/// Message sent by a realtime client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Join a room (the default one when omitted)
    Subscribe {
        #[serde(default)]
        room: Option<String>,
    },
    /// Leave the current room
    Unsubscribe,
    /// Liveness probe, answered with `pong`
    Ping,
}

impl ClientMessage {
    /// Parse a text frame
    pub fn parse(text: &str) -> crate::utils::error::Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            crate::utils::error::HealthcastError::websocket(format!("Invalid client message: {}", e))
        })
    }
}
