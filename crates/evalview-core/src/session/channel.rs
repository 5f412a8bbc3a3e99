use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque correlation token assigned by the server on connect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live channel connection. Exists only between connect and disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub connected: bool,
}

/// Traffic from the local terminal to the remote shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    TerminalInput { data: Vec<u8> },
    TerminalResize { rows: u16, cols: u16 },
}

/// Lifecycle and output events delivered by a channel implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected { session_id: SessionId },
    Output(Vec<u8>),
    Disconnected { reason: Option<String> },
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to connect terminal channel: {0}")]
    ConnectFailed(String),

    #[error("terminal channel is closed")]
    Closed,

    #[error("malformed channel frame: {0}")]
    Protocol(String),
}

/// Send half of a duplex terminal channel.
///
/// Inbound events are delivered separately (see [`ChannelEvent`]), so an
/// implementation only has to report connectivity and accept outbound events.
/// Implementations must not buffer events for later delivery.
pub trait TerminalChannel: Send {
    fn is_connected(&self) -> bool;

    fn send(&self, event: OutboundEvent) -> Result<(), ChannelError>;
}
