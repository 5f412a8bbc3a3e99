use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::channel::{ChannelEvent, OutboundEvent, Session, SessionId, TerminalChannel};

/// Visible terminal geometry in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub rows: u16,
    pub cols: u16,
}

/// What the rest of the dashboard needs to know after a channel event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeUpdate {
    Connected(Session),
    /// Bytes for the local display buffer, unmodified.
    Output(Vec<u8>),
    Disconnected { reason: Option<String> },
}

/// Maps local terminal events onto a [`TerminalChannel`].
///
/// Outbound traffic is fire-and-forget: while the channel is down every send
/// is dropped without error, and nothing reconnects on its own.
pub struct TerminalBridge {
    channel: Box<dyn TerminalChannel>,
    session: Option<Session>,
    viewport: Viewport,
}

impl TerminalBridge {
    pub fn new(channel: Box<dyn TerminalChannel>, viewport: Viewport) -> Self {
        Self {
            channel,
            session: None,
            viewport,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Session id of the live connection, if any.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session
            .as_ref()
            .filter(|s| s.connected)
            .map(|s| &s.id)
    }

    pub fn is_connected(&self) -> bool {
        self.session_id().is_some() && self.channel.is_connected()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Forward raw keystroke bytes as-is.
    pub fn keystroke(&self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.send(OutboundEvent::TerminalInput {
            data: data.to_vec(),
        });
    }

    /// Record the new geometry and tell the remote pty about it.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.send(OutboundEvent::TerminalResize {
            rows: viewport.rows,
            cols: viewport.cols,
        });
    }

    pub fn handle_event(&mut self, event: ChannelEvent) -> BridgeUpdate {
        match event {
            ChannelEvent::Connected { session_id } => {
                info!(session_id = %session_id, "terminal channel connected");
                let session = Session {
                    id: session_id,
                    connected: true,
                };
                self.session = Some(session.clone());
                // Geometry goes first so remote output wraps correctly from byte one.
                self.send(OutboundEvent::TerminalResize {
                    rows: self.viewport.rows,
                    cols: self.viewport.cols,
                });
                BridgeUpdate::Connected(session)
            }
            ChannelEvent::Output(data) => BridgeUpdate::Output(data),
            ChannelEvent::Disconnected { reason } => {
                info!(
                    reason = reason.as_deref().unwrap_or("closed"),
                    "terminal channel disconnected"
                );
                self.session = None;
                BridgeUpdate::Disconnected { reason }
            }
        }
    }

    fn send(&self, event: OutboundEvent) {
        if !self.channel.is_connected() {
            debug!(?event, "channel down, dropping outbound event");
            return;
        }
        if let Err(err) = self.channel.send(event) {
            warn!(error = %err, "outbound terminal event dropped");
        }
    }
}
