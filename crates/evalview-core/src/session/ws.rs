//! WebSocket implementation of [`TerminalChannel`].
//!
//! Terminal bytes travel as binary frames in both directions. Control traffic
//! (session assignment, resize) uses JSON text frames tagged by `event`. The
//! server may also send output as a `terminal_output` text frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use super::channel::{ChannelError, ChannelEvent, OutboundEvent, SessionId, TerminalChannel};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ServerFrame {
    Connect { sid: String },
    TerminalOutput { data: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ClientFrame {
    TerminalResize { rows: u16, cols: u16 },
}

/// Decoded meaning of one inbound frame.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Connect(SessionId),
    Output(Vec<u8>),
    Close,
    Ignored,
}

fn encode_outbound(event: &OutboundEvent) -> Result<Message, ChannelError> {
    match event {
        OutboundEvent::TerminalInput { data } => Ok(Message::binary(data.clone())),
        OutboundEvent::TerminalResize { rows, cols } => {
            let frame = ClientFrame::TerminalResize {
                rows: *rows,
                cols: *cols,
            };
            let text =
                serde_json::to_string(&frame).map_err(|e| ChannelError::Protocol(e.to_string()))?;
            Ok(Message::text(text))
        }
    }
}

fn decode_inbound(message: Message) -> Inbound {
    match message {
        Message::Binary(data) => Inbound::Output(data.to_vec()),
        Message::Text(text) => match serde_json::from_str::<ServerFrame>(text.as_str()) {
            Ok(ServerFrame::Connect { sid }) => Inbound::Connect(SessionId::new(sid)),
            Ok(ServerFrame::TerminalOutput { data }) => Inbound::Output(data.into_bytes()),
            Err(err) => {
                debug!(error = %err, "ignoring unrecognised text frame");
                Inbound::Ignored
            }
        },
        Message::Close(_) => Inbound::Close,
        _ => Inbound::Ignored,
    }
}

/// Duplex terminal channel over a single WebSocket connection.
///
/// The channel counts as connected only after the server has assigned a
/// session id. Dropping the handle closes the socket.
pub struct WsChannel {
    outbound: mpsc::UnboundedSender<OutboundEvent>,
    connected: Arc<AtomicBool>,
}

impl WsChannel {
    /// Open the socket and start the reader and writer tasks.
    ///
    /// Returns the send handle plus the stream of inbound [`ChannelEvent`]s,
    /// which ends after a single `Disconnected`.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<ChannelEvent>), ChannelError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ChannelError::ConnectFailed(format!("{url}: {e}")))?;
        let (mut sink, mut source) = stream.split();

        let connected = Arc::new(AtomicBool::new(false));
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<OutboundEvent>();

        tokio::spawn(async move {
            while let Some(event) = outbound_rx.recv().await {
                let message = match encode_outbound(&event) {
                    Ok(m) => m,
                    Err(err) => {
                        warn!(error = %err, "failed to encode outbound frame");
                        continue;
                    }
                };
                if let Err(err) = sink.send(message).await {
                    warn!(error = %err, "terminal channel write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let connected_ref = Arc::clone(&connected);
        tokio::spawn(async move {
            let mut reason = None;
            while let Some(frame) = source.next().await {
                let message = match frame {
                    Ok(m) => m,
                    Err(err) => {
                        reason = Some(err.to_string());
                        break;
                    }
                };
                let event = match decode_inbound(message) {
                    Inbound::Connect(session_id) => {
                        connected_ref.store(true, Ordering::Release);
                        ChannelEvent::Connected { session_id }
                    }
                    Inbound::Output(data) => ChannelEvent::Output(data),
                    Inbound::Close => break,
                    Inbound::Ignored => continue,
                };
                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
            connected_ref.store(false, Ordering::Release);
            let _ = event_tx.send(ChannelEvent::Disconnected { reason }).await;
        });

        Ok((
            Self {
                outbound: outbound_tx,
                connected,
            },
            event_rx,
        ))
    }
}

impl TerminalChannel for WsChannel {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn send(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        self.outbound.send(event).map_err(|_| ChannelError::Closed)
    }
}
