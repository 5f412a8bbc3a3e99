//! Terminal Session Bridge: keystrokes, output and resizes over a duplex
//! channel keyed by a server-assigned session id.

mod bridge;
mod channel;
pub mod ws;

pub use bridge::{BridgeUpdate, TerminalBridge, Viewport};
pub use channel::{ChannelError, ChannelEvent, OutboundEvent, Session, SessionId, TerminalChannel};
pub use ws::WsChannel;
