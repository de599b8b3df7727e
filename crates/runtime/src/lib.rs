//! fitscan runtime - connection lifecycle and transport
//!
//! This crate owns the single duplex connection to the measurement service:
//!
//! - **Transport**: Text frames over WebSocket, or over in-memory channels in tests
//! - **Connection**: Supervision with bounded automatic reconnection, state
//!   tracking, and an ordered event stream for the session engine
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  fitscan (core)  │  Session engine, consumes ConnectionEvent
//! └────────┬─────────┘
//!          │ ConnectionHandle::send_text / events
//! ┌────────▼─────────┐
//! │ fitscan-runtime  │  This crate
//! │  ┌────────────┐  │
//! │  │ Connection │  │  Reconnect supervisor, state watch
//! │  └────────────┘  │
//! │  ┌────────────┐  │
//! │  │ Transport  │  │  WebSocket / channel transport
//! │  └────────────┘  │
//! └──────────────────┘
//! ```

pub mod connection;
pub mod error;
pub mod transport;

pub use connection::{
	ConnectionEvent, ConnectionHandle, ConnectionManager, ConnectionState, MAX_RECONNECT_ATTEMPTS,
	RECONNECT_DELAY, ReconnectPolicy,
};
pub use error::{Error, Result};
pub use transport::{
	ChannelPeer, ChannelTransport, Connector, TransportParts, TransportReceiver, TransportSender,
	WebSocketConnector,
};
