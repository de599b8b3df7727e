//! Error types for the fitscan runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the measurement service.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to establish a connection with the service.
	#[error("Failed to connect to {url}: {reason}")]
	ConnectionFailed { url: String, reason: String },

	/// A send was attempted while the connection was not open.
	#[error("WebSocket not connected")]
	NotConnected,

	/// Transport-level error on an established connection.
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Channel closed unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,
}

impl Error {
	/// Returns true if this error means no connection was available.
	pub fn is_not_connected(&self) -> bool {
		matches!(self, Error::NotConnected | Error::ChannelClosed)
	}
}
