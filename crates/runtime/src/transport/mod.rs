//! Transport layer for the measurement service connection.
//!
//! A transport moves opaque text frames in both directions. It is split into a
//! [`TransportSender`] and a [`TransportReceiver`] so the connection
//! supervisor can write frames while it waits on inbound traffic.
//!
//! Two implementations:
//!
//! - [`WebSocketConnector`] - `ws://` / `wss://` via tokio-tungstenite
//! - [`ChannelTransport`] - in-memory pair for tests and offline replays
//!
//! The [`Connector`] trait is the seam the connection supervisor dials through,
//! which is what lets reconnect behaviour be tested without a network.


use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::{Error, Result};

/// Boxed future used across the transport traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outbound half of a transport.
pub trait TransportSender: Send {
	/// Sends one text frame.
	fn send(&mut self, text: String) -> BoxFuture<'_, Result<()>>;

	/// Starts a clean close of the underlying connection.
	fn close(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Inbound half of a transport.
pub trait TransportReceiver: Send {
	/// Waits for the next text frame.
	///
	/// Returns `None` once the peer has closed the connection.
	fn recv(&mut self) -> BoxFuture<'_, Option<Result<String>>>;
}

/// Both halves of one established connection.
pub struct TransportParts {
	pub sender: Box<dyn TransportSender>,
	pub receiver: Box<dyn TransportReceiver>,
}

impl std::fmt::Debug for TransportParts {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TransportParts").finish_non_exhaustive()
	}
}

/// Opens connections to an endpoint.
pub trait Connector: Send + Sync {
	fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<TransportParts>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dials `ws://` and `wss://` endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
	fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<TransportParts>> {
		Box::pin(async move {
			tracing::debug!(url, "Opening WebSocket");
			let (stream, response) = tokio_tungstenite::connect_async(url).await.map_err(|e| {
				Error::ConnectionFailed {
					url: url.to_string(),
					reason: e.to_string(),
				}
			})?;
			tracing::debug!(url, status = %response.status(), "WebSocket handshake complete");

			let (sink, stream) = stream.split();
			Ok(TransportParts {
				sender: Box::new(WebSocketSender { sink }),
				receiver: Box::new(WebSocketReceiver { stream }),
			})
		})
	}
}

struct WebSocketSender {
	sink: SplitSink<WsStream, Message>,
}

impl TransportSender for WebSocketSender {
	fn send(&mut self, text: String) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			self.sink
				.send(Message::Text(text))
				.await
				.map_err(|e| Error::TransportError(e.to_string()))
		})
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			self.sink
				.close()
				.await
				.map_err(|e| Error::TransportError(e.to_string()))
		})
	}
}

struct WebSocketReceiver {
	stream: SplitStream<WsStream>,
}

impl TransportReceiver for WebSocketReceiver {
	fn recv(&mut self) -> BoxFuture<'_, Option<Result<String>>> {
		Box::pin(async move {
			loop {
				match self.stream.next().await? {
					Ok(Message::Text(text)) => return Some(Ok(text)),
					Ok(Message::Binary(data)) => match String::from_utf8(data) {
						Ok(text) => return Some(Ok(text)),
						Err(e) => {
							tracing::warn!("Dropping non UTF-8 binary frame: {}", e);
						}
					},
					Ok(Message::Close(frame)) => {
						tracing::debug!(?frame, "Peer closed WebSocket");
						return None;
					}
					Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
					Err(e) => return Some(Err(Error::TransportError(e.to_string()))),
				}
			}
		})
	}
}

/// In-memory transport backed by unbounded channels.
///
/// [`ChannelTransport::pair`] returns the client-side [`TransportParts`] and a
/// [`ChannelPeer`] playing the service. Dropping or closing the peer ends the
/// client's receive stream, which the supervisor sees as a peer close.
pub struct ChannelTransport;

impl ChannelTransport {
	pub fn pair() -> (TransportParts, ChannelPeer) {
		let (to_peer_tx, to_peer_rx) = mpsc::unbounded_channel();
		let (to_client_tx, to_client_rx) = mpsc::unbounded_channel();

		let parts = TransportParts {
			sender: Box::new(ChannelSender {
				tx: Some(to_peer_tx),
			}),
			receiver: Box::new(ChannelReceiver { rx: to_client_rx }),
		};
		let peer = ChannelPeer {
			tx: Some(to_client_tx),
			rx: to_peer_rx,
		};
		(parts, peer)
	}
}

struct ChannelSender {
	tx: Option<mpsc::UnboundedSender<String>>,
}

impl TransportSender for ChannelSender {
	fn send(&mut self, text: String) -> BoxFuture<'_, Result<()>> {
		let result = match &self.tx {
			Some(tx) => tx.send(text).map_err(|_| Error::ChannelClosed),
			None => Err(Error::ChannelClosed),
		};
		Box::pin(async move { result })
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		self.tx = None;
		Box::pin(async { Ok(()) })
	}
}

struct ChannelReceiver {
	rx: mpsc::UnboundedReceiver<String>,
}

impl TransportReceiver for ChannelReceiver {
	fn recv(&mut self) -> BoxFuture<'_, Option<Result<String>>> {
		Box::pin(async move { self.rx.recv().await.map(Ok) })
	}
}

/// Service side of a [`ChannelTransport`].
#[derive(Debug)]
pub struct ChannelPeer {
	tx: Option<mpsc::UnboundedSender<String>>,
	rx: mpsc::UnboundedReceiver<String>,
}

impl ChannelPeer {
	/// Delivers a text frame to the client.
	pub fn send(&self, text: impl Into<String>) -> Result<()> {
		match &self.tx {
			Some(tx) => tx.send(text.into()).map_err(|_| Error::ChannelClosed),
			None => Err(Error::ChannelClosed),
		}
	}

	/// Next frame the client sent, or `None` once the client side is gone.
	pub async fn recv(&mut self) -> Option<String> {
		self.rx.recv().await
	}

	/// Non-blocking variant of [`recv`](Self::recv).
	pub fn try_recv(&mut self) -> Option<String> {
		self.rx.try_recv().ok()
	}

	/// Closes the service side; the client observes a peer close.
	pub fn close(&mut self) {
		self.tx = None;
	}
}
