//! Connection supervision for the measurement service.
//!
//! [`ConnectionManager`] owns exactly one live transport at a time. A
//! background supervisor task dials the endpoint, pumps frames in both
//! directions while the connection is open, and redials after an unexpected
//! close:
//!
//! 1. State goes `Connecting`, the [`Connector`] dials the endpoint
//! 2. On success the state goes `Open` and the retry counter resets
//! 3. Inbound text frames are forwarded as [`ConnectionEvent::Message`] in arrival order
//! 4. When the peer closes or the transport fails, the state goes `Closed`
//! 5. Up to [`MAX_RECONNECT_ATTEMPTS`] redials follow, [`RECONNECT_DELAY`] apart
//! 6. Once the budget is spent, [`ConnectionEvent::Failed`] is emitted and the supervisor exits
//!
//! [`ConnectionManager::close`] is a manual close and never triggers a redial.
//! Dropping the manager does the same and aborts the supervisor.


use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::transport::{Connector, TransportParts, WebSocketConnector};

/// Redials attempted after an unexpected close before giving up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Fixed delay before each redial.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Reconnection budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
	pub max_attempts: u32,
	pub delay: Duration,
}

impl Default for ReconnectPolicy {
	fn default() -> Self {
		Self {
			max_attempts: MAX_RECONNECT_ATTEMPTS,
			delay: RECONNECT_DELAY,
		}
	}
}

/// Lifecycle state of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
	Connecting,
	Open,
	Closed,
}

impl std::fmt::Display for ConnectionState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ConnectionState::Connecting => write!(f, "connecting"),
			ConnectionState::Open => write!(f, "open"),
			ConnectionState::Closed => write!(f, "closed"),
		}
	}
}

/// Everything the session engine needs to know about the connection, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
	/// The connection moved to a new state.
	StateChanged(ConnectionState),
	/// One inbound text frame.
	Message(String),
	/// Open or transport failure. Always followed by `StateChanged(Closed)`.
	Error(String),
	/// A redial is scheduled after `delay`.
	Reconnecting {
		attempt: u32,
		max_attempts: u32,
		delay: Duration,
	},
	/// The redial budget is spent; the supervisor has stopped.
	Failed { attempts: u32, message: String },
}

type OutboundSlot = Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>;

/// Cheap cloneable send/state access to the managed connection.
#[derive(Clone)]
pub struct ConnectionHandle {
	state_rx: watch::Receiver<ConnectionState>,
	outbound: OutboundSlot,
}

impl ConnectionHandle {
	pub fn state(&self) -> ConnectionState {
		*self.state_rx.borrow()
	}

	pub fn is_open(&self) -> bool {
		self.state() == ConnectionState::Open
	}

	/// Queues one text frame on the live connection.
	///
	/// Fails fast with [`Error::NotConnected`] unless the connection is open.
	pub fn send_text(&self, text: String) -> Result<()> {
		if !self.is_open() {
			return Err(Error::NotConnected);
		}
		let outbound = self.outbound.lock();
		let tx = outbound.as_ref().ok_or(Error::NotConnected)?;
		tx.send(text).map_err(|_| Error::NotConnected)
	}
}

impl std::fmt::Debug for ConnectionHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConnectionHandle")
			.field("state", &self.state())
			.finish()
	}
}

/// Owner of the single connection to the measurement service.
pub struct ConnectionManager {
	url: Arc<str>,
	handle: ConnectionHandle,
	shutdown_tx: watch::Sender<bool>,
	supervisor: Option<JoinHandle<()>>,
}

impl ConnectionManager {
	/// Starts supervising a connection to `url`.
	///
	/// Returns the manager and the ordered event stream for the session engine.
	pub fn connect(
		url: impl Into<String>,
		connector: Arc<dyn Connector>,
		policy: ReconnectPolicy,
	) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
		let url: Arc<str> = Arc::from(url.into());
		let (state_tx, state_rx) = watch::channel(ConnectionState::Closed);
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		let (shutdown_tx, shutdown_rx) = watch::channel(false);
		let outbound: OutboundSlot = Arc::new(Mutex::new(None));

		let supervisor = Supervisor {
			url: Arc::clone(&url),
			connector,
			policy,
			state_tx,
			outbound: Arc::clone(&outbound),
			events: events_tx,
			shutdown_rx,
		};
		let task = tokio::spawn(supervisor.run());

		let manager = Self {
			url,
			handle: ConnectionHandle { state_rx, outbound },
			shutdown_tx,
			supervisor: Some(task),
		};
		(manager, events_rx)
	}

	/// [`connect`](Self::connect) over WebSocket with the default policy.
	pub fn connect_websocket(
		url: impl Into<String>,
	) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
		Self::connect(url, Arc::new(WebSocketConnector), ReconnectPolicy::default())
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn state(&self) -> ConnectionState {
		self.handle.state()
	}

	pub fn handle(&self) -> ConnectionHandle {
		self.handle.clone()
	}

	/// Watch receiver for state transitions.
	pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
		self.handle.state_rx.clone()
	}

	pub fn send_text(&self, text: String) -> Result<()> {
		self.handle.send_text(text)
	}

	/// Manually closes the connection without redialing.
	///
	/// Waits for the supervisor to release the transport. Calling it again is a no-op.
	pub async fn close(&mut self) {
		let _ = self.shutdown_tx.send(true);
		if let Some(task) = self.supervisor.take() {
			if let Err(e) = task.await {
				tracing::debug!("Connection supervisor ended abnormally: {}", e);
			}
		}
		tracing::info!(url = %self.url, "Connection closed");
	}
}

impl Drop for ConnectionManager {
	fn drop(&mut self) {
		let _ = self.shutdown_tx.send(true);
		if let Some(task) = self.supervisor.take() {
			task.abort();
		}
	}
}

/// How one open connection ended.
enum Termination {
	Manual,
	Dropped(Option<String>),
}

struct Supervisor {
	url: Arc<str>,
	connector: Arc<dyn Connector>,
	policy: ReconnectPolicy,
	state_tx: watch::Sender<ConnectionState>,
	outbound: OutboundSlot,
	events: mpsc::UnboundedSender<ConnectionEvent>,
	shutdown_rx: watch::Receiver<bool>,
}

impl Supervisor {
	async fn run(mut self) {
		let mut retries = 0u32;

		loop {
			self.set_state(ConnectionState::Connecting);
			tracing::info!(url = %self.url, "Attempting connection");

			let connector = Arc::clone(&self.connector);
			let url = Arc::clone(&self.url);
			let dialed = tokio::select! {
				biased;
				_ = closing(&mut self.shutdown_rx) => {
					self.set_state(ConnectionState::Closed);
					return;
				}
				result = connector.connect(&url) => result,
			};

			match dialed {
				Ok(parts) => {
					retries = 0;
					match self.pump(parts).await {
						Termination::Manual => {
							self.set_state(ConnectionState::Closed);
							return;
						}
						Termination::Dropped(Some(reason)) => {
							tracing::error!(url = %self.url, "Connection error: {}", reason);
							self.emit(ConnectionEvent::Error(format!(
								"Connection to {} failed: {}",
								self.url, reason
							)));
						}
						Termination::Dropped(None) => {
							tracing::info!(url = %self.url, "Connection closed by peer");
						}
					}
				}
				Err(e) => {
					tracing::error!("{}", e);
					self.emit(ConnectionEvent::Error(e.to_string()));
				}
			}

			self.set_state(ConnectionState::Closed);

			if retries >= self.policy.max_attempts {
				let message = format!(
					"Unable to connect to {} after {} attempts.",
					self.url, self.policy.max_attempts
				);
				tracing::error!("{}", message);
				self.emit(ConnectionEvent::Failed {
					attempts: retries,
					message,
				});
				return;
			}

			retries += 1;
			tracing::info!(
				"Retrying connection ({}/{})...",
				retries,
				self.policy.max_attempts
			);
			self.emit(ConnectionEvent::Reconnecting {
				attempt: retries,
				max_attempts: self.policy.max_attempts,
				delay: self.policy.delay,
			});

			tokio::select! {
				biased;
				_ = closing(&mut self.shutdown_rx) => return,
				_ = tokio::time::sleep(self.policy.delay) => {}
			}
		}
	}

	/// Moves frames both ways until the connection ends.
	async fn pump(&mut self, parts: TransportParts) -> Termination {
		let TransportParts {
			mut sender,
			mut receiver,
		} = parts;

		let (tx, mut rx) = mpsc::unbounded_channel::<String>();
		*self.outbound.lock() = Some(tx);
		self.set_state(ConnectionState::Open);
		tracing::info!(url = %self.url, "Connected");

		let termination = loop {
			tokio::select! {
				biased;
				_ = closing(&mut self.shutdown_rx) => {
					if let Err(e) = sender.close().await {
						tracing::debug!("Close handshake failed: {}", e);
					}
					break Termination::Manual;
				}
				inbound = receiver.recv() => match inbound {
					Some(Ok(text)) => self.emit(ConnectionEvent::Message(text)),
					Some(Err(e)) => break Termination::Dropped(Some(e.to_string())),
					None => break Termination::Dropped(None),
				},
				frame = rx.recv() => match frame {
					Some(text) => {
						if let Err(e) = sender.send(text).await {
							break Termination::Dropped(Some(e.to_string()));
						}
					}
					None => break Termination::Dropped(None),
				},
			}
		};

		self.outbound.lock().take();
		termination
	}

	fn set_state(&self, state: ConnectionState) {
		let previous = self.state_tx.send_replace(state);
		if previous != state {
			tracing::debug!(%previous, %state, "Connection state changed");
			self.emit(ConnectionEvent::StateChanged(state));
		}
	}

	fn emit(&self, event: ConnectionEvent) {
		let _ = self.events.send(event);
	}
}

/// Resolves once a manual close is requested or the manager is gone.
async fn closing(shutdown_rx: &mut watch::Receiver<bool>) {
	let _ = shutdown_rx.wait_for(|closing| *closing).await;
}
