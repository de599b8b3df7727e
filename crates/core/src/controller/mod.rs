//! The scan session state machine.
//!
//! [`ScanSessionController`] is a single-owner actor. Connection events, user
//! requests and reports from its own timers all arrive as [`SessionEvent`]s and
//! are handled one at a time, in order, on the task running
//! [`ScanSessionController::run`]:
//!
//! ```text
//! Idle ──start──▶ Countdown(10) ──1s──▶ ... ──▶ Countdown(0) ──▶ Capturing
//!  ▲                                                              │
//!  │                                              budget spent    ▼
//!  └──── measurements / error / connection loss / abort ── AwaitingResult
//! ```
//!
//! Countdown and capture run as spawned tasks owned by the controller. Each
//! carries the session generation it was started for, and dropping the owning
//! guard aborts it, so events from a cancelled timer never touch a newer
//! session.


use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use fitscan_protocol::debug_image_uri;
use fitscan_runtime::{ConnectionEvent, ConnectionManager, ConnectionState};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::capture::CaptureSource;
use crate::context::{COUNTDOWN_SECS, ScanPhase, SessionContext};
use crate::error::{Error, Fault};
use crate::notice::SessionNotice;
use crate::overlay::{DisplaySize, OverlayProjector};
use crate::router::{MessageRouter, Routed};
use crate::scheduler::{FrameLink, FrameScheduler, ScheduleOutcome};

/// Time between two countdown values.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Input to the controller.
#[derive(Debug)]
pub enum SessionEvent {
	Connection(ConnectionEvent),
	/// User asked to start a scan.
	Start,
	/// User cancelled the scan.
	Abort,
	CountdownTick { session: u64, remaining: u8 },
	FrameSent { session: u64, index: u32 },
	CaptureFinished { session: u64, outcome: ScheduleOutcome },
	/// Tear everything down and stop the controller.
	Shutdown,
}

/// Cloneable request side of a running controller.
#[derive(Debug, Clone)]
pub struct SessionHandle {
	tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
	/// Requests a new scan. Returns false once the controller has stopped.
	pub fn start(&self) -> bool {
		self.tx.send(SessionEvent::Start).is_ok()
	}

	pub fn abort(&self) -> bool {
		self.tx.send(SessionEvent::Abort).is_ok()
	}

	pub fn shutdown(&self) -> bool {
		self.tx.send(SessionEvent::Shutdown).is_ok()
	}
}

/// Aborts the wrapped task when dropped.
struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
	fn drop(&mut self) {
		self.0.abort();
	}
}

/// Owner of the single scan session.
pub struct ScanSessionController {
	ctx: SessionContext,
	router: MessageRouter,
	projector: OverlayProjector,
	link: Arc<dyn FrameLink>,
	capture: Arc<dyn CaptureSource>,
	connection: Option<ConnectionManager>,
	events_tx: mpsc::UnboundedSender<SessionEvent>,
	events_rx: mpsc::UnboundedReceiver<SessionEvent>,
	notices: mpsc::UnboundedSender<SessionNotice>,
	countdown: Option<TaskGuard>,
	scheduler: Option<TaskGuard>,
}

impl ScanSessionController {
	/// Creates an idle controller sending frames through `link`.
	///
	/// Returns the controller and the notice stream for the front end.
	pub fn new(
		link: Arc<dyn FrameLink>,
		capture: Arc<dyn CaptureSource>,
		display: DisplaySize,
	) -> (Self, mpsc::UnboundedReceiver<SessionNotice>) {
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		let (notices, notices_rx) = mpsc::unbounded_channel();

		let controller = Self {
			ctx: SessionContext::new(),
			router: MessageRouter::new(display),
			projector: OverlayProjector::new(display),
			link,
			capture,
			connection: None,
			events_tx,
			events_rx,
			notices,
			countdown: None,
			scheduler: None,
		};
		(controller, notices_rx)
	}

	/// Creates a controller over a managed connection.
	///
	/// The connection is closed when the controller shuts down.
	pub fn with_connection(
		manager: ConnectionManager,
		capture: Arc<dyn CaptureSource>,
		display: DisplaySize,
	) -> (Self, mpsc::UnboundedReceiver<SessionNotice>) {
		let link: Arc<dyn FrameLink> = Arc::new(manager.handle());
		let (mut controller, notices) = Self::new(link, capture, display);
		controller.connection = Some(manager);
		(controller, notices)
	}

	pub fn handle(&self) -> SessionHandle {
		SessionHandle {
			tx: self.events_tx.clone(),
		}
	}

	pub fn context(&self) -> &SessionContext {
		&self.ctx
	}

	pub fn phase(&self) -> ScanPhase {
		self.ctx.phase
	}

	/// Processes events until a shutdown request, then tears down.
	///
	/// Connection events are taken before queued session events so a close
	/// supersedes pending timer reports. Returns the final session state.
	pub async fn run(
		mut self,
		mut connection: mpsc::UnboundedReceiver<ConnectionEvent>,
	) -> SessionContext {
		let mut connection_live = true;

		loop {
			let event = tokio::select! {
				biased;
				event = connection.recv(), if connection_live => match event {
					Some(event) => SessionEvent::Connection(event),
					None => {
						tracing::debug!("Connection event stream ended");
						connection_live = false;
						continue;
					}
				},
				event = self.events_rx.recv() => match event {
					Some(event) => event,
					None => break,
				},
			};

			if self.handle_event(event).is_break() {
				break;
			}
		}

		self.shutdown().await;
		std::mem::take(&mut self.ctx)
	}

	/// Applies one event. Breaks on [`SessionEvent::Shutdown`].
	pub fn handle_event(&mut self, event: SessionEvent) -> ControlFlow<()> {
		match event {
			SessionEvent::Connection(event) => self.on_connection(event),
			SessionEvent::Start => self.start(),
			SessionEvent::Abort => self.abort(),
			SessionEvent::CountdownTick { session, remaining } => {
				if self.ctx.is_current(session) {
					self.on_countdown(remaining);
				}
			}
			SessionEvent::FrameSent { session, index } => {
				if self.ctx.is_current(session) {
					self.ctx.frames_sent = index;
					self.notify(SessionNotice::FrameSent {
						index,
						total: crate::scheduler::MAX_FRAMES,
					});
				}
			}
			SessionEvent::CaptureFinished { session, outcome } => {
				if self.ctx.is_current(session) {
					self.on_capture_finished(outcome);
				} else {
					tracing::debug!(?outcome, "Ignoring capture report from a finished session");
				}
			}
			SessionEvent::Shutdown => return ControlFlow::Break(()),
		}
		ControlFlow::Continue(())
	}

	/// Cancels timers, resets the session and closes the connection.
	///
	/// Safe to call more than once.
	pub async fn shutdown(&mut self) {
		self.cancel_tasks();
		if !self.ctx.phase.is_idle() {
			self.reset_session();
		}
		if let Some(mut manager) = self.connection.take() {
			manager.close().await;
		}
		tracing::info!("Scan session shut down");
	}

	fn start(&mut self) {
		if !self.link.is_open() {
			self.fail(Error::Transport(fitscan_runtime::Error::NotConnected));
			return;
		}
		if self.ctx.phase.is_busy() {
			tracing::info!(phase = %self.ctx.phase, "Scanning or countdown in progress");
			return;
		}

		let session = self.ctx.begin();
		tracing::info!(session, "Starting countdown");
		self.notify_phase();
		self.countdown = Some(self.spawn_countdown(session));
	}

	fn abort(&mut self) {
		if self.ctx.phase.is_idle() {
			tracing::debug!("Abort with no active session");
			return;
		}
		tracing::info!(phase = %self.ctx.phase, "Scan aborted");
		self.reset_session();
	}

	fn on_countdown(&mut self, remaining: u8) {
		self.ctx.phase = ScanPhase::Countdown(remaining);
		tracing::debug!("Countdown: {}s", remaining);
		self.notify_phase();

		if remaining == 0 {
			self.countdown = None;
			tracing::info!("Countdown finished, starting capture");
			self.begin_capture();
		}
	}

	fn begin_capture(&mut self) {
		if !self.link.is_open() {
			self.fail(Error::Transport(fitscan_runtime::Error::NotConnected));
			self.reset_session();
			return;
		}

		self.ctx.phase = ScanPhase::Capturing;
		self.ctx.frames_sent = 0;
		self.notify_phase();

		let session = self.ctx.generation();
		let scheduler = FrameScheduler::new(Arc::clone(&self.link), Arc::clone(&self.capture));
		let events = self.events_tx.clone();
		tracing::info!(budget = scheduler.budget(), "Starting frame capture");

		self.scheduler = Some(TaskGuard(tokio::spawn(async move {
			let progress = events.clone();
			let outcome = scheduler
				.run(|index| {
					let _ = progress.send(SessionEvent::FrameSent { session, index });
				})
				.await;
			let _ = events.send(SessionEvent::CaptureFinished { session, outcome });
		})));
	}

	fn on_capture_finished(&mut self, outcome: ScheduleOutcome) {
		self.scheduler = None;
		match outcome {
			ScheduleOutcome::Completed { sent } => {
				tracing::info!(sent, "Frame budget spent, awaiting result");
				self.ctx.phase = ScanPhase::AwaitingResult;
				self.notify_phase();
			}
			ScheduleOutcome::Disconnected { sent } => {
				tracing::warn!(sent, "Connection left open state mid-capture");
				self.reset_session();
			}
			ScheduleOutcome::Failed { sent, error } => {
				tracing::error!(sent, "Error capturing frame: {}", error);
				self.fail(Error::Capture(error));
				self.reset_session();
			}
		}
	}

	fn on_connection(&mut self, event: ConnectionEvent) {
		match event {
			ConnectionEvent::StateChanged(state) => {
				self.notify(SessionNotice::Connection { state });
				if state != ConnectionState::Open {
					if self.ctx.phase.is_busy() {
						tracing::warn!(%state, phase = %self.ctx.phase, "Connection lost, resetting session");
						self.reset_session();
					} else {
						self.ctx.clear_overlay();
					}
				}
			}
			ConnectionEvent::Message(text) => self.on_message(&text),
			ConnectionEvent::Error(message) => {
				self.fail(Error::ConnectionLost(message));
				if self.ctx.phase.is_busy() {
					self.reset_session();
				}
			}
			ConnectionEvent::Reconnecting {
				attempt,
				max_attempts,
				delay,
			} => self.notify(SessionNotice::Reconnecting {
				attempt,
				max_attempts,
				delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
			}),
			ConnectionEvent::Failed { message, .. } => {
				let error = Error::ConnectionLost(message);
				tracing::error!("{}", error);
				self.notify(SessionNotice::Failure {
					fault: Fault::from(&error),
					terminal: true,
				});
			}
		}
	}

	fn on_message(&mut self, payload: &str) {
		match self.router.dispatch(&mut self.ctx, payload) {
			Routed::Ignored | Routed::Rejected(_) => {}
			Routed::Marker(detected) => self.notify(SessionNotice::Marker {
				detected,
				status: self.ctx.status_text(),
			}),
			Routed::DebugImage => {
				if let Some(data) = &self.ctx.debug_image {
					let uri = debug_image_uri(data);
					self.notify(SessionNotice::DebugImage { uri });
				}
			}
			Routed::Keypoints => {
				if self.ctx.overlay_visible() {
					if let Some(pose) = &self.ctx.keypoints {
						let overlay = self.projector.project(pose);
						self.notify(SessionNotice::Overlay { overlay });
					}
				}
			}
			Routed::Complete(measurements) => {
				for line in measurements.summary_lines() {
					tracing::info!("{}", line);
				}
				self.ctx.measurements = Some(measurements.clone());
				self.ctx.marker_detected = false;
				self.notify(SessionNotice::Complete { measurements });
				self.reset_session();
			}
			Routed::ServerError(message) => {
				self.fail(Error::ServerReported(message));
				self.reset_session();
			}
			Routed::Reset(e) => {
				tracing::warn!("Resetting session after protocol fault: {}", e);
				self.reset_session();
			}
		}
	}

	fn spawn_countdown(&self, session: u64) -> TaskGuard {
		let events = self.events_tx.clone();
		TaskGuard(tokio::spawn(async move {
			let mut ticker = tokio::time::interval(COUNTDOWN_TICK);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			ticker.tick().await;

			for remaining in (0..COUNTDOWN_SECS).rev() {
				ticker.tick().await;
				if events
					.send(SessionEvent::CountdownTick { session, remaining })
					.is_err()
				{
					return;
				}
			}
		}))
	}

	fn cancel_tasks(&mut self) {
		self.countdown = None;
		self.scheduler = None;
	}

	/// Cancels timers and returns to idle, announcing the phase change if there was one.
	fn reset_session(&mut self) {
		self.cancel_tasks();
		let was_idle = self.ctx.phase.is_idle();
		self.ctx.reset();
		if !was_idle {
			self.notify_phase();
		}
	}

	fn fail(&self, error: Error) {
		tracing::error!("{}", error);
		self.notify(SessionNotice::Failure {
			fault: Fault::from(&error),
			terminal: false,
		});
	}

	fn notify_phase(&self) {
		self.notify(SessionNotice::PhaseChanged {
			phase: self.ctx.phase,
		});
	}

	fn notify(&self, notice: SessionNotice) {
		let _ = self.notices.send(notice);
	}
}
