//! Paced capture-and-send of the frame budget.


use std::sync::Arc;
use std::time::Duration;

use fitscan_protocol::FramePayload;
use fitscan_runtime::ConnectionHandle;
use tokio::time::MissedTickBehavior;

use crate::capture::{CaptureError, CaptureSource};

/// Delay between two frames.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(200);

/// Frames sent per session.
pub const MAX_FRAMES: u32 = 100;

/// The outbound side of the connection as the scheduler sees it.
pub trait FrameLink: Send + Sync {
	fn is_open(&self) -> bool;

	fn send_frame(&self, payload: String) -> fitscan_runtime::Result<()>;
}

impl FrameLink for ConnectionHandle {
	fn is_open(&self) -> bool {
		ConnectionHandle::is_open(self)
	}

	fn send_frame(&self, payload: String) -> fitscan_runtime::Result<()> {
		self.send_text(payload)
	}
}

/// How a schedule ended.
#[derive(Debug)]
pub enum ScheduleOutcome {
	/// Every frame in the budget went out.
	Completed { sent: u32 },
	/// The connection left `Open` before the budget was spent.
	Disconnected { sent: u32 },
	/// A frame could not be acquired.
	Failed { sent: u32, error: CaptureError },
}

/// Sends up to [`MAX_FRAMES`] frames, one every [`FRAME_INTERVAL`].
///
/// The first frame goes out immediately. Aborting the task running
/// [`run`](Self::run) stops the schedule between frames.
pub struct FrameScheduler {
	link: Arc<dyn FrameLink>,
	source: Arc<dyn CaptureSource>,
	interval: Duration,
	budget: u32,
}

impl FrameScheduler {
	pub fn new(link: Arc<dyn FrameLink>, source: Arc<dyn CaptureSource>) -> Self {
		Self {
			link,
			source,
			interval: FRAME_INTERVAL,
			budget: MAX_FRAMES,
		}
	}

	pub fn budget(&self) -> u32 {
		self.budget
	}

	/// Runs the schedule, calling `on_sent` with the 1-based index of each frame sent.
	pub async fn run(self, mut on_sent: impl FnMut(u32)) -> ScheduleOutcome {
		let mut ticker = tokio::time::interval(self.interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		let mut sent = 0;
		while sent < self.budget {
			ticker.tick().await;

			if !self.link.is_open() {
				tracing::info!(sent, "Stopping frame capture: connection not open");
				return ScheduleOutcome::Disconnected { sent };
			}

			let sample = match self.source.capture().await {
				Ok(sample) => sample,
				Err(error) => return ScheduleOutcome::Failed { sent, error },
			};
			let payload = match FramePayload::from_sample(&sample) {
				Ok(payload) => payload,
				Err(e) => {
					return ScheduleOutcome::Failed {
						sent,
						error: CaptureError::from(e),
					};
				}
			};

			tracing::debug!(
				"Sending frame {}/{}, base64 length: {}",
				sent + 1,
				self.budget,
				payload.len()
			);
			if let Err(e) = self.link.send_frame(payload.into_inner()) {
				tracing::info!(sent, "Stopping frame capture: {}", e);
				return ScheduleOutcome::Disconnected { sent };
			}

			sent += 1;
			on_sent(sent);
		}

		tracing::info!("Finished sending {} frames", sent);
		ScheduleOutcome::Completed { sent }
	}
}
