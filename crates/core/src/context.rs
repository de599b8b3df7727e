//! Owned state of the single scan session.

use std::fmt;

use fitscan_protocol::{MeasurementSet, Pose};
use serde::Serialize;

/// Seconds counted down before capture starts.
pub const COUNTDOWN_SECS: u8 = 10;

/// Where the scan currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "name", content = "remaining", rename_all = "snake_case")]
pub enum ScanPhase {
	#[default]
	Idle,
	/// Seconds left before capture starts.
	Countdown(u8),
	Capturing,
	AwaitingResult,
}

impl ScanPhase {
	/// A session is in flight. A start request is a no-op while this holds.
	pub fn is_busy(self) -> bool {
		!self.is_idle()
	}

	pub fn is_idle(self) -> bool {
		self == ScanPhase::Idle
	}
}

impl fmt::Display for ScanPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ScanPhase::Idle => write!(f, "idle"),
			ScanPhase::Countdown(n) => write!(f, "countdown({n})"),
			ScanPhase::Capturing => write!(f, "capturing"),
			ScanPhase::AwaitingResult => write!(f, "awaiting result"),
		}
	}
}

/// State of the current scan attempt.
///
/// `generation` increases every time a session begins or is reset, so events
/// from timers started for an older session can be recognised and ignored.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
	pub phase: ScanPhase,
	pub frames_sent: u32,
	/// The A4 reference sheet was last reported visible.
	pub marker_detected: bool,
	pub keypoints: Option<Pose>,
	/// Base64 preview from the service, without a data-URI prefix.
	pub debug_image: Option<String>,
	pub measurements: Option<MeasurementSet>,
	generation: u64,
}

impl SessionContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn is_current(&self, session: u64) -> bool {
		self.generation == session
	}

	/// Starts a new attempt at the top of the countdown and returns its id.
	pub fn begin(&mut self) -> u64 {
		self.generation += 1;
		self.phase = ScanPhase::Countdown(COUNTDOWN_SECS);
		self.frames_sent = 0;
		self.marker_detected = false;
		self.measurements = None;
		self.clear_overlay();
		self.generation
	}

	/// Returns to idle and invalidates the running attempt.
	///
	/// The last measurement set and marker flag survive so the front end can
	/// keep showing them.
	pub fn reset(&mut self) {
		self.generation += 1;
		self.phase = ScanPhase::Idle;
		self.clear_overlay();
	}

	pub fn clear_overlay(&mut self) {
		self.keypoints = None;
		self.debug_image = None;
	}

	/// The skeleton overlay is drawn only while frames are in flight.
	pub fn overlay_visible(&self) -> bool {
		matches!(self.phase, ScanPhase::Capturing | ScanPhase::AwaitingResult)
			&& self.keypoints.is_some()
	}

	pub fn can_start(&self) -> bool {
		!self.phase.is_busy()
	}

	/// Label for the start control.
	pub fn action_label(&self) -> &'static str {
		match self.phase {
			ScanPhase::Capturing | ScanPhase::AwaitingResult => "Scanning...",
			ScanPhase::Countdown(_) => "Preparing...",
			ScanPhase::Idle => "Start Scan",
		}
	}

	/// One-line guidance shown above the camera view.
	pub fn status_text(&self) -> String {
		match self.phase {
			ScanPhase::Countdown(n) => format!("Preparing... {n}s"),
			_ if self.marker_detected => {
				"A4 paper detected, improving measurement accuracy".to_string()
			}
			_ => "For best accuracy, hold an A4 paper in front of the camera during scanning"
				.to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_begin_and_reset_bump_generation() {
		let mut ctx = SessionContext::new();
		let first = ctx.begin();
		assert_eq!(ctx.phase, ScanPhase::Countdown(COUNTDOWN_SECS));
		assert!(ctx.is_current(first));

		ctx.reset();
		assert!(!ctx.is_current(first));
		assert_eq!(ctx.phase, ScanPhase::Idle);

		let second = ctx.begin();
		assert!(second > first);
	}

	#[test]
	fn test_reset_keeps_results_but_clears_overlay() {
		let mut ctx = SessionContext::new();
		ctx.begin();
		ctx.keypoints = Some(Pose::default());
		ctx.debug_image = Some("QUJD".into());
		ctx.marker_detected = true;
		ctx.measurements = Some(MeasurementSet::default());

		ctx.reset();
		assert!(ctx.keypoints.is_none());
		assert!(ctx.debug_image.is_none());
		assert!(ctx.marker_detected);
		assert!(ctx.measurements.is_some());
	}

	#[test]
	fn test_begin_forgets_previous_marker() {
		let mut ctx = SessionContext::new();
		ctx.begin();
		ctx.marker_detected = true;
		ctx.reset();

		ctx.begin();
		assert!(!ctx.marker_detected);
		assert!(ctx.measurements.is_none());
		assert_eq!(ctx.status_text(), "Preparing... 10s");

		ctx.reset();
		assert_eq!(
			ctx.status_text(),
			"For best accuracy, hold an A4 paper in front of the camera during scanning"
		);
	}

	#[test]
	fn test_action_label_and_can_start() {
		let mut ctx = SessionContext::new();
		assert_eq!(ctx.action_label(), "Start Scan");
		assert!(ctx.can_start());

		ctx.phase = ScanPhase::Countdown(3);
		assert_eq!(ctx.action_label(), "Preparing...");
		assert!(!ctx.can_start());

		ctx.phase = ScanPhase::Capturing;
		assert_eq!(ctx.action_label(), "Scanning...");
		assert!(!ctx.can_start());

		ctx.phase = ScanPhase::AwaitingResult;
		assert_eq!(ctx.action_label(), "Scanning...");
		assert!(!ctx.can_start());
	}

	#[test]
	fn test_status_text() {
		let mut ctx = SessionContext::new();
		assert_eq!(
			ctx.status_text(),
			"For best accuracy, hold an A4 paper in front of the camera during scanning"
		);

		ctx.marker_detected = true;
		assert_eq!(
			ctx.status_text(),
			"A4 paper detected, improving measurement accuracy"
		);

		ctx.phase = ScanPhase::Countdown(7);
		assert_eq!(ctx.status_text(), "Preparing... 7s");
	}

	#[test]
	fn test_overlay_visibility() {
		let mut ctx = SessionContext::new();
		ctx.keypoints = Some(Pose::default());
		assert!(!ctx.overlay_visible());

		ctx.phase = ScanPhase::Capturing;
		assert!(ctx.overlay_visible());

		ctx.keypoints = None;
		assert!(!ctx.overlay_visible());
	}
}
