//! Notices the controller publishes for the front end.

use fitscan_protocol::MeasurementSet;
use fitscan_runtime::ConnectionState;
use serde::Serialize;

use crate::context::ScanPhase;
use crate::error::Fault;
use crate::overlay::Overlay;

/// One thing the front end may want to render.
///
/// Notices are informational. The controller never waits for them to be read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionNotice {
	Connection {
		state: ConnectionState,
	},
	Reconnecting {
		attempt: u32,
		max_attempts: u32,
		delay_ms: u64,
	},
	PhaseChanged {
		phase: ScanPhase,
	},
	FrameSent {
		index: u32,
		total: u32,
	},
	Marker {
		detected: bool,
		status: String,
	},
	Overlay {
		overlay: Overlay,
	},
	/// Preview image as a `data:` URI.
	DebugImage {
		uri: String,
	},
	Complete {
		measurements: MeasurementSet,
	},
	/// A user-visible failure. `terminal` is set once the connection has given up.
	Failure {
		#[serde(flatten)]
		fault: Fault,
		terminal: bool,
	},
}
