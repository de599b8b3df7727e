//! Live scan: connect, run one session, print the measurements.

use std::sync::Arc;

use fitscan::{
	CaptureSource, DirectorySource, Fault, FaultKind, ScanPhase, ScanSessionController,
	SessionNotice, StaticSource,
};
use fitscan_protocol::MeasurementSet;
use fitscan_runtime::{ConnectionManager, ConnectionState};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::ScanArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{CommandResult, OutputFormat, RenderText, print_notice, print_result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanData {
	pub endpoint: String,
	pub frames_sent: u32,
	pub measurements: MeasurementSet,
}

impl RenderText for ScanData {
	fn render_text(&self) -> Vec<String> {
		self.measurements.summary_lines()
	}
}

// ---------------------------------------------------------------------------
// Notice tracking
// ---------------------------------------------------------------------------

/// What the front end should do after a notice.
#[derive(Debug)]
enum Step {
	Start,
	Finish(Result<MeasurementSet>),
}

/// Follows the notice stream of a single scan.
#[derive(Debug, Default)]
struct ScanWatcher {
	started: bool,
	phase: ScanPhase,
	frames_sent: u32,
	last_fault: Option<Fault>,
}

impl ScanWatcher {
	fn observe(&mut self, notice: &SessionNotice) -> Option<Step> {
		match notice {
			SessionNotice::Connection {
				state: ConnectionState::Open,
			} if !self.started => {
				self.started = true;
				Some(Step::Start)
			}
			SessionNotice::FrameSent { index, .. } => {
				self.frames_sent = *index;
				None
			}
			SessionNotice::PhaseChanged { phase } => {
				self.phase = *phase;
				(self.started && phase.is_idle()).then(|| Step::Finish(Err(self.ended())))
			}
			SessionNotice::Complete { measurements } => Some(Step::Finish(Ok(measurements.clone()))),
			SessionNotice::Failure { fault, terminal } => {
				if *terminal {
					return Some(Step::Finish(Err(CliError::Scan(fault.clone()))));
				}
				self.last_fault = Some(fault.clone());
				// Refused before the countdown began.
				(self.started && self.phase.is_idle())
					.then(|| Step::Finish(Err(CliError::Scan(fault.clone()))))
			}
			_ => None,
		}
	}

	fn ended(&mut self) -> CliError {
		let fault = self.last_fault.take().unwrap_or_else(|| Fault {
			kind: FaultKind::Connection,
			message: "scan ended without a result".to_string(),
		});
		CliError::Scan(fault)
	}
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

pub async fn execute(args: ScanArgs, config: &Config, format: OutputFormat) -> Result<()> {
	let endpoint = config.resolve_endpoint(args.endpoint.as_deref())?;
	let display_size = config.resolve_display(args.display)?;
	let capture = open_capture(args.frames_dir.or_else(|| config.capture.frames_dir.clone()))?;
	info!(
		target: "fitscan",
		endpoint = %endpoint,
		size = %display_size,
		quality = config.capture.quality,
		"scan"
	);

	let (manager, connection_events) = ConnectionManager::connect_websocket(endpoint.as_str());
	let (controller, mut notices) =
		ScanSessionController::with_connection(manager, capture, display_size);
	let session = controller.handle();
	let engine = tokio::spawn(controller.run(connection_events));

	let mut watcher = ScanWatcher::default();
	let outcome = loop {
		tokio::select! {
			_ = tokio::signal::ctrl_c() => break Err(CliError::Interrupted),
			notice = notices.recv() => {
				let Some(notice) = notice else {
					break Err(CliError::ConnectionClosed);
				};
				print_notice(&notice, format);
				match watcher.observe(&notice) {
					Some(Step::Start) => {
						session.start();
					}
					Some(Step::Finish(result)) => break result,
					None => {}
				}
			}
		}
	};

	session.shutdown();
	engine
		.await
		.map_err(|e| anyhow::Error::new(e).context("scan engine stopped unexpectedly"))?;

	let measurements = outcome?;
	let data = ScanData {
		endpoint: endpoint.to_string(),
		frames_sent: watcher.frames_sent,
		measurements,
	};
	print_result(&CommandResult::success("scan", data), format);
	Ok(())
}

fn open_capture(frames_dir: Option<std::path::PathBuf>) -> Result<Arc<dyn CaptureSource>> {
	match frames_dir {
		Some(dir) => {
			let source = DirectorySource::open(&dir)?;
			info!(dir = %dir.display(), frames = source.len(), "streaming frames from directory");
			Ok(Arc::new(source))
		}
		None => {
			warn!("no frames directory configured, streaming a placeholder frame");
			Ok(Arc::new(StaticSource::placeholder()))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn open() -> SessionNotice {
		SessionNotice::Connection {
			state: ConnectionState::Open,
		}
	}

	fn phase(phase: ScanPhase) -> SessionNotice {
		SessionNotice::PhaseChanged { phase }
	}

	fn failure(message: &str, terminal: bool) -> SessionNotice {
		SessionNotice::Failure {
			fault: Fault {
				kind: FaultKind::Connection,
				message: message.to_string(),
			},
			terminal,
		}
	}

	#[test]
	fn test_starts_once_on_first_open() {
		let mut watcher = ScanWatcher::default();
		assert!(watcher.observe(&SessionNotice::Connection {
			state: ConnectionState::Connecting
		})
		.is_none());
		assert!(matches!(watcher.observe(&open()), Some(Step::Start)));
		assert!(watcher.observe(&open()).is_none());
	}

	#[test]
	fn test_complete_finishes_with_measurements() {
		let mut watcher = ScanWatcher::default();
		watcher.observe(&open());
		watcher.observe(&phase(ScanPhase::Countdown(10)));
		watcher.observe(&phase(ScanPhase::Capturing));
		watcher.observe(&SessionNotice::FrameSent {
			index: 100,
			total: 100,
		});

		let mut measurements = MeasurementSet::default();
		measurements.entries.insert("waist".into(), 31.5);
		match watcher.observe(&SessionNotice::Complete {
			measurements: measurements.clone(),
		}) {
			Some(Step::Finish(Ok(set))) => assert_eq!(set, measurements),
			other => panic!("Expected Finish(Ok), got {other:?}"),
		}
		assert_eq!(watcher.frames_sent, 100);
	}

	#[test]
	fn test_transient_failure_before_start_is_tolerated() {
		let mut watcher = ScanWatcher::default();
		assert!(watcher.observe(&failure("Failed to connect", false)).is_none());
		assert!(matches!(watcher.observe(&open()), Some(Step::Start)));
	}

	#[test]
	fn test_terminal_failure_finishes() {
		let mut watcher = ScanWatcher::default();
		match watcher.observe(&failure("Unable to connect after 3 attempts.", true)) {
			Some(Step::Finish(Err(CliError::Scan(fault)))) => {
				assert_eq!(fault.message, "Unable to connect after 3 attempts.");
			}
			other => panic!("Expected terminal failure, got {other:?}"),
		}
	}

	#[test]
	fn test_refused_start_finishes() {
		let mut watcher = ScanWatcher::default();
		watcher.observe(&open());
		assert!(matches!(
			watcher.observe(&failure("WebSocket not connected", false)),
			Some(Step::Finish(Err(_)))
		));
	}

	#[test]
	fn test_reset_after_start_reports_last_fault() {
		let mut watcher = ScanWatcher::default();
		watcher.observe(&open());
		watcher.observe(&phase(ScanPhase::Capturing));
		assert!(watcher.observe(&failure("Connection lost", false)).is_none());

		match watcher.observe(&phase(ScanPhase::Idle)) {
			Some(Step::Finish(Err(CliError::Scan(fault)))) => {
				assert_eq!(fault.message, "Connection lost");
			}
			other => panic!("Expected Finish(Err), got {other:?}"),
		}
	}

	#[test]
	fn test_silent_reset_reports_generic_fault() {
		let mut watcher = ScanWatcher::default();
		watcher.observe(&open());
		watcher.observe(&phase(ScanPhase::Countdown(10)));
		match watcher.observe(&phase(ScanPhase::Idle)) {
			Some(Step::Finish(Err(err))) => {
				assert_eq!(err.to_string(), "scan ended without a result");
			}
			other => panic!("Expected Finish(Err), got {other:?}"),
		}
	}
}
