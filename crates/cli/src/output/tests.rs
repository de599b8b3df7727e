use fitscan::{Fault, FaultKind, Overlay, ScanPhase, SessionNotice};
use fitscan_protocol::MeasurementSet;
use fitscan_runtime::ConnectionState;
use serde_json::json;

use super::*;

fn plain(notice: &SessionNotice) -> Option<String> {
	colored::control::set_override(false);
	describe_notice(notice)
}

#[test]
fn test_success_envelope_omits_error() {
	let result = CommandResult::success("classify", json!({"kind": "keypoints"}));
	let value = serde_json::to_value(&result).unwrap();
	assert_eq!(
		value,
		json!({"ok": true, "command": "classify", "data": {"kind": "keypoints"}})
	);
}

#[test]
fn test_failure_envelope_uses_screaming_codes() {
	let result: CommandResult<()> = CommandResult::failure(
		"scan",
		CommandError {
			code: ErrorCode::ConnectionFailed,
			message: "Unable to connect".into(),
		},
	);
	let value = serde_json::to_value(&result).unwrap();
	assert_eq!(value["ok"], json!(false));
	assert_eq!(value["error"]["code"], json!("CONNECTION_FAILED"));
	assert!(value.get("data").is_none());
	assert_eq!(ErrorCode::ConnectionFailed.to_string(), "CONNECTION_FAILED");
}

#[test]
fn test_countdown_and_phase_lines() {
	assert_eq!(
		plain(&SessionNotice::PhaseChanged {
			phase: ScanPhase::Countdown(7)
		})
		.as_deref(),
		Some("Preparing... 7s")
	);
	assert_eq!(
		plain(&SessionNotice::PhaseChanged {
			phase: ScanPhase::Capturing
		})
		.as_deref(),
		Some("Scanning...")
	);
}

#[test]
fn test_frame_progress_is_thinned() {
	let at = |index| plain(&SessionNotice::FrameSent { index, total: 100 });
	assert!(at(3).is_none());
	assert_eq!(at(10).as_deref(), Some("  frames sent 10/100"));
	assert_eq!(at(100).as_deref(), Some("  frames sent 100/100"));
}

#[test]
fn test_empty_overlay_is_silent() {
	assert!(
		plain(&SessionNotice::Overlay {
			overlay: Overlay::default()
		})
		.is_none()
	);
}

#[test]
fn test_failure_lines() {
	let fault = Fault {
		kind: FaultKind::Connection,
		message: "Unable to connect to ws://127.0.0.1:8000/ws after 3 attempts.".into(),
	};
	let line = plain(&SessionNotice::Failure {
		fault: fault.clone(),
		terminal: true,
	})
	.unwrap();
	assert!(line.starts_with("fatal (connection): Unable to connect"));

	let line = plain(&SessionNotice::Failure {
		fault,
		terminal: false,
	})
	.unwrap();
	assert!(line.starts_with("error (connection)"));
}

#[test]
fn test_connection_and_retry_lines() {
	assert_eq!(
		plain(&SessionNotice::Connection {
			state: ConnectionState::Open
		})
		.as_deref(),
		Some("● connected")
	);
	assert_eq!(
		plain(&SessionNotice::Reconnecting {
			attempt: 2,
			max_attempts: 3,
			delay_ms: 2000
		})
		.as_deref(),
		Some("↻ retrying connection (2/3) in 2.0s")
	);
}

#[test]
fn test_complete_line() {
	let notice = SessionNotice::Complete {
		measurements: MeasurementSet::default(),
	};
	assert_eq!(plain(&notice).as_deref(), Some("Scan Complete"));
}
