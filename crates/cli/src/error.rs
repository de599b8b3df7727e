use std::path::PathBuf;

use fitscan::{Fault, FaultKind};
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("invalid config {}: {reason}", path.display())]
	Config { path: PathBuf, reason: String },

	#[error("invalid endpoint `{url}`: {reason}")]
	InvalidEndpoint { url: String, reason: String },

	#[error("{0}")]
	InvalidInput(String),

	/// A fault surfaced by the scan session.
	#[error("{}", .0.message)]
	Scan(Fault),

	#[error("connection closed before the scan finished")]
	ConnectionClosed,

	#[error("interrupted")]
	Interrupted,

	#[error(transparent)]
	Protocol(#[from] fitscan_protocol::ProtocolError),

	#[error(transparent)]
	Capture(#[from] fitscan::CaptureError),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::Config { .. } | CliError::InvalidEndpoint { .. } => ErrorCode::ConfigError,
			CliError::InvalidInput(_) => ErrorCode::InvalidInput,
			CliError::Scan(fault) => match fault.kind {
				FaultKind::Connection => ErrorCode::ConnectionFailed,
				FaultKind::Protocol => ErrorCode::ProtocolError,
				FaultKind::Capture => ErrorCode::CaptureFailed,
				FaultKind::ServerReported => ErrorCode::ServerError,
			},
			CliError::ConnectionClosed => ErrorCode::ConnectionFailed,
			CliError::Interrupted => ErrorCode::Interrupted,
			CliError::Protocol(_) => ErrorCode::ProtocolError,
			CliError::Capture(_) => ErrorCode::CaptureFailed,
			CliError::Io(_) => ErrorCode::IoError,
			CliError::Json(_) => ErrorCode::InvalidInput,
			CliError::Anyhow(_) => ErrorCode::InternalError,
		}
	}

	/// Process exit status: 2 for usage problems, 130 for Ctrl-C, 1 otherwise.
	pub fn exit_code(&self) -> i32 {
		match self.code() {
			ErrorCode::ConfigError | ErrorCode::InvalidInput => 2,
			ErrorCode::Interrupted => 130,
			_ => 1,
		}
	}

	pub fn to_command_error(&self) -> CommandError {
		let message = match self {
			CliError::Anyhow(err) => format!("{err:#}"),
			other => other.to_string(),
		};
		CommandError {
			code: self.code(),
			message,
		}
	}
}

impl From<Fault> for CliError {
	fn from(fault: Fault) -> Self {
		CliError::Scan(fault)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_scan_fault_maps_to_code() {
		let err = CliError::from(Fault {
			kind: FaultKind::Connection,
			message: "Unable to connect to ws://localhost:8000/ws after 3 attempts.".into(),
		});
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::ConnectionFailed);
		assert_eq!(
			cmd.message,
			"Unable to connect to ws://localhost:8000/ws after 3 attempts."
		);
		assert_eq!(err.exit_code(), 1);
	}

	#[test]
	fn test_server_error_code() {
		let err = CliError::Scan(Fault {
			kind: FaultKind::ServerReported,
			message: "no person detected".into(),
		});
		assert_eq!(err.code(), ErrorCode::ServerError);
	}

	#[test]
	fn test_usage_errors_exit_two() {
		let err = CliError::InvalidEndpoint {
			url: "http://x".into(),
			reason: "scheme must be ws or wss".into(),
		};
		assert_eq!(err.exit_code(), 2);
		assert_eq!(CliError::Interrupted.exit_code(), 130);
	}

	#[test]
	fn test_anyhow_keeps_context_chain() {
		let err = CliError::from(
			anyhow::anyhow!("permission denied").context("failed to read pose.json"),
		);
		assert_eq!(
			err.to_command_error().message,
			"failed to read pose.json: permission denied"
		);
	}
}
