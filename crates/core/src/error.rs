//! Error types for the scan session engine.

use std::fmt;

use fitscan_protocol::ProtocolError;
use serde::Serialize;
use thiserror::Error;

use crate::capture::CaptureError;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the engine can surface.
///
/// None of these are fatal to the process. Use [`Error::kind`] to classify a
/// failure for display.
#[derive(Debug, Error)]
pub enum Error {
	/// Open or send failure against the measurement service.
	#[error(transparent)]
	Transport(#[from] fitscan_runtime::Error),

	/// The connection reported an error or gave up reconnecting.
	#[error("{0}")]
	ConnectionLost(String),

	/// An inbound payload could not be used.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	/// The capture source failed to produce a frame.
	#[error(transparent)]
	Capture(#[from] CaptureError),

	/// The service sent an `error` notice.
	#[error("{0}")]
	ServerReported(String),
}

impl Error {
	pub fn kind(&self) -> FaultKind {
		match self {
			Error::Transport(_) | Error::ConnectionLost(_) => FaultKind::Connection,
			Error::Protocol(_) => FaultKind::Protocol,
			Error::Capture(_) => FaultKind::Capture,
			Error::ServerReported(_) => FaultKind::ServerReported,
		}
	}
}

/// Classification of a user-visible failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
	Connection,
	Protocol,
	Capture,
	ServerReported,
}

impl fmt::Display for FaultKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			FaultKind::Connection => "connection",
			FaultKind::Protocol => "protocol",
			FaultKind::Capture => "capture",
			FaultKind::ServerReported => "server",
		};
		f.write_str(label)
	}
}

/// A failure as presented to the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
	pub kind: FaultKind,
	pub message: String,
}

impl From<&Error> for Fault {
	fn from(err: &Error) -> Self {
		Self {
			kind: err.kind(),
			message: err.to_string(),
		}
	}
}

impl From<Error> for Fault {
	fn from(err: Error) -> Self {
		Self::from(&err)
	}
}

impl fmt::Display for Fault {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} error: {}", self.kind, self.message)
	}
}
