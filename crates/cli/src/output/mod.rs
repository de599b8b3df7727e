//! Output for CLI commands and live scan notices.
//!
//! ## Output Contract
//!
//! With `--format json`, every notice is written to stdout as one JSON object
//! per line while a scan runs, followed by one result envelope:
//!
//! ```json
//! {
//!   "ok": true,
//!   "command": "scan",
//!   "data": { ... }
//! }
//! ```
//!
//! On failure:
//!
//! ```json
//! {
//!   "ok": false,
//!   "command": "scan",
//!   "error": {
//!     "code": "CONNECTION_FAILED",
//!     "message": "Unable to connect to ws://127.0.0.1:8000/ws after 3 attempts."
//!   }
//! }
//! ```
//!
//! With `--format text`, notices and results are printed as coloured lines.

#[cfg(test)]
mod tests;

use std::fmt;

use colored::Colorize;
use fitscan::{ScanPhase, SessionNotice};
use fitscan_runtime::ConnectionState;
use serde::Serialize;

/// Output format for notices and results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Human-readable, coloured text
	#[default]
	Text,
	/// One JSON object per line
	Json,
}

impl fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OutputFormat::Text => write!(f, "text"),
			OutputFormat::Json => write!(f, "json"),
		}
	}
}

/// Result envelope printed once per command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
}

impl<T: Serialize> CommandResult<T> {
	pub fn success(command: impl Into<String>, data: T) -> Self {
		Self {
			ok: true,
			command: command.into(),
			data: Some(data),
			error: None,
		}
	}

	pub fn failure(command: impl Into<String>, error: CommandError) -> Self {
		Self {
			ok: false,
			command: command.into(),
			data: None,
			error: Some(error),
		}
	}
}

/// Error information for failed commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
}

/// Stable error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Configuration file or endpoint is invalid
	ConfigError,
	/// Command input could not be used
	InvalidInput,
	/// The service could not be reached or the connection was lost
	ConnectionFailed,
	/// The service sent something the protocol does not allow
	ProtocolError,
	/// A frame could not be captured
	CaptureFailed,
	/// The service reported an error
	ServerError,
	/// Stopped by Ctrl-C
	Interrupted,
	/// File I/O error
	IoError,
	/// Unknown/internal error
	InternalError,
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let code = match self {
			ErrorCode::ConfigError => "CONFIG_ERROR",
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
			ErrorCode::ProtocolError => "PROTOCOL_ERROR",
			ErrorCode::CaptureFailed => "CAPTURE_FAILED",
			ErrorCode::ServerError => "SERVER_ERROR",
			ErrorCode::Interrupted => "INTERRUPTED",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		};
		f.write_str(code)
	}
}

/// Text rendering for command result data.
pub trait RenderText {
	fn render_text(&self) -> Vec<String>;
}

pub fn print_result<T: Serialize + RenderText>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => {
			if let Some(data) = &result.data {
				for line in data.render_text() {
					println!("{line}");
				}
			}
		}
	}
}

/// Prints the failure envelope (json only; text errors go to stderr).
pub fn print_failure(command: &str, error: &CommandError, format: OutputFormat) {
	if format == OutputFormat::Json {
		let result: CommandResult<()> = CommandResult::failure(command, error.clone());
		if let Ok(json) = serde_json::to_string_pretty(&result) {
			println!("{json}");
		}
	}
}

pub fn print_error_stderr(error: &CommandError) {
	eprintln!("{} [{}]: {}", "error".red().bold(), error.code, error.message);
}

pub fn print_notice(notice: &SessionNotice, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string(notice) {
				println!("{json}");
			}
		}
		OutputFormat::Text => {
			if let Some(line) = describe_notice(notice) {
				println!("{line}");
			}
		}
	}
}

/// One display line per notice; `None` for notices too chatty for text mode.
pub fn describe_notice(notice: &SessionNotice) -> Option<String> {
	let line = match notice {
		SessionNotice::Connection { state } => match state {
			ConnectionState::Connecting => format!("{} connecting", "●".yellow()),
			ConnectionState::Open => format!("{} connected", "●".green()),
			ConnectionState::Closed => format!("{} disconnected", "●".red()),
		},
		SessionNotice::Reconnecting {
			attempt,
			max_attempts,
			delay_ms,
		} => format!(
			"{} retrying connection ({attempt}/{max_attempts}) in {:.1}s",
			"↻".yellow(),
			*delay_ms as f64 / 1000.0
		),
		SessionNotice::PhaseChanged { phase } => match phase {
			ScanPhase::Idle => format!("{}", "Scan stopped".dimmed()),
			ScanPhase::Countdown(n) => format!("Preparing... {n}s"),
			ScanPhase::Capturing => format!("{}", "Scanning...".cyan().bold()),
			ScanPhase::AwaitingResult => format!("{}", "Waiting for measurements...".cyan()),
		},
		SessionNotice::FrameSent { index, total } => {
			if *index % 10 != 0 && index != total {
				return None;
			}
			format!("  frames sent {index}/{total}")
		}
		SessionNotice::Marker { detected, status } => {
			if *detected {
				format!("{}", status.green())
			} else {
				status.clone()
			}
		}
		SessionNotice::Overlay { overlay } => {
			return (!overlay.is_empty()).then(|| {
				format!(
					"  skeleton: {} joints, {} bones",
					overlay.markers.len(),
					overlay.segments.len()
				)
			});
		}
		SessionNotice::DebugImage { uri } => {
			format!("  debug image ({} bytes)", uri.len())
		}
		SessionNotice::Complete { .. } => format!("{}", "Scan Complete".green().bold()),
		SessionNotice::Failure { fault, terminal } => {
			let label = if *terminal { "fatal" } else { "error" };
			format!("{} ({}): {}", label.red().bold(), fault.kind, fault.message)
		}
	};
	Some(line)
}
