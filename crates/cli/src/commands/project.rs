//! Offline overlay projection for one keypoints message.

use fitscan::{DisplaySize, Overlay, OverlayProjector};
use fitscan_protocol::ServerMessage;
use serde::Serialize;
use tracing::warn;

use crate::cli::ProjectArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{CommandResult, OutputFormat, RenderText, print_result};

#[derive(Debug, Serialize)]
pub struct ProjectData {
	pub display: DisplaySize,
	pub overlay: Overlay,
	/// Wire positions that were malformed and zeroed.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub degraded: Vec<usize>,
}

impl RenderText for ProjectData {
	fn render_text(&self) -> Vec<String> {
		let mut lines = vec![format!(
			"display {}: {} segments, {} points",
			self.display,
			self.overlay.segments.len(),
			self.overlay.markers.len()
		)];
		for s in &self.overlay.segments {
			lines.push(format!(
				"  {:?} -> {:?}: ({:.1}, {:.1}) -> ({:.1}, {:.1})",
				s.from, s.to, s.start.x, s.start.y, s.end.x, s.end.y
			));
		}
		for m in &self.overlay.markers {
			lines.push(format!(
				"  {:?} @ ({:.1}, {:.1}) r={}",
				m.keypoint, m.center.x, m.center.y, m.radius
			));
		}
		lines
	}
}

pub fn execute(args: ProjectArgs, config: &Config, format: OutputFormat) -> Result<()> {
	let display = config.resolve_display(args.display)?;
	let input = super::read_input(args.file.as_deref())?;
	let data = project_message(input.trim(), display)?;
	print_result(&CommandResult::success("project", data), format);
	Ok(())
}

pub fn project_message(payload: &str, display: DisplaySize) -> Result<ProjectData> {
	match ServerMessage::classify(payload)? {
		ServerMessage::Keypoints { pose, degraded } => {
			if !degraded.is_empty() {
				warn!(?degraded, "Malformed keypoint entries treated as undetected");
			}
			Ok(ProjectData {
				display,
				overlay: OverlayProjector::new(display).project(&pose),
				degraded,
			})
		}
		other => Err(CliError::InvalidInput(format!(
			"expected a keypoints message, got {}",
			other.kind()
		))),
	}
}
