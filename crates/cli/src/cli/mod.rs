#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};
use fitscan::DisplaySize;

use crate::output::OutputFormat;

/// Cargo-like help colours.
fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.error(AnsiColor::Red.on_default().bold())
}

/// Root CLI for fitscan.
#[derive(Parser, Debug)]
#[command(name = "fitscan")]
#[command(about = "Stream camera frames to a pose-estimation service and read back body measurements")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default) or json
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Path to a fitscan.json configuration file
	#[arg(short, long, global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Connect, run one scan session and print the measurements.
	Scan(ScanArgs),
	/// Project a keypoints message onto a display.
	Project(ProjectArgs),
	/// Classify newline-delimited service messages.
	Classify(ClassifyArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
	/// Service endpoint (ws:// or wss://).
	#[arg(long, value_name = "URL")]
	pub endpoint: Option<String>,

	/// Directory of JPEG frames to stream instead of a camera.
	#[arg(long, value_name = "DIR")]
	pub frames_dir: Option<PathBuf>,

	/// Display size used for overlay projection.
	#[arg(long, value_name = "WxH")]
	pub display: Option<DisplaySize>,
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
	/// Display size to project onto.
	#[arg(long, value_name = "WxH")]
	pub display: Option<DisplaySize>,

	/// File holding one keypoints message (reads stdin when omitted).
	#[arg(value_name = "FILE")]
	pub file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
	/// File of newline-delimited messages (reads stdin when omitted).
	#[arg(value_name = "FILE")]
	pub file: Option<PathBuf>,
}

impl Commands {
	/// Name used in result envelopes.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Scan(_) => "scan",
			Commands::Project(_) => "project",
			Commands::Classify(_) => "classify",
		}
	}
}
