//! `fitscan.json` configuration.
//!
//! Lookup order for the file: `--config`, `$FITSCAN_CONFIG`, `./fitscan.json`,
//! then `<user config dir>/fitscan/fitscan.json`. The first two must exist when
//! given; the last two are skipped when missing. With no file the defaults apply.
//!
//! The endpoint resolves as: CLI flag, then `$FITSCAN_ENDPOINT`, then the file,
//! then [`DEFAULT_ENDPOINT`].

use std::path::{Path, PathBuf};

use fitscan::DisplaySize;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{CliError, Result};

pub const CONFIG_FILE_NAME: &str = "fitscan.json";
pub const CONFIG_ENV: &str = "FITSCAN_CONFIG";
pub const ENDPOINT_ENV: &str = "FITSCAN_ENDPOINT";
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8000/ws";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
	pub endpoint: String,
	pub display: DisplayConfig,
	pub capture: CaptureConfig,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			endpoint: DEFAULT_ENDPOINT.to_string(),
			display: DisplayConfig::default(),
			capture: CaptureConfig::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayConfig {
	pub width: f64,
	pub height: f64,
}

impl Default for DisplayConfig {
	fn default() -> Self {
		let size = DisplaySize::default();
		Self {
			width: size.width,
			height: size.height,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConfig {
	/// Directory of JPEG samples to stream instead of a camera.
	pub frames_dir: Option<PathBuf>,
	/// JPEG quality hint, 0.0 to 1.0.
	pub quality: f64,
}

impl Default for CaptureConfig {
	fn default() -> Self {
		Self {
			frames_dir: None,
			quality: 0.5,
		}
	}
}

impl Config {
	/// Loads the configuration using the process environment and working directory.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
		let cwd = std::env::current_dir().ok();
		let user_dir = dirs::config_dir();

		let mut config = match discover(
			explicit,
			env_path.as_deref(),
			cwd.as_deref(),
			user_dir.as_deref(),
		)? {
			Some(path) => Self::from_path(&path)?,
			None => Self::default(),
		};
		config.apply_env(std::env::var(ENDPOINT_ENV).ok());
		Ok(config)
	}

	pub fn from_path(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path).map_err(|e| CliError::Config {
			path: path.to_path_buf(),
			reason: e.to_string(),
		})?;
		let config: Self = serde_json::from_str(&content).map_err(|e| CliError::Config {
			path: path.to_path_buf(),
			reason: e.to_string(),
		})?;
		debug!(path = %path.display(), "loaded config");
		Ok(config)
	}

	/// Overrides the file endpoint with `$FITSCAN_ENDPOINT` when set and non-empty.
	pub fn apply_env(&mut self, endpoint: Option<String>) {
		if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
			self.endpoint = endpoint;
		}
	}

	/// The endpoint to dial: `flag` wins over the configured value.
	pub fn resolve_endpoint(&self, flag: Option<&str>) -> Result<Url> {
		parse_endpoint(flag.unwrap_or(&self.endpoint))
	}

	/// The display size to project onto: `flag` wins over the configured value.
	pub fn resolve_display(&self, flag: Option<DisplaySize>) -> Result<DisplaySize> {
		if let Some(size) = flag {
			return Ok(size);
		}
		let DisplayConfig { width, height } = self.display;
		if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
			return Err(CliError::InvalidInput(format!(
				"display size must be positive, got {width}x{height}"
			)));
		}
		Ok(DisplaySize::new(width, height))
	}
}

/// Picks the configuration file to read, if any.
pub fn discover(
	explicit: Option<&Path>,
	env_path: Option<&Path>,
	cwd: Option<&Path>,
	user_config_dir: Option<&Path>,
) -> Result<Option<PathBuf>> {
	if let Some(path) = explicit.or(env_path) {
		if !path.is_file() {
			return Err(CliError::Config {
				path: path.to_path_buf(),
				reason: "file not found".to_string(),
			});
		}
		return Ok(Some(path.to_path_buf()));
	}

	let candidates = [
		cwd.map(|dir| dir.join(CONFIG_FILE_NAME)),
		user_config_dir.map(|dir| dir.join("fitscan").join(CONFIG_FILE_NAME)),
	];
	Ok(candidates.into_iter().flatten().find(|p| p.is_file()))
}

fn parse_endpoint(raw: &str) -> Result<Url> {
	let invalid = |reason: String| CliError::InvalidEndpoint {
		url: raw.to_string(),
		reason,
	};
	let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
	match url.scheme() {
		"ws" | "wss" => Ok(url),
		other => Err(invalid(format!("scheme must be ws or wss, got {other}"))),
	}
}
