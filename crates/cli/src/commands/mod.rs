mod classify;
mod project;
mod scan;

use std::io::Read;
use std::path::Path;

use anyhow::Context;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::Result;

pub async fn dispatch(cli: Cli) -> Result<()> {
	let format = cli.format;
	let config = Config::load(cli.config.as_deref())?;

	match cli.command {
		Commands::Scan(args) => scan::execute(args, &config, format).await,
		Commands::Project(args) => project::execute(args, &config, format),
		Commands::Classify(args) => classify::execute(args, format),
	}
}

/// Reads `path`, or stdin when no path is given.
fn read_input(path: Option<&Path>) -> Result<String> {
	let content = match path {
		Some(path) => std::fs::read_to_string(path)
			.with_context(|| format!("failed to read {}", path.display()))?,
		None => {
			let mut buf = String::new();
			std::io::stdin()
				.read_to_string(&mut buf)
				.context("failed to read stdin")?;
			buf
		}
	};
	Ok(content)
}
