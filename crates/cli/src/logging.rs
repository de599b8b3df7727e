use tracing_subscriber::EnvFilter;

/// Default filter directives for a `-v` count.
///
/// Connection faults already reach the user as notices, so the runtime stays
/// quiet until `-vv`.
pub fn default_directives(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "warn,fitscan_runtime=off",
		1 => "warn,fitscan=info,fitscan_cli=info,fitscan_runtime=warn",
		2 => "warn,fitscan=debug,fitscan_cli=debug,fitscan_protocol=debug,fitscan_runtime=debug",
		_ => "debug",
	}
}

/// Installs the stderr subscriber. `RUST_LOG` overrides the `-v` count.
pub fn init_logging(verbosity: u8) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbosity > 1)
		.without_time()
		.compact()
		.init();
}
