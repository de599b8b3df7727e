use clap::Parser;
use fitscan_cli::cli::Cli;
use fitscan_cli::error::CliError;
use fitscan_cli::output::{self, OutputFormat};
use fitscan_cli::{commands, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	if let Err(err) = commands::dispatch(cli).await {
		handle_error(&err, command, format);
		std::process::exit(err.exit_code());
	}
}

fn handle_error(err: &CliError, command: &str, format: OutputFormat) {
	let cmd_error = err.to_command_error();

	output::print_error_stderr(&cmd_error);
	output::print_failure(command, &cmd_error, format);
}
