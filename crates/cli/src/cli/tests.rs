use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn parse_scan_defaults() {
	let cli = Cli::try_parse_from(["fitscan", "scan"]).unwrap();

	assert_eq!(cli.verbose, 0);
	assert_eq!(cli.format, OutputFormat::Text);
	assert!(cli.config.is_none());
	match cli.command {
		Commands::Scan(args) => {
			assert!(args.endpoint.is_none());
			assert!(args.frames_dir.is_none());
			assert!(args.display.is_none());
		}
		_ => panic!("Expected Scan command"),
	}
}

#[test]
fn parse_scan_with_options() {
	let args = vec![
		"fitscan",
		"scan",
		"--endpoint",
		"ws://10.0.0.5:8000/ws",
		"--frames-dir",
		"/tmp/frames",
		"--display",
		"390x844",
	];
	let cli = Cli::try_parse_from(args).unwrap();

	match cli.command {
		Commands::Scan(args) => {
			assert_eq!(args.endpoint.as_deref(), Some("ws://10.0.0.5:8000/ws"));
			assert_eq!(args.frames_dir, Some(PathBuf::from("/tmp/frames")));
			assert_eq!(args.display, Some(DisplaySize::new(390.0, 844.0)));
		}
		_ => panic!("Expected Scan command"),
	}
}

#[test]
fn parse_rejects_bad_display() {
	let err = Cli::try_parse_from(["fitscan", "scan", "--display", "wide"]).unwrap_err();
	assert!(err.to_string().contains("invalid display size"));
}

#[test]
fn parse_project_from_file() {
	let cli = Cli::try_parse_from(["fitscan", "project", "--display", "1280x960", "pose.json"])
		.unwrap();

	match cli.command {
		Commands::Project(args) => {
			assert_eq!(args.display, Some(DisplaySize::new(1280.0, 960.0)));
			assert_eq!(args.file, Some(PathBuf::from("pose.json")));
		}
		_ => panic!("Expected Project command"),
	}
}

#[test]
fn parse_classify_from_stdin() {
	let cli = Cli::try_parse_from(["fitscan", "classify"]).unwrap();

	match cli.command {
		Commands::Classify(args) => assert!(args.file.is_none()),
		_ => panic!("Expected Classify command"),
	}
}

#[test]
fn parse_global_flags_after_subcommand() {
	let cli = Cli::try_parse_from([
		"fitscan",
		"classify",
		"-vv",
		"--format",
		"json",
		"--config",
		"custom.json",
	])
	.unwrap();

	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.format, OutputFormat::Json);
	assert_eq!(cli.config, Some(PathBuf::from("custom.json")));
}
