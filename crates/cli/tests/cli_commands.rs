//! End-to-end tests running the `fitscan` binary.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::{Value, json};

fn fitscan(workdir: &Path) -> Command {
	let mut cmd = Command::new(env!("CARGO_BIN_EXE_fitscan"));
	cmd.current_dir(workdir)
		.env("XDG_CONFIG_HOME", workdir)
		.env_remove("FITSCAN_CONFIG")
		.env_remove("FITSCAN_ENDPOINT")
		.env_remove("RUST_LOG");
	cmd
}

fn run_with_stdin(mut cmd: Command, stdin: &str) -> Output {
	let mut child = cmd
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.expect("failed to spawn fitscan");
	child
		.stdin
		.take()
		.unwrap()
		.write_all(stdin.as_bytes())
		.unwrap();
	child.wait_with_output().unwrap()
}

fn stdout_json(output: &Output) -> Value {
	let stdout = String::from_utf8_lossy(&output.stdout);
	serde_json::from_str(&stdout).unwrap_or_else(|_| json!({ "raw": stdout }))
}

fn pose_message() -> String {
	let entries: Vec<_> = (0..17).map(|_| json!([320, 240, 0.8])).collect();
	json!({ "keypoints": entries }).to_string()
}

#[test]
fn classify_reads_stdin() {
	let dir = tempfile::tempdir().unwrap();
	let mut cmd = fitscan(dir.path());
	cmd.args(["-f", "json", "classify"]);

	let output = run_with_stdin(cmd, "{\"a4_detected\": true}\n{\"error\": \"no person\"}\n");

	assert!(output.status.success());
	let value = stdout_json(&output);
	assert_eq!(value["ok"], json!(true));
	assert_eq!(value["command"], json!("classify"));
	assert_eq!(value["data"]["messages"][0]["kind"], json!("marker_detection"));
	assert_eq!(value["data"]["messages"][1]["kind"], json!("error"));
}

#[test]
fn project_uses_config_display() {
	let dir = tempfile::tempdir().unwrap();
	std::fs::write(
		dir.path().join("fitscan.json"),
		r#"{"display": {"width": 640, "height": 480}}"#,
	)
	.unwrap();
	let pose = dir.path().join("pose.json");
	std::fs::write(&pose, pose_message()).unwrap();

	let output = fitscan(dir.path())
		.args(["-f", "json", "project"])
		.arg(&pose)
		.output()
		.unwrap();

	assert!(output.status.success());
	let value = stdout_json(&output);
	assert_eq!(value["data"]["display"], json!({"width": 640.0, "height": 480.0}));
	assert_eq!(
		value["data"]["overlay"]["markers"][0]["center"],
		json!({"x": 320.0, "y": 240.0})
	);
	assert_eq!(
		value["data"]["overlay"]["segments"].as_array().unwrap().len(),
		18
	);
}

#[test]
fn project_rejects_non_keypoint_message() {
	let dir = tempfile::tempdir().unwrap();
	let mut cmd = fitscan(dir.path());
	cmd.args(["-f", "json", "project", "--display", "800x600"]);

	let output = run_with_stdin(cmd, r#"{"disclaimer": "hello"}"#);

	assert_eq!(output.status.code(), Some(2));
	let value = stdout_json(&output);
	assert_eq!(value["ok"], json!(false));
	assert_eq!(value["error"]["code"], json!("INVALID_INPUT"));
}

#[test]
fn scan_rejects_http_endpoint() {
	let dir = tempfile::tempdir().unwrap();
	let output = fitscan(dir.path())
		.args(["-f", "json", "scan", "--endpoint", "http://127.0.0.1:8000/ws"])
		.output()
		.unwrap();

	assert_eq!(output.status.code(), Some(2));
	let value = stdout_json(&output);
	assert_eq!(value["command"], json!("scan"));
	assert_eq!(value["error"]["code"], json!("CONFIG_ERROR"));
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("scheme must be ws or wss"));
}

#[test]
fn missing_explicit_config_is_reported() {
	let dir = tempfile::tempdir().unwrap();
	let output = fitscan(dir.path())
		.args(["--config", "absent.json", "classify"])
		.stdin(Stdio::null())
		.output()
		.unwrap();

	assert_eq!(output.status.code(), Some(2));
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("CONFIG_ERROR"));
	assert!(stderr.contains("absent.json"));
}

#[test]
fn scan_gives_up_on_unreachable_service() {
	let port = {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		listener.local_addr().unwrap().port()
	};
	let dir = tempfile::tempdir().unwrap();
	let endpoint = format!("ws://127.0.0.1:{port}/ws");

	let output = fitscan(dir.path())
		.args(["-f", "json", "scan", "--endpoint", &endpoint])
		.output()
		.unwrap();

	assert_eq!(output.status.code(), Some(1));
	let stdout = String::from_utf8_lossy(&output.stdout);
	let reconnects = stdout
		.lines()
		.filter(|line| line.contains("\"type\":\"reconnecting\""))
		.count();
	assert_eq!(reconnects, 3);
	assert!(stdout.contains(&format!(
		"Unable to connect to {endpoint} after 3 attempts."
	)));
	assert!(stdout.contains("\"code\": \"CONNECTION_FAILED\""));
}
