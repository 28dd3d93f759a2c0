//! End-to-end tests for the `kdbg` binary.
//!
//! Every test points `--state` into its own temp dir so runs never touch the
//! user's state file.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

fn demo_script() -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/notebook_session.ndjson")
}

/// Runs kdbg and returns (success, parsed stdout envelope, stderr).
fn run_kdbg(state: &Path, args: &[&str]) -> (bool, Value, String) {
	let output = Command::new(env!("CARGO_BIN_EXE_kdbg"))
		.args(args)
		.arg("--state")
		.arg(state)
		.output()
		.expect("Failed to execute kdbg");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	let envelope = serde_json::from_str(&stdout).unwrap_or(Value::Null);
	(output.status.success(), envelope, stderr)
}

#[test]
fn replay_demo_session() {
	let temp = TempDir::new().unwrap();
	let state = temp.path().join("state.json");
	let script = demo_script();

	let (ok, envelope, stderr) = run_kdbg(&state, &["replay", script.to_str().unwrap()]);
	assert!(ok, "replay failed: {stderr}");
	assert_eq!(envelope["ok"], true);
	assert_eq!(envelope["command"], "replay");

	let data = &envelope["data"];
	assert_eq!(data["failed"], 0);
	assert_eq!(data["activeSessionType"], "notebook");
	assert_eq!(data["panels"], serde_json::json!(["analysis.ipynb"]));

	let breakpoints = &data["snapshot"]["breakpoints"];
	assert!(breakpoints.get("console:1").is_none());
	let cell = breakpoints["nb:cell-a"].as_array().unwrap();
	assert_eq!(cell.len(), 1);
	assert_eq!(cell[0]["line"], 4);
	assert_eq!(cell[0]["verified"], false);
}

#[test]
fn panels_persist_between_runs() {
	let temp = TempDir::new().unwrap();
	let state = temp.path().join("state.json");
	let script = demo_script();

	let (ok, _, stderr) = run_kdbg(&state, &["replay", script.to_str().unwrap()]);
	assert!(ok, "replay failed: {stderr}");

	let (ok, envelope, _) = run_kdbg(&state, &["panels", "list"]);
	assert!(ok);
	assert_eq!(envelope["data"]["panels"], serde_json::json!(["analysis.ipynb"]));

	let (ok, envelope, _) = run_kdbg(&state, &["panels", "clear"]);
	assert!(ok);
	assert_eq!(envelope["data"]["cleared"], true);

	let (_, envelope, _) = run_kdbg(&state, &["panels", "list"]);
	assert_eq!(envelope["data"]["panels"], serde_json::json!([]));
}

#[test]
fn rejected_event_fails_with_structured_error() {
	let temp = TempDir::new().unwrap();
	let state = temp.path().join("state.json");
	let script = temp.path().join("bad.ndjson");
	std::fs::write(&script, "{\"event\":\"toggle_breakpoint\",\"source\":\"nb:ghost\",\"line\":2}\n").unwrap();

	let (ok, envelope, stderr) = run_kdbg(&state, &["replay", script.to_str().unwrap()]);
	assert!(!ok);
	assert!(stderr.contains("INVALID_SOURCE"), "stderr: {stderr}");
	assert_eq!(envelope["ok"], false);
	assert_eq!(envelope["error"]["code"], "INVALID_SOURCE");
	assert_eq!(envelope["error"]["details"]["line"], 1);
}
