//! Structured output envelope for all CLI commands.
//!
//! ## Output Contract
//!
//! Every command produces a result envelope on stdout:
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "ok": true,
//!   "command": "replay",
//!   "data": { ... },
//!   "timings": { "durationMs": 3 }
//! }
//! ```
//!
//! On failure:
//!
//! ```json
//! {
//!   "ok": false,
//!   "command": "replay",
//!   "error": {
//!     "code": "INVALID_SOURCE",
//!     "message": "source is not registered: nb:cell-9",
//!     "details": { "line": 4 }
//!   }
//! }
//! ```


use std::io::{self, Write};
use std::time::{Duration, Instant};

use kdbg::{Outcome, SessionType, Snapshot};
use serde::{Deserialize, Serialize};

/// Current schema version for command output.
///
/// Increment this when making breaking changes to the output structure.
pub const SCHEMA_VERSION: u32 = 1;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Pretty-printed JSON envelope
	#[default]
	Json,
	/// Human-readable text
	Text,
}

/// The result envelope returned by every command.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub schema_version: Option<u32>,

	pub ok: bool,

	/// Command name (e.g., "replay", "panels.list")
	pub command: String,

	/// Command-specific result data (only present on success)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,

	/// Error information (only present on failure)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub timings: Option<Timings>,

	/// Non-fatal problems (events skipped with `--keep-going`, ignored state)
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub diagnostics: Vec<Diagnostic>,
}

/// Error information for failed commands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,

	pub message: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Standardized error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Breakpoint operation on a source no surface registered
	InvalidSource,
	/// Malformed script line or argument
	InvalidInput,
	/// Surface, widget, or breakpoint does not exist
	NotFound,
	/// Host command id is not known
	UnknownCommand,
	/// Persisted state could not be read or written
	StateError,
	/// Configuration file could not be loaded
	ConfigError,
	/// File I/O error
	IoError,
}

impl ErrorCode {
	/// Wire name, identical to the serialized form.
	pub fn as_str(self) -> &'static str {
		match self {
			ErrorCode::InvalidSource => "INVALID_SOURCE",
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::NotFound => "NOT_FOUND",
			ErrorCode::UnknownCommand => "UNKNOWN_COMMAND",
			ErrorCode::StateError => "STATE_ERROR",
			ErrorCode::ConfigError => "CONFIG_ERROR",
			ErrorCode::IoError => "IO_ERROR",
		}
	}
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

impl From<Duration> for Timings {
	fn from(duration: Duration) -> Self {
		Timings {
			duration_ms: duration.as_millis() as u64,
		}
	}
}

/// Diagnostic messages (skipped events, ignored state)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
	pub level: DiagnosticLevel,

	pub message: String,

	/// Script line the diagnostic refers to, if any
	#[serde(skip_serializing_if = "Option::is_none")]
	pub line: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
	Info,
	Warning,
	Error,
}

/// Builder for constructing command results
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
	diagnostics: Vec<Diagnostic>,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
			diagnostics: Vec::new(),
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	/// Marks the result failed. `details` carries structured context such as the script line.
	pub fn error(mut self, code: ErrorCode, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
		self.error = Some(CommandError {
			code,
			message: message.into(),
			details,
		});
		self
	}

	pub fn diagnostics(mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) -> Self {
		self.diagnostics.extend(diagnostics);
		self
	}

	pub fn build(self) -> CommandResult<T> {
		let ok = self.error.is_none() && self.data.is_some();

		CommandResult {
			schema_version: Some(SCHEMA_VERSION),
			ok,
			command: self.command,
			data: self.data,
			error: self.error,
			timings: Some(Timings::from(self.start_time.elapsed())),
			diagnostics: self.diagnostics,
		}
	}
}

/// Print a command result to stdout in the specified format
pub fn print_result<T: Serialize + TextOutput>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => {
			print_result_text(result);
		}
	}
}

/// Human-readable rendering of command data.
pub trait TextOutput {
	fn write_text(&self, out: &mut dyn Write) -> io::Result<()>;
}

impl TextOutput for () {
	fn write_text(&self, _out: &mut dyn Write) -> io::Result<()> {
		Ok(())
	}
}

fn print_result_text<T: Serialize + TextOutput>(result: &CommandResult<T>) {
	let mut stdout = io::stdout().lock();

	if result.ok {
		if let Some(ref data) = result.data {
			let _ = data.write_text(&mut stdout);
		}
	} else if let Some(ref error) = result.error {
		let _ = writeln!(stdout, "Error [{}]: {}", error.code, error.message);
	}

	for diag in &result.diagnostics {
		let prefix = match diag.level {
			DiagnosticLevel::Info => "info",
			DiagnosticLevel::Warning => "warning",
			DiagnosticLevel::Error => "error",
		};
		match diag.line {
			Some(line) => {
				let _ = writeln!(stdout, "[{prefix}] line {line}: {}", diag.message);
			}
			None => {
				let _ = writeln!(stdout, "[{prefix}] {}", diag.message);
			}
		}
	}
}

/// Print an error to stderr in human-readable format
pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}

/// One applied script line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStep {
	pub line: usize,
	pub event: &'static str,
	#[serde(flatten)]
	pub outcome: Outcome,
}

/// Result data for the replay command
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayData {
	/// Events applied successfully
	pub applied: usize,
	/// Events that failed and were skipped (`--keep-going`)
	pub failed: usize,
	pub active_session_type: SessionType,
	/// Open debugger panels, in creation order
	pub panels: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub current_panel: Option<String>,
	pub snapshot: Snapshot,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub steps: Vec<ReplayStep>,
}

impl TextOutput for ReplayData {
	fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
		for step in &self.steps {
			writeln!(out, "{:>4}  {:<18} {}", step.line, step.event, describe(&step.outcome))?;
		}
		writeln!(
			out,
			"applied {} event(s), {} failed; active session: {}",
			self.applied, self.failed, self.active_session_type
		)?;
		for (source_id, breakpoints) in &self.snapshot.breakpoints {
			for bp in breakpoints {
				let mark = if bp.verified { "verified" } else { "pending" };
				writeln!(out, "  {source_id}:{}  [{}] {mark}", bp.line, bp.session_type)?;
			}
		}
		if !self.panels.is_empty() {
			writeln!(out, "panels: {}", self.panels.join(", "))?;
		}
		Ok(())
	}
}

fn describe(outcome: &Outcome) -> String {
	match outcome {
		Outcome::Applied => "ok".to_string(),
		Outcome::BreakpointSet { breakpoint } => format!("set {}:{}", breakpoint.source_id, breakpoint.line),
		Outcome::BreakpointCleared { breakpoint } => {
			format!("cleared {}:{}", breakpoint.source_id, breakpoint.line)
		}
		Outcome::Deferred => "deferred".to_string(),
		Outcome::Command { panel: Some(panel) } => format!("panel {panel}"),
		Outcome::Command { panel: None } => "no-op".to_string(),
	}
}

/// Result data for the panels commands
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelsData {
	pub namespace: String,
	pub panels: Vec<String>,
	/// Whether saved state was removed (`panels clear` only)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub cleared: Option<bool>,
}

impl TextOutput for PanelsData {
	fn write_text(&self, out: &mut dyn Write) -> io::Result<()> {
		if let Some(cleared) = self.cleared {
			let verb = if cleared { "cleared" } else { "nothing to clear in" };
			return writeln!(out, "{verb} {}", self.namespace);
		}
		if self.panels.is_empty() {
			return writeln!(out, "no saved panels");
		}
		for panel in &self.panels {
			writeln!(out, "{panel}")?;
		}
		Ok(())
	}
}
