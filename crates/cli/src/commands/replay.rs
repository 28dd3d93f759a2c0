//! Replays an NDJSON script of [`HostEvent`]s against a fresh [`Debugger`].

use kdbg::{Debugger, HostEvent, Outcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::cli::ReplayArgs;
use crate::error::{CliError, Result};
use crate::output::{Diagnostic, DiagnosticLevel, ReplayData, ReplayStep};

pub struct ReplayReport {
	pub data: ReplayData,
	pub diagnostics: Vec<Diagnostic>,
}

/// Applies every event line in order. Blank lines and `#` comments are skipped.
///
/// Stops at the first malformed or rejected line unless `--keep-going` is set,
/// in which case the failure becomes a diagnostic.
pub async fn run<R>(debugger: &Debugger, reader: R, args: &ReplayArgs) -> Result<ReplayReport>
where
	R: AsyncBufRead + Unpin,
{
	let mut lines = reader.lines();
	let mut line_no = 0usize;
	let mut applied = 0usize;
	let mut failed = 0usize;
	let mut steps = Vec::new();
	let mut diagnostics = Vec::new();

	while let Some(raw) = lines.next_line().await? {
		line_no += 1;
		let text = raw.trim();
		if text.is_empty() || text.starts_with('#') {
			continue;
		}

		let event: HostEvent = match serde_json::from_str(text) {
			Ok(event) => event,
			Err(source) if args.keep_going => {
				warn!(target: "kdbg.cli", line = line_no, error = %source, "skipping malformed event");
				diagnostics.push(Diagnostic {
					level: DiagnosticLevel::Error,
					message: format!("Malformed event: {source}"),
					line: Some(line_no),
				});
				failed += 1;
				continue;
			}
			Err(source) => return Err(CliError::Script { line: line_no, source }),
		};

		debug!(target: "kdbg.cli", line = line_no, event = event.name(), "applying");
		match debugger.apply(&event) {
			Ok(outcome) => {
				applied += 1;
				if let (HostEvent::Command { id, .. }, Outcome::Command { panel: None }) = (&event, &outcome) {
					diagnostics.push(Diagnostic {
						level: DiagnosticLevel::Info,
						message: format!("{id}: focused widget does not match, no panel opened"),
						line: Some(line_no),
					});
				}
				if args.steps {
					steps.push(ReplayStep {
						line: line_no,
						event: event.name(),
						outcome,
					});
				}
			}
			Err(source) if args.keep_going => {
				warn!(target: "kdbg.cli", line = line_no, event = event.name(), error = %source, "event rejected");
				diagnostics.push(Diagnostic {
					level: DiagnosticLevel::Warning,
					message: format!("{}: {source}", event.name()),
					line: Some(line_no),
				});
				failed += 1;
			}
			Err(source) => {
				return Err(CliError::Event {
					line: line_no,
					event: event.name(),
					source,
				});
			}
		}
	}

	info!(target: "kdbg.cli", applied, failed, "replay finished");
	let data = ReplayData {
		applied,
		failed,
		active_session_type: debugger.coordinator().active_session_type(),
		panels: debugger.panels().ids(),
		current_panel: debugger.panels().current().map(|panel| panel.id().to_string()),
		snapshot: debugger.snapshot(),
		steps,
	};
	Ok(ReplayReport { data, diagnostics })
}
