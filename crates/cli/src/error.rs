use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("failed to load config {}: {source:#}", .path.display())]
	Config {
		path: PathBuf,
		#[source]
		source: anyhow::Error,
	},

	#[error("script line {line}: {source}")]
	Script {
		line: usize,
		#[source]
		source: serde_json::Error,
	},

	/// An event was well-formed but the debugger rejected it.
	#[error("script line {line} ({event}): {source}")]
	Event {
		line: usize,
		event: &'static str,
		#[source]
		source: kdbg::Error,
	},

	#[error(transparent)]
	Debugger(#[from] kdbg::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

fn classify(err: &kdbg::Error) -> ErrorCode {
	match err {
		kdbg::Error::InvalidSource { .. } => ErrorCode::InvalidSource,
		kdbg::Error::InvalidLine { .. }
		| kdbg::Error::DuplicateSurface { .. }
		| kdbg::Error::WidgetInUse(_)
		| kdbg::Error::MissingArgument { .. } => ErrorCode::InvalidInput,
		kdbg::Error::NotFound { .. } | kdbg::Error::UnknownSurface { .. } | kdbg::Error::UnknownWidget(_) => {
			ErrorCode::NotFound
		}
		kdbg::Error::UnknownCommand(_) => ErrorCode::UnknownCommand,
		kdbg::Error::Json(_) => ErrorCode::StateError,
		kdbg::Error::Io(_) => ErrorCode::IoError,
	}
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, message, details) = match self {
			CliError::Config { path, .. } => (
				ErrorCode::ConfigError,
				self.to_string(),
				Some(serde_json::json!({ "path": path })),
			),
			CliError::Script { line, source } => (
				ErrorCode::InvalidInput,
				format!("Malformed event: {source}"),
				Some(serde_json::json!({ "line": line })),
			),
			CliError::Event { line, event, source } => (
				classify(source),
				source.to_string(),
				Some(serde_json::json!({ "line": line, "event": event })),
			),
			CliError::Debugger(err) => (classify(err), err.to_string(), None),
			CliError::Io(err) => (ErrorCode::IoError, err.to_string(), None),
		};

		CommandError {
			code,
			message,
			details,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn event_errors_carry_line_and_code() {
		let err = CliError::Event {
			line: 4,
			event: "toggle_breakpoint",
			source: kdbg::Error::InvalidSource {
				source_id: "nb:cell-9".into(),
			},
		};
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::InvalidSource);
		assert_eq!(cmd.message, "source is not registered: nb:cell-9");
		assert_eq!(cmd.details.unwrap()["line"], 4);
	}

	#[test]
	fn malformed_line_is_invalid_input() {
		let source = serde_json::from_str::<kdbg::HostEvent>("{").unwrap_err();
		let cmd = CliError::Script { line: 2, source }.to_command_error();
		assert_eq!(cmd.code, ErrorCode::InvalidInput);
		assert!(cmd.message.starts_with("Malformed event"));
	}

	#[test]
	fn widget_collision_is_invalid_input() {
		let err = CliError::from(kdbg::Error::WidgetInUse("x".into()));
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::InvalidInput);
		assert_eq!(cmd.message, "widget id already in use: x");
	}

	#[test]
	fn unknown_command_code() {
		let err = CliError::from(kdbg::Error::UnknownCommand("debugger:nope".into()));
		assert_eq!(err.to_command_error().code, ErrorCode::UnknownCommand);
	}
}
