use kdbg_protocol::{SourceId, SurfaceKind};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Mutating a source unit that no surface registered. Indicates broken wiring.
	#[error("source is not registered: {source_id}")]
	InvalidSource { source_id: SourceId },

	#[error("line numbers are 1-based, got {line} for {source_id}")]
	InvalidLine { source_id: SourceId, line: u32 },

	/// No breakpoint at the given location. Expected when session
	/// acknowledgements race with toggles or disposal.
	#[error("no breakpoint at {source_id}:{line}")]
	NotFound { source_id: SourceId, line: u32 },

	#[error("unknown {kind} surface: {surface}")]
	UnknownSurface { kind: SurfaceKind, surface: String },

	#[error("{kind} surface already open: {surface}")]
	DuplicateSurface { kind: SurfaceKind, surface: String },

	#[error("widget id already in use: {0}")]
	WidgetInUse(String),

	#[error("unknown widget: {0}")]
	UnknownWidget(String),

	#[error("unknown command: {0}")]
	UnknownCommand(String),

	#[error("missing argument `{name}` for {command}")]
	MissingArgument { command: &'static str, name: &'static str },

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Returns `true` for conditions that reflect expected event races.
	///
	/// Callers log these and carry on instead of propagating them.
	pub fn is_soft(&self) -> bool {
		matches!(self, Error::NotFound { .. })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_not_found_is_soft() {
		let not_found = Error::NotFound {
			source_id: "console:1".into(),
			line: 2,
		};
		assert!(not_found.is_soft());

		let invalid = Error::InvalidSource {
			source_id: "nb:missing".into(),
		};
		assert!(!invalid.is_soft());
		assert_eq!(invalid.to_string(), "source is not registered: nb:missing");
	}
}
