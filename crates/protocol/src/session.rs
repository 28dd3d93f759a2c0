use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of execution surface a session belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
	/// Notebook backed by a kernel session.
	Notebook,
	/// Console backed by a kernel session.
	Console,
	/// No active execution session.
	#[default]
	None,
}

impl SessionType {
	pub const ALL: [SessionType; 3] = [SessionType::Notebook, SessionType::Console, SessionType::None];

	pub fn as_str(&self) -> &'static str {
		match self {
			SessionType::Notebook => "notebook",
			SessionType::Console => "console",
			SessionType::None => "none",
		}
	}

	/// Returns `true` unless this is [`SessionType::None`].
	pub fn has_session(&self) -> bool {
		!matches!(self, SessionType::None)
	}
}

impl fmt::Display for SessionType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when parsing an unknown session type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSessionTypeError(pub String);

impl fmt::Display for ParseSessionTypeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown session type: {}", self.0)
	}
}

impl std::error::Error for ParseSessionTypeError {}

impl FromStr for SessionType {
	type Err = ParseSessionTypeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"notebook" => Ok(SessionType::Notebook),
			"console" => Ok(SessionType::Console),
			"none" => Ok(SessionType::None),
			other => Err(ParseSessionTypeError(other.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_lowercase_names() {
		for kind in SessionType::ALL {
			assert_eq!(kind.as_str().parse::<SessionType>(), Ok(kind));
		}
	}

	#[test]
	fn rejects_unknown_names() {
		let err = "kernel".parse::<SessionType>().unwrap_err();
		assert_eq!(err.to_string(), "unknown session type: kernel");
		assert!("Notebook".parse::<SessionType>().is_err());
	}

	#[test]
	fn serializes_lowercase() {
		assert_eq!(serde_json::to_string(&SessionType::Console).unwrap(), "\"console\"");
		let back: SessionType = serde_json::from_str("\"none\"").unwrap();
		assert_eq!(back, SessionType::None);
	}

	#[test]
	fn default_has_no_session() {
		assert_eq!(SessionType::default(), SessionType::None);
		assert!(!SessionType::default().has_session());
		assert!(SessionType::Notebook.has_session());
	}
}
