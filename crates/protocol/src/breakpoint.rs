use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SessionType;

/// Identity of a line-numbered source unit.
///
/// Notebook cells are addressed `nb:<cell-id>`, console entries
/// `console:<entry-id>`, and plain files by their path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for SourceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for SourceId {
	fn from(s: &str) -> Self {
		Self(s.to_string())
	}
}

impl From<String> for SourceId {
	fn from(s: String) -> Self {
		Self(s)
	}
}

impl Borrow<str> for SourceId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl AsRef<str> for SourceId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// A user-set stop point within a source unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
	pub source_id: SourceId,
	/// 1-based line within the source unit.
	pub line: u32,
	/// Session type active when the breakpoint was created. Never rewritten.
	pub session_type: SessionType,
	/// Whether the attached session acknowledged the breakpoint as armed.
	pub verified: bool,
}

impl Breakpoint {
	/// Creates an unverified breakpoint.
	pub fn new(source_id: SourceId, line: u32, session_type: SessionType) -> Self {
		Self {
			source_id,
			line,
			session_type,
			verified: false,
		}
	}
}
