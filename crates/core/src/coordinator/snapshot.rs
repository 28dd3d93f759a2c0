//! Immutable views of coordinator state handed to subscribers.

use std::collections::BTreeMap;

use kdbg_protocol::{Breakpoint, SessionType, SourceId};
use serde::Serialize;

/// The mutation that produced a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Change {
	/// Snapshot taken on request rather than in response to a mutation.
	Current,
	ActiveSessionType {
		session_type: SessionType,
	},
	Registered {
		source_id: SourceId,
		session_type: SessionType,
		#[serde(skip_serializing_if = "Option::is_none")]
		previous: Option<SessionType>,
	},
	Unregistered {
		source_id: SourceId,
		removed: usize,
	},
	BreakpointSet {
		breakpoint: Breakpoint,
	},
	BreakpointCleared {
		breakpoint: Breakpoint,
	},
	Verified {
		source_id: SourceId,
		line: u32,
		verified: bool,
	},
	VerificationReset {
		source_id: SourceId,
		count: usize,
	},
}

/// Coordinator state at one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
	pub revision: u64,
	pub active_session_type: SessionType,
	pub change: Change,
	/// Breakpoints per source, each list ordered by line.
	pub breakpoints: BTreeMap<SourceId, Vec<Breakpoint>>,
}

impl Snapshot {
	/// Breakpoints for `source_id`, ordered by line.
	pub fn breakpoints_for(&self, source_id: &str) -> &[Breakpoint] {
		self.breakpoints.get(source_id).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn breakpoint_count(&self) -> usize {
		self.breakpoints.values().map(Vec::len).sum()
	}
}
