//! Host-side facts in the form they are recorded in event scripts.
//!
//! One [`HostEvent`] per line (NDJSON), tagged by `event`:
//!
//! ```json
//! {"event":"surface_opened","kind":"notebook","surface":"nb-1","units":["cell-1"],"session":{"id":"k1","type":"notebook"}}
//! {"event":"focus","widget":"nb-1"}
//! {"event":"toggle_breakpoint","source":"nb:cell-1","line":5}
//! ```

use serde::{Deserialize, Serialize};

use crate::{SessionType, SourceId};

/// Family of editing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
	Notebook,
	Console,
	Editor,
}

impl std::fmt::Display for SurfaceKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			SurfaceKind::Notebook => write!(f, "notebook"),
			SurfaceKind::Console => write!(f, "console"),
			SurfaceKind::Editor => write!(f, "editor"),
		}
	}
}

/// Execution session attached to a surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: SessionType,
}

/// A fact reported by the host environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
	/// A surface was created.
	SurfaceOpened {
		kind: SurfaceKind,
		surface: String,
		/// Addressable units (cell ids, console entry ids, or the file path).
		#[serde(default)]
		units: Vec<String>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		session: Option<SessionDescriptor>,
	},
	/// A surface was permanently disposed.
	SurfaceClosed { kind: SurfaceKind, surface: String },
	/// A surface's backing session was attached, replaced, or removed.
	SessionChanged {
		kind: SurfaceKind,
		surface: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		session: Option<SessionDescriptor>,
	},
	/// Units inside a live surface were added or removed.
	UnitsChanged {
		kind: SurfaceKind,
		surface: String,
		units: Vec<String>,
	},
	/// The shell's current widget changed. `None` clears focus.
	Focus {
		#[serde(default)]
		widget: Option<String>,
	},
	/// The user toggled a breakpoint.
	ToggleBreakpoint { source: SourceId, line: u32 },
	/// A session acknowledged (or revoked) a breakpoint.
	Verified {
		source: SourceId,
		line: u32,
		#[serde(default = "default_verified")]
		verified: bool,
	},
	/// A host command invocation.
	Command {
		id: String,
		#[serde(default)]
		args: serde_json::Value,
	},
}

fn default_verified() -> bool {
	true
}

impl HostEvent {
	/// Returns the event tag as written in scripts.
	pub fn name(&self) -> &'static str {
		match self {
			HostEvent::SurfaceOpened { .. } => "surface_opened",
			HostEvent::SurfaceClosed { .. } => "surface_closed",
			HostEvent::SessionChanged { .. } => "session_changed",
			HostEvent::UnitsChanged { .. } => "units_changed",
			HostEvent::Focus { .. } => "focus",
			HostEvent::ToggleBreakpoint { .. } => "toggle_breakpoint",
			HostEvent::Verified { .. } => "verified",
			HostEvent::Command { .. } => "command",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_surface_opened_with_session() {
		let line = r#"{"event":"surface_opened","kind":"notebook","surface":"nb-1","units":["cell-1"],"session":{"id":"k1","type":"notebook"}}"#;
		let event: HostEvent = serde_json::from_str(line).unwrap();
		match event {
			HostEvent::SurfaceOpened {
				kind,
				surface,
				units,
				session,
			} => {
				assert_eq!(kind, SurfaceKind::Notebook);
				assert_eq!(surface, "nb-1");
				assert_eq!(units, vec!["cell-1".to_string()]);
				let session = session.unwrap();
				assert_eq!(session.id, "k1");
				assert_eq!(session.kind, SessionType::Notebook);
			}
			other => panic!("Expected SurfaceOpened, got {other:?}"),
		}
	}

	#[test]
	fn verified_defaults_to_true() {
		let event: HostEvent = serde_json::from_str(r#"{"event":"verified","source":"console:1","line":2}"#).unwrap();
		assert_eq!(
			event,
			HostEvent::Verified {
				source: "console:1".into(),
				line: 2,
				verified: true,
			}
		);
	}

	#[test]
	fn focus_without_widget_clears() {
		let event: HostEvent = serde_json::from_str(r#"{"event":"focus"}"#).unwrap();
		assert_eq!(event, HostEvent::Focus { widget: None });
		assert_eq!(event.name(), "focus");
	}

	#[test]
	fn rejects_unknown_event() {
		assert!(serde_json::from_str::<HostEvent>(r#"{"event":"explode"}"#).is_err());
	}
}
