//! The [`Debugger`] wiring root.
//!
//! Owns the single [`BreakpointCoordinator`] and every component that reports
//! into it or reads from it, and exposes the host-facing commands.

use std::sync::Arc;

use kdbg_protocol::{Breakpoint, HostEvent, SessionDescriptor, SourceId, SurfaceKind};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::DebuggerConfig;
use crate::coordinator::{BreakpointCoordinator, Snapshot, Toggle};
use crate::error::{Error, Result};
use crate::focus::{self, FocusRouter};
use crate::handlers::Subscription;
use crate::host::{Area, Console, Editor, FocusChange, Notebook, Shell, SurfaceCollection, Widget};
use crate::panel::{DebuggerModel, DebuggerPanel, PanelTracker, Sidebar};
use crate::state::StateDb;
use crate::tracker::{ConsoleTracker, EditorTracker, NotebookTracker, SurfaceState};

/// Host command identifiers.
pub mod command_ids {
	pub const CREATE: &str = "debugger:create";
	pub const DEBUG_CONSOLE: &str = "debugger:debug-console";
	pub const DEBUG_FILE: &str = "debugger:debug-file";
	pub const DEBUG_NOTEBOOK: &str = "debugger:debug-notebook";
}

/// What applying one [`HostEvent`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Outcome {
	Applied,
	BreakpointSet { breakpoint: Breakpoint },
	BreakpointCleared { breakpoint: Breakpoint },
	/// Queued behind an in-flight notification round.
	Deferred,
	/// A command ran; `panel` names the debugger panel it returned, if any.
	Command { panel: Option<String> },
}

impl From<Toggle> for Outcome {
	fn from(toggle: Toggle) -> Self {
		match toggle {
			Toggle::Set(breakpoint) => Outcome::BreakpointSet { breakpoint },
			Toggle::Cleared(breakpoint) => Outcome::BreakpointCleared { breakpoint },
			Toggle::Deferred => Outcome::Deferred,
		}
	}
}

macro_rules! with_collection {
	($self:ident, $kind:expr, |$collection:ident| $body:expr) => {
		match $kind {
			SurfaceKind::Notebook => {
				let $collection = &$self.notebooks;
				$body
			}
			SurfaceKind::Console => {
				let $collection = &$self.consoles;
				$body
			}
			SurfaceKind::Editor => {
				let $collection = &$self.editors;
				$body
			}
		}
	};
}

/// Debugger state for one host application.
pub struct Debugger {
	config: DebuggerConfig,
	coordinator: BreakpointCoordinator,
	shell: Shell,
	notebooks: SurfaceCollection<Notebook>,
	consoles: SurfaceCollection<Console>,
	editors: SurfaceCollection<Editor>,
	notebook_tracker: NotebookTracker,
	console_tracker: ConsoleTracker,
	editor_tracker: EditorTracker,
	panels: Arc<PanelTracker>,
	sidebar: Arc<Sidebar>,
	state: Arc<dyn StateDb>,
	_focus: FocusRouter,
	_subscriptions: Vec<Subscription>,
}

impl Debugger {
	/// Builds the debugger, attaches the sidebar, and restores saved panels.
	///
	/// A saved panel list that cannot be read is logged and skipped.
	pub fn new(config: DebuggerConfig, state: Arc<dyn StateDb>) -> Result<Self> {
		let coordinator = BreakpointCoordinator::new();
		let shell = Shell::new();
		let notebooks = SurfaceCollection::new();
		let consoles = SurfaceCollection::new();
		let editors = SurfaceCollection::new();

		let notebook_tracker = NotebookTracker::new(&notebooks, coordinator.clone());
		let console_tracker = ConsoleTracker::new(&consoles, coordinator.clone());
		let editor_tracker = EditorTracker::new(&editors, coordinator.clone());
		let focus = FocusRouter::new(&shell, coordinator.clone());

		let panels = Arc::new(PanelTracker::new(config.panels.namespace.clone()));
		let sidebar = Sidebar::new(&config.sidebar);

		let follow_current = {
			let sidebar = Arc::clone(&sidebar);
			panels
				.current_changed()
				.connect(move |current: &Option<Arc<DebuggerPanel>>| {
					sidebar.set_model(current.as_ref().map(|panel| Arc::clone(panel.model())));
				})
		};
		let focus_panel = {
			let panels = Arc::clone(&panels);
			shell.current_changed().connect(move |change: &FocusChange| {
				if let Some(widget) = &change.new {
					panels.set_current_widget(widget.id());
				}
			})
		};

		shell.add(sidebar.clone(), config.sidebar.area, config.sidebar.activate);

		let debugger = Self {
			config,
			coordinator,
			shell,
			notebooks,
			consoles,
			editors,
			notebook_tracker,
			console_tracker,
			editor_tracker,
			panels,
			sidebar,
			state,
			_focus: focus,
			_subscriptions: vec![follow_current, focus_panel],
		};

		if debugger.config.panels.restore {
			debugger.restore_panels()?;
		}
		info!(target: "kdbg.panels", panels = debugger.panels.len(), "debugger ready");
		Ok(debugger)
	}

	fn restore_panels(&self) -> Result<()> {
		let ids = match self.panels.saved_ids(self.state.as_ref()) {
			Ok(ids) => ids,
			Err(err) => {
				warn!(target: "kdbg.panels", namespace = self.panels.namespace(), error = %err, "ignoring unreadable panel state");
				return Ok(());
			}
		};
		for id in ids {
			debug!(target: "kdbg.panels", panel = %id, "restoring panel");
			self.execute(command_ids::CREATE, &serde_json::json!({ "id": id }))?;
		}
		Ok(())
	}

	/// Opens a surface and attaches it to the main area without focusing it.
	///
	/// Surface ids share the shell's widget namespace, so an id held by any
	/// other widget is rejected.
	pub fn open_surface(
		&self,
		kind: SurfaceKind,
		id: &str,
		units: Vec<String>,
		session: Option<SessionDescriptor>,
	) -> Result<()> {
		if with_collection!(self, kind, |c| c.get(id).is_some()) {
			return Err(Error::DuplicateSurface {
				kind,
				surface: id.to_string(),
			});
		}
		if self.shell.widget(id).is_some() {
			warn!(target: "kdbg.host", %kind, surface = id, "shell widget id already in use");
			return Err(Error::WidgetInUse(id.to_string()));
		}
		let widget: Option<Arc<dyn Widget>> =
			with_collection!(self, kind, |c| c.open(id, units, session).map(|s| s as Arc<dyn Widget>));
		let widget = widget.ok_or_else(|| Error::DuplicateSurface {
			kind,
			surface: id.to_string(),
		})?;
		self.shell.add(widget, Area::Main, false);
		Ok(())
	}

	/// Disposes a surface and detaches it from the shell.
	pub fn close_surface(&self, kind: SurfaceKind, id: &str) -> Result<()> {
		let closed = with_collection!(self, kind, |c| c.dispose(id).is_some());
		if !closed {
			return Err(unknown_surface(kind, id));
		}
		self.shell.remove(id);
		Ok(())
	}

	/// Attaches, replaces, or removes a surface's session.
	///
	/// If the surface is focused, the active session type follows the change.
	pub fn change_session(&self, kind: SurfaceKind, id: &str, session: Option<SessionDescriptor>) -> Result<()> {
		let changed = with_collection!(self, kind, |c| c.set_session(id, session).is_some());
		if !changed {
			return Err(unknown_surface(kind, id));
		}
		if let Some(current) = self.shell.current() {
			if current.id() == id {
				focus::route(&self.coordinator, Some(&*current));
			}
		}
		Ok(())
	}

	pub fn change_units(&self, kind: SurfaceKind, id: &str, units: Vec<String>) -> Result<()> {
		let changed = with_collection!(self, kind, |c| c.set_units(id, units).is_some());
		if !changed {
			return Err(unknown_surface(kind, id));
		}
		Ok(())
	}

	/// Focuses a shell widget, or clears focus with `None`.
	pub fn focus(&self, widget: Option<&str>) -> Result<()> {
		match widget {
			None => {
				self.shell.clear_focus();
				Ok(())
			}
			Some(id) if self.shell.activate(id) => Ok(()),
			Some(id) => Err(Error::UnknownWidget(id.to_string())),
		}
	}

	pub fn toggle_breakpoint(&self, source_id: impl Into<SourceId>, line: u32) -> Result<Toggle> {
		self.coordinator.toggle_breakpoint(source_id, line)
	}

	/// Records a session acknowledgement. Acknowledgements for breakpoints
	/// that no longer exist are logged and dropped.
	pub fn set_verified(&self, source_id: impl Into<SourceId>, line: u32, verified: bool) -> Result<()> {
		match self.coordinator.set_verified(source_id, line, verified) {
			Err(err) if err.is_soft() => {
				debug!(target: "kdbg.coordinator", error = %err, "stale acknowledgement ignored");
				Ok(())
			}
			other => other,
		}
	}

	/// Runs a host command. Returns the debugger panel it produced, if any.
	pub fn execute(&self, command: &str, args: &Value) -> Result<Option<Arc<DebuggerPanel>>> {
		debug!(target: "kdbg.panels", command, %args, "execute command");
		match command {
			command_ids::CREATE => {
				let id = args
					.get("id")
					.and_then(Value::as_str)
					.filter(|id| !id.is_empty())
					.ok_or(Error::MissingArgument {
						command: command_ids::CREATE,
						name: "id",
					})?;
				self.create_panel(id).map(Some)
			}
			command_ids::DEBUG_CONSOLE => self.debug_current(SurfaceKind::Console),
			command_ids::DEBUG_FILE => self.debug_current(SurfaceKind::Editor),
			command_ids::DEBUG_NOTEBOOK => self.debug_current(SurfaceKind::Notebook),
			other => Err(Error::UnknownCommand(other.to_string())),
		}
	}

	/// Returns the panel for `id`, creating, attaching, and persisting it if
	/// it is not open yet.
	pub fn create_panel(&self, id: &str) -> Result<Arc<DebuggerPanel>> {
		if let Some(existing) = self.panels.find(id) {
			debug!(target: "kdbg.panels", panel = id, "panel already open");
			return Ok(existing);
		}
		let panel = DebuggerPanel::new(DebuggerModel::new(id, &self.coordinator));
		self.shell.add(panel.clone(), Area::Main, false);
		self.panels.add(Arc::clone(&panel));
		self.panels.save(self.state.as_ref())?;
		info!(target: "kdbg.panels", panel = id, "debugger panel created");
		Ok(panel)
	}

	/// Opens the debugger panel for the focused surface if it belongs to `kind`.
	pub fn debug_current(&self, kind: SurfaceKind) -> Result<Option<Arc<DebuggerPanel>>> {
		let Some(current) = self.shell.current().filter(|w| w.surface_kind() == Some(kind)) else {
			debug!(target: "kdbg.panels", %kind, "no focused surface to debug");
			return Ok(None);
		};
		self.create_panel(current.id()).map(Some)
	}

	/// Closes a debugger panel and persists the remaining list.
	pub fn close_panel(&self, id: &str) -> Result<bool> {
		let Some(panel) = self.panels.close(id) else {
			return Ok(false);
		};
		self.shell.remove(Widget::id(&*panel));
		self.panels.save(self.state.as_ref())?;
		Ok(true)
	}

	/// Applies one scripted host event.
	pub fn apply(&self, event: &HostEvent) -> Result<Outcome> {
		match event {
			HostEvent::SurfaceOpened {
				kind,
				surface,
				units,
				session,
			} => self.open_surface(*kind, surface, units.clone(), session.clone())?,
			HostEvent::SurfaceClosed { kind, surface } => self.close_surface(*kind, surface)?,
			HostEvent::SessionChanged { kind, surface, session } => {
				self.change_session(*kind, surface, session.clone())?
			}
			HostEvent::UnitsChanged { kind, surface, units } => self.change_units(*kind, surface, units.clone())?,
			HostEvent::Focus { widget } => self.focus(widget.as_deref())?,
			HostEvent::ToggleBreakpoint { source, line } => {
				return self.toggle_breakpoint(source.clone(), *line).map(Outcome::from);
			}
			HostEvent::Verified { source, line, verified } => self.set_verified(source.clone(), *line, *verified)?,
			HostEvent::Command { id, args } => {
				let panel = self.execute(id, args)?;
				return Ok(Outcome::Command {
					panel: panel.map(|p| p.id().to_string()),
				});
			}
		}
		Ok(Outcome::Applied)
	}

	pub fn snapshot(&self) -> Snapshot {
		self.coordinator.snapshot()
	}

	/// Tracker view of a surface's registration.
	pub fn surface_state(&self, kind: SurfaceKind, id: &str) -> Option<SurfaceState> {
		match kind {
			SurfaceKind::Notebook => self.notebook_tracker.state(id),
			SurfaceKind::Console => self.console_tracker.state(id),
			SurfaceKind::Editor => self.editor_tracker.state(id),
		}
	}

	pub fn config(&self) -> &DebuggerConfig {
		&self.config
	}

	pub fn coordinator(&self) -> &BreakpointCoordinator {
		&self.coordinator
	}

	pub fn shell(&self) -> &Shell {
		&self.shell
	}

	pub fn panels(&self) -> &PanelTracker {
		&self.panels
	}

	pub fn sidebar(&self) -> &Arc<Sidebar> {
		&self.sidebar
	}

	pub fn notebooks(&self) -> &SurfaceCollection<Notebook> {
		&self.notebooks
	}

	pub fn consoles(&self) -> &SurfaceCollection<Console> {
		&self.consoles
	}

	pub fn editors(&self) -> &SurfaceCollection<Editor> {
		&self.editors
	}
}

impl std::fmt::Debug for Debugger {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Debugger")
			.field("coordinator", &self.coordinator)
			.field("panels", &self.panels)
			.field("sidebar", &self.sidebar)
			.finish()
	}
}

fn unknown_surface(kind: SurfaceKind, id: &str) -> Error {
	Error::UnknownSurface {
		kind,
		surface: id.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use kdbg_protocol::SessionType;
	use serde_json::json;

	use super::*;
	use crate::state::MemoryStateDb;

	fn debugger() -> Debugger {
		Debugger::new(DebuggerConfig::default(), Arc::new(MemoryStateDb::new())).unwrap()
	}

	fn kernel(id: &str, kind: SessionType) -> Option<SessionDescriptor> {
		Some(SessionDescriptor { id: id.into(), kind })
	}

	#[test]
	fn sidebar_is_attached_unfocused() {
		let debugger = debugger();
		assert_eq!(debugger.shell().area_of("jp-debugger-sidebar"), Some(Area::Right));
		assert!(debugger.shell().current().is_none());
		assert!(debugger.sidebar().model().is_none());
	}

	#[test]
	fn create_requires_id() {
		let debugger = debugger();
		let err = debugger.execute(command_ids::CREATE, &json!({})).unwrap_err();
		assert!(matches!(err, Error::MissingArgument { name: "id", .. }));
		assert!(matches!(
			debugger.execute("debugger:explode", &Value::Null),
			Err(Error::UnknownCommand(_))
		));
	}

	#[test]
	fn create_is_idempotent() {
		let debugger = debugger();
		let first = debugger.execute(command_ids::CREATE, &json!({"id": "main"})).unwrap().unwrap();
		let second = debugger.execute(command_ids::CREATE, &json!({"id": "main"})).unwrap().unwrap();
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(debugger.panels().ids(), vec!["main"]);
		assert_eq!(debugger.shell().widgets_in(Area::Main), vec!["debugger:main"]);
	}

	#[test]
	fn focusing_session_widget_changes_active_type() {
		let debugger = debugger();
		debugger
			.open_surface(SurfaceKind::Console, "c-1", vec!["1".into()], kernel("k1", SessionType::Console))
			.unwrap();
		debugger.focus(Some("c-1")).unwrap();
		assert_eq!(debugger.coordinator().active_session_type(), SessionType::Console);

		debugger
			.change_session(SurfaceKind::Console, "c-1", kernel("k2", SessionType::Notebook))
			.unwrap();
		assert_eq!(debugger.coordinator().active_session_type(), SessionType::Notebook);

		assert!(matches!(debugger.focus(Some("missing")), Err(Error::UnknownWidget(_))));
		debugger.focus(None).unwrap();
		assert_eq!(debugger.coordinator().active_session_type(), SessionType::None);
	}

	#[test]
	fn duplicate_and_unknown_surfaces_are_errors() {
		let debugger = debugger();
		debugger.open_surface(SurfaceKind::Editor, "/a.py", vec!["/a.py".into()], None).unwrap();
		assert!(matches!(
			debugger.open_surface(SurfaceKind::Editor, "/a.py", vec![], None),
			Err(Error::DuplicateSurface { .. })
		));
		assert!(matches!(
			debugger.close_surface(SurfaceKind::Notebook, "/a.py"),
			Err(Error::UnknownSurface { .. })
		));
		assert_eq!(
			debugger.surface_state(SurfaceKind::Editor, "/a.py"),
			Some(SurfaceState::Registered(SessionType::None))
		);
	}

	#[test]
	fn surface_ids_are_unique_across_families() {
		let debugger = debugger();
		let notebook = Some(SessionDescriptor {
			id: "k1".into(),
			kind: SessionType::Notebook,
		});
		debugger.open_surface(SurfaceKind::Notebook, "x", vec!["cell-1".into()], notebook).unwrap();

		assert!(matches!(
			debugger.open_surface(SurfaceKind::Console, "x", vec!["1".into()], None),
			Err(Error::WidgetInUse(ref id)) if id == "x"
		));
		assert!(debugger.consoles().get("x").is_none());
		assert!(matches!(
			debugger.close_surface(SurfaceKind::Console, "x"),
			Err(Error::UnknownSurface { .. })
		));

		debugger.focus(Some("x")).unwrap();
		assert_eq!(debugger.coordinator().active_session_type(), SessionType::Notebook);

		let sidebar_id = debugger.config().sidebar.id.clone();
		assert!(matches!(
			debugger.open_surface(SurfaceKind::Editor, &sidebar_id, vec![], None),
			Err(Error::WidgetInUse(_))
		));
	}

	#[test]
	fn stale_acknowledgement_is_swallowed() {
		let debugger = debugger();
		debugger.set_verified("console:1", 2, true).unwrap();
		assert!(matches!(
			debugger.toggle_breakpoint("console:1", 2),
			Err(Error::InvalidSource { .. })
		));
	}
}
