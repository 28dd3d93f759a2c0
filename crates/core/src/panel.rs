//! Debugger panels, their tracker, and the environment sidebar.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use kdbg_protocol::{Breakpoint, SessionType};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SidebarConfig;
use crate::coordinator::{BreakpointCoordinator, Snapshot};
use crate::error::Result;
use crate::handlers::Subscription;
use crate::host::Widget;
use crate::signal::Signal;
use crate::state::StateDb;

/// UI-facing view of the coordinator. Keeps the latest snapshot it was handed.
pub struct DebuggerModel {
	id: String,
	latest: RwLock<Snapshot>,
	notifications: AtomicU64,
	subscription: Mutex<Option<Subscription>>,
}

impl DebuggerModel {
	pub fn new(id: impl Into<String>, coordinator: &BreakpointCoordinator) -> Arc<Self> {
		let id = id.into();
		let latest = coordinator.snapshot();
		Arc::new_cyclic(|weak: &Weak<Self>| {
			let weak = weak.clone();
			let subscription = coordinator.subscribe(move |snapshot: &Snapshot| {
				if let Some(model) = weak.upgrade() {
					model.receive(snapshot);
				}
			});
			Self {
				id,
				latest: RwLock::new(latest),
				notifications: AtomicU64::new(0),
				subscription: Mutex::new(Some(subscription)),
			}
		})
	}

	fn receive(&self, snapshot: &Snapshot) {
		self.notifications.fetch_add(1, Ordering::Relaxed);
		*self.latest.write() = snapshot.clone();
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn snapshot(&self) -> Snapshot {
		self.latest.read().clone()
	}

	pub fn breakpoints(&self, source_id: &str) -> Vec<Breakpoint> {
		self.latest.read().breakpoints_for(source_id).to_vec()
	}

	pub fn active_session_type(&self) -> SessionType {
		self.latest.read().active_session_type
	}

	/// Number of coordinator notifications received since creation.
	pub fn notifications(&self) -> u64 {
		self.notifications.load(Ordering::Relaxed)
	}

	/// Stops listening to the coordinator. The last snapshot stays readable.
	pub fn dispose(&self) {
		if self.subscription.lock().take().is_some() {
			debug!(target: "kdbg.panels", model = %self.id, "model disposed");
		}
	}

	pub fn is_disposed(&self) -> bool {
		self.subscription.lock().is_none()
	}
}

impl std::fmt::Debug for DebuggerModel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DebuggerModel")
			.field("id", &self.id)
			.field("revision", &self.latest.read().revision)
			.field("notifications", &self.notifications())
			.finish()
	}
}

/// Main-area widget hosting one [`DebuggerModel`].
#[derive(Debug)]
pub struct DebuggerPanel {
	widget_id: String,
	model: Arc<DebuggerModel>,
}

impl DebuggerPanel {
	pub fn new(model: Arc<DebuggerModel>) -> Arc<Self> {
		Arc::new(Self {
			widget_id: Self::widget_id_for(model.id()),
			model,
		})
	}

	/// Shell widget id of the panel for model `id`.
	pub fn widget_id_for(id: &str) -> String {
		format!("debugger:{id}")
	}

	/// The model id. Panels are keyed by it in [`PanelTracker`].
	pub fn id(&self) -> &str {
		self.model.id()
	}

	pub fn model(&self) -> &Arc<DebuggerModel> {
		&self.model
	}
}

impl Widget for DebuggerPanel {
	fn id(&self) -> &str {
		&self.widget_id
	}
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SavedPanels {
	#[serde(default)]
	panels: Vec<String>,
}

/// Open debugger panels keyed by model id, with a current panel.
pub struct PanelTracker {
	namespace: String,
	panels: Mutex<IndexMap<String, Arc<DebuggerPanel>>>,
	current: Mutex<Option<Arc<DebuggerPanel>>>,
	current_changed: Signal<Option<Arc<DebuggerPanel>>>,
}

impl PanelTracker {
	pub fn new(namespace: impl Into<String>) -> Self {
		Self {
			namespace: namespace.into(),
			panels: Mutex::new(IndexMap::new()),
			current: Mutex::new(None),
			current_changed: Signal::new("panels.current_changed"),
		}
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Tracks a panel. The first tracked panel becomes current.
	///
	/// Returns `false` if a panel with the same id is already tracked.
	pub fn add(&self, panel: Arc<DebuggerPanel>) -> bool {
		{
			let mut panels = self.panels.lock();
			if panels.contains_key(panel.id()) {
				return false;
			}
			panels.insert(panel.id().to_string(), Arc::clone(&panel));
		}
		debug!(target: "kdbg.panels", namespace = %self.namespace, panel = panel.id(), "panel tracked");
		if self.current.lock().is_none() {
			self.replace_current(Some(panel));
		}
		true
	}

	pub fn find(&self, id: &str) -> Option<Arc<DebuggerPanel>> {
		self.panels.lock().get(id).cloned()
	}

	/// Stops tracking a panel and disposes its model. If it was current, the
	/// most recently added remaining panel becomes current.
	pub fn close(&self, id: &str) -> Option<Arc<DebuggerPanel>> {
		let (panel, fallback) = {
			let mut panels = self.panels.lock();
			let panel = panels.shift_remove(id)?;
			(panel, panels.values().last().cloned())
		};
		panel.model().dispose();
		let was_current = self.current.lock().as_ref().is_some_and(|p| p.id() == id);
		if was_current {
			self.replace_current(fallback);
		}
		debug!(target: "kdbg.panels", namespace = %self.namespace, panel = id, "panel closed");
		Some(panel)
	}

	/// Makes a tracked panel current. Returns `false` if `id` is not tracked.
	pub fn set_current(&self, id: &str) -> bool {
		match self.find(id) {
			Some(panel) => {
				self.replace_current(Some(panel));
				true
			}
			None => false,
		}
	}

	/// Makes the panel shown by shell widget `widget_id` current, if tracked.
	pub fn set_current_widget(&self, widget_id: &str) -> bool {
		let panel = self
			.panels
			.lock()
			.values()
			.find(|p| p.widget_id == widget_id)
			.cloned();
		match panel {
			Some(panel) => {
				self.replace_current(Some(panel));
				true
			}
			None => false,
		}
	}

	pub fn current(&self) -> Option<Arc<DebuggerPanel>> {
		self.current.lock().clone()
	}

	pub fn current_changed(&self) -> &Signal<Option<Arc<DebuggerPanel>>> {
		&self.current_changed
	}

	/// Tracked panel ids in creation order.
	pub fn ids(&self) -> Vec<String> {
		self.panels.lock().keys().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.panels.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.panels.lock().is_empty()
	}

	/// Writes the open-panel list under the tracker namespace.
	pub fn save(&self, db: &dyn StateDb) -> Result<()> {
		let saved = SavedPanels { panels: self.ids() };
		db.save(&self.namespace, serde_json::to_value(saved)?)
	}

	/// Panel ids previously saved under the tracker namespace.
	pub fn saved_ids(&self, db: &dyn StateDb) -> Result<Vec<String>> {
		let Some(value) = db.fetch(&self.namespace)? else {
			return Ok(Vec::new());
		};
		let saved: SavedPanels = serde_json::from_value(value)?;
		Ok(saved.panels)
	}

	fn replace_current(&self, panel: Option<Arc<DebuggerPanel>>) {
		{
			let mut current = self.current.lock();
			let unchanged = match (current.as_ref(), panel.as_ref()) {
				(Some(a), Some(b)) => Arc::ptr_eq(a, b),
				(None, None) => true,
				_ => false,
			};
			if unchanged {
				return;
			}
			*current = panel.clone();
		}
		debug!(
			target: "kdbg.panels",
			namespace = %self.namespace,
			current = panel.as_ref().map(|p| p.id()),
			"current panel changed"
		);
		self.current_changed.emit(&panel);
	}
}

impl std::fmt::Debug for PanelTracker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PanelTracker")
			.field("namespace", &self.namespace)
			.field("panels", &self.ids())
			.finish()
	}
}

/// Condensed debugger view docked beside the main area.
///
/// Shows the model of the current debugger panel, or nothing.
pub struct Sidebar {
	id: String,
	label: String,
	model: RwLock<Option<Arc<DebuggerModel>>>,
}

impl Sidebar {
	pub fn new(config: &SidebarConfig) -> Arc<Self> {
		Arc::new(Self {
			id: config.id.clone(),
			label: config.label.clone(),
			model: RwLock::new(None),
		})
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn model(&self) -> Option<Arc<DebuggerModel>> {
		self.model.read().clone()
	}

	pub fn set_model(&self, model: Option<Arc<DebuggerModel>>) {
		debug!(target: "kdbg.panels", sidebar = %self.id, model = model.as_ref().map(|m| m.id()), "sidebar model set");
		*self.model.write() = model;
	}
}

impl Widget for Sidebar {
	fn id(&self) -> &str {
		&self.id
	}
}

impl std::fmt::Debug for Sidebar {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Sidebar")
			.field("id", &self.id)
			.field("label", &self.label)
			.field("model", &self.model.read().as_ref().map(|m| m.id().to_string()))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use kdbg_protocol::SessionType;
	use serde_json::json;

	use super::*;
	use crate::state::MemoryStateDb;

	fn panel(id: &str, coordinator: &BreakpointCoordinator) -> Arc<DebuggerPanel> {
		DebuggerPanel::new(DebuggerModel::new(id, coordinator))
	}

	#[test]
	fn model_follows_coordinator_until_disposed() {
		let coordinator = BreakpointCoordinator::new();
		coordinator.register_surface("nb:cell-1", SessionType::Notebook);
		let model = DebuggerModel::new("main", &coordinator);

		coordinator.set_active_session_type(SessionType::Notebook);
		coordinator.toggle_breakpoint("nb:cell-1", 5).unwrap();

		assert_eq!(model.notifications(), 2);
		assert_eq!(model.active_session_type(), SessionType::Notebook);
		assert_eq!(model.breakpoints("nb:cell-1").len(), 1);

		model.dispose();
		assert!(model.is_disposed());
		assert_eq!(coordinator.listener_count(), 0);
		coordinator.toggle_breakpoint("nb:cell-1", 5).unwrap();
		assert_eq!(model.notifications(), 2);
		assert_eq!(model.breakpoints("nb:cell-1").len(), 1);
	}

	#[test]
	fn dropped_model_releases_its_listener() {
		let coordinator = BreakpointCoordinator::new();
		let model = DebuggerModel::new("main", &coordinator);
		assert_eq!(coordinator.listener_count(), 1);
		drop(model);
		assert_eq!(coordinator.listener_count(), 0);
	}

	#[test]
	fn first_panel_becomes_current() {
		let coordinator = BreakpointCoordinator::new();
		let tracker = PanelTracker::new("debugger");
		let seen = Arc::new(Mutex::new(Vec::new()));
		let _sub = {
			let seen = Arc::clone(&seen);
			tracker
				.current_changed()
				.connect(move |current: &Option<Arc<DebuggerPanel>>| {
					seen.lock().push(current.as_ref().map(|p| p.id().to_string()));
				})
		};

		assert!(tracker.add(panel("a", &coordinator)));
		assert!(tracker.add(panel("b", &coordinator)));
		assert!(!tracker.add(panel("a", &coordinator)));
		assert_eq!(tracker.current().unwrap().id(), "a");

		assert!(tracker.set_current("b"));
		assert!(!tracker.set_current("missing"));
		assert!(tracker.set_current_widget("debugger:b"));
		assert!(!tracker.set_current_widget("b"));
		tracker.close("b");
		tracker.close("a");

		assert_eq!(
			*seen.lock(),
			vec![Some("a".to_string()), Some("b".to_string()), Some("a".to_string()), None]
		);
		assert!(tracker.is_empty());
	}

	#[test]
	fn close_disposes_model() {
		let coordinator = BreakpointCoordinator::new();
		let tracker = PanelTracker::new("debugger");
		tracker.add(panel("a", &coordinator));

		let closed = tracker.close("a").unwrap();
		assert!(closed.model().is_disposed());
		assert!(tracker.close("a").is_none());
	}

	#[test]
	fn saves_and_reads_panel_ids() {
		let coordinator = BreakpointCoordinator::new();
		let db = MemoryStateDb::new();
		let tracker = PanelTracker::new("debugger");
		assert!(tracker.saved_ids(&db).unwrap().is_empty());

		tracker.add(panel("a", &coordinator));
		tracker.add(panel("b", &coordinator));
		tracker.save(&db).unwrap();

		assert_eq!(db.fetch("debugger").unwrap(), Some(json!({"panels": ["a", "b"]})));
		assert_eq!(tracker.saved_ids(&db).unwrap(), vec!["a", "b"]);

		db.save("debugger", json!({"panels": 3})).unwrap();
		assert!(tracker.saved_ids(&db).is_err());
	}

	#[test]
	fn sidebar_uses_configured_identity() {
		let sidebar = Sidebar::new(&SidebarConfig::default());
		assert_eq!(Widget::id(&*sidebar), "jp-debugger-sidebar");
		assert_eq!(sidebar.label(), "Environment");
		assert!(sidebar.model().is_none());

		let coordinator = BreakpointCoordinator::new();
		let model = DebuggerModel::new("a", &coordinator);
		sidebar.set_model(Some(Arc::clone(&model)));
		assert_eq!(sidebar.model().unwrap().id(), "a");
	}
}
