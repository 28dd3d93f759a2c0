use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Widget;
use crate::signal::Signal;

/// Named shell region a widget is attached to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
	#[default]
	Main,
	Left,
	Right,
}

/// Payload of [`Shell::current_changed`].
#[derive(Clone, Debug)]
pub struct FocusChange {
	pub old: Option<Arc<dyn Widget>>,
	pub new: Option<Arc<dyn Widget>>,
}

struct Attached {
	widget: Arc<dyn Widget>,
	area: Area,
}

/// Widget registry with a single current (focused) widget.
pub struct Shell {
	widgets: Mutex<IndexMap<String, Attached>>,
	current: Mutex<Option<Arc<dyn Widget>>>,
	current_changed: Signal<FocusChange>,
}

impl Default for Shell {
	fn default() -> Self {
		Self::new()
	}
}

impl Shell {
	pub fn new() -> Self {
		Self {
			widgets: Mutex::new(IndexMap::new()),
			current: Mutex::new(None),
			current_changed: Signal::new("shell.current_changed"),
		}
	}

	/// Attaches `widget` to `area`, optionally focusing it.
	///
	/// Re-adding a widget id moves it to the new area.
	pub fn add(&self, widget: Arc<dyn Widget>, area: Area, activate: bool) {
		let id = widget.id().to_string();
		debug!(target: "kdbg.shell", widget = %id, ?area, activate, "attach widget");
		self.widgets.lock().insert(
			id.clone(),
			Attached {
				widget: Arc::clone(&widget),
				area,
			},
		);
		if activate {
			self.set_current(Some(widget));
		}
	}

	/// Detaches a widget. Focus is cleared if it was current.
	pub fn remove(&self, id: &str) -> Option<Arc<dyn Widget>> {
		let removed = self.widgets.lock().shift_remove(id)?;
		let was_current = self.current.lock().as_ref().is_some_and(|w| w.id() == id);
		if was_current {
			self.set_current(None);
		}
		Some(removed.widget)
	}

	/// Focuses an attached widget. Returns `false` if `id` is not attached.
	pub fn activate(&self, id: &str) -> bool {
		let widget = self.widgets.lock().get(id).map(|a| Arc::clone(&a.widget));
		match widget {
			Some(widget) => {
				self.set_current(Some(widget));
				true
			}
			None => false,
		}
	}

	pub fn clear_focus(&self) {
		self.set_current(None);
	}

	pub fn current(&self) -> Option<Arc<dyn Widget>> {
		self.current.lock().clone()
	}

	pub fn widget(&self, id: &str) -> Option<Arc<dyn Widget>> {
		self.widgets.lock().get(id).map(|a| Arc::clone(&a.widget))
	}

	pub fn area_of(&self, id: &str) -> Option<Area> {
		self.widgets.lock().get(id).map(|a| a.area)
	}

	/// Widget ids attached to `area`, in attachment order.
	pub fn widgets_in(&self, area: Area) -> Vec<String> {
		self.widgets
			.lock()
			.iter()
			.filter(|(_, a)| a.area == area)
			.map(|(id, _)| id.clone())
			.collect()
	}

	pub fn current_changed(&self) -> &Signal<FocusChange> {
		&self.current_changed
	}

	fn set_current(&self, new: Option<Arc<dyn Widget>>) {
		let old = {
			let mut current = self.current.lock();
			let unchanged = match (current.as_ref(), new.as_ref()) {
				(Some(a), Some(b)) => a.id() == b.id(),
				(None, None) => true,
				_ => false,
			};
			if unchanged {
				return;
			}
			std::mem::replace(&mut *current, new.clone())
		};
		debug!(
			target: "kdbg.shell",
			old = old.as_ref().map(|w| w.id()),
			new = new.as_ref().map(|w| w.id()),
			"current widget changed"
		);
		self.current_changed.emit(&FocusChange { old, new });
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Plain(&'static str);

	impl Widget for Plain {
		fn id(&self) -> &str {
			self.0
		}
	}

	fn focus_log(shell: &Shell) -> (Arc<Mutex<Vec<(Option<String>, Option<String>)>>>, crate::Subscription) {
		let log = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&log);
		let sub = shell.current_changed().connect(move |change: &FocusChange| {
			sink.lock().push((
				change.old.as_ref().map(|w| w.id().to_string()),
				change.new.as_ref().map(|w| w.id().to_string()),
			));
		});
		(log, sub)
	}

	#[test]
	fn activate_emits_once_per_change() {
		let shell = Shell::new();
		let (log, _sub) = focus_log(&shell);
		shell.add(Arc::new(Plain("a")), Area::Main, false);
		shell.add(Arc::new(Plain("b")), Area::Main, false);

		assert!(shell.activate("a"));
		assert!(shell.activate("a"));
		assert!(shell.activate("b"));
		assert!(!shell.activate("missing"));

		assert_eq!(
			*log.lock(),
			vec![(None, Some("a".into())), (Some("a".into()), Some("b".into()))]
		);
	}

	#[test]
	fn removing_current_clears_focus() {
		let shell = Shell::new();
		shell.add(Arc::new(Plain("a")), Area::Main, true);
		let (log, _sub) = focus_log(&shell);

		assert!(shell.remove("a").is_some());
		assert!(shell.current().is_none());
		assert_eq!(*log.lock(), vec![(Some("a".into()), None)]);
		assert!(shell.remove("a").is_none());
	}

	#[test]
	fn tracks_areas() {
		let shell = Shell::new();
		shell.add(Arc::new(Plain("sidebar")), Area::Right, false);
		shell.add(Arc::new(Plain("nb-1")), Area::Main, false);
		shell.add(Arc::new(Plain("nb-2")), Area::Main, false);

		assert_eq!(shell.widgets_in(Area::Main), vec!["nb-1", "nb-2"]);
		assert_eq!(shell.area_of("sidebar"), Some(Area::Right));
		assert!(shell.current().is_none());
	}
}
