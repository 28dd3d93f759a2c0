use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use kdbg_protocol::{SessionDescriptor, SessionType, SourceId, SurfaceKind};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::Widget;
use crate::signal::Signal;

/// Addressing scheme and session policy of one surface family.
pub trait SurfaceFamily: Send + Sync + 'static {
	const KIND: SurfaceKind;

	/// Maps a unit (cell id, console entry id, file path) to its source id.
	fn source_id(unit: &str) -> SourceId;

	/// Session type used when no session is attached.
	///
	/// `None` means the surface cannot hold breakpoints without a session.
	fn fallback() -> Option<SessionType> {
		None
	}
}

/// Notebook panels. Cells are addressed `nb:<cell-id>`.
pub struct Notebook;

/// Console panels. Entries are addressed `console:<entry-id>`.
pub struct Console;

/// File editors. The file path is the source id; files hold breakpoints
/// without a session.
pub struct Editor;

impl SurfaceFamily for Notebook {
	const KIND: SurfaceKind = SurfaceKind::Notebook;

	fn source_id(unit: &str) -> SourceId {
		SourceId::new(format!("nb:{unit}"))
	}
}

impl SurfaceFamily for Console {
	const KIND: SurfaceKind = SurfaceKind::Console;

	fn source_id(unit: &str) -> SourceId {
		SourceId::new(format!("console:{unit}"))
	}
}

impl SurfaceFamily for Editor {
	const KIND: SurfaceKind = SurfaceKind::Editor;

	fn source_id(unit: &str) -> SourceId {
		SourceId::from(unit)
	}

	fn fallback() -> Option<SessionType> {
		Some(SessionType::None)
	}
}

/// A live editing surface of family `F`.
pub struct Surface<F> {
	id: String,
	session: RwLock<Option<SessionDescriptor>>,
	units: RwLock<Vec<String>>,
	_family: PhantomData<fn() -> F>,
}

impl<F: SurfaceFamily> Surface<F> {
	pub fn new(id: impl Into<String>, units: Vec<String>, session: Option<SessionDescriptor>) -> Arc<Self> {
		Arc::new(Self {
			id: id.into(),
			session: RwLock::new(session),
			units: RwLock::new(units),
			_family: PhantomData,
		})
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn session(&self) -> Option<SessionDescriptor> {
		self.session.read().clone()
	}

	pub fn units(&self) -> Vec<String> {
		self.units.read().clone()
	}

	pub fn source_ids(&self) -> Vec<SourceId> {
		self.units.read().iter().map(|unit| F::source_id(unit)).collect()
	}

	/// Session type breakpoints in this surface register under, if any.
	pub fn session_type(&self) -> Option<SessionType> {
		self.session.read().as_ref().map(|s| s.kind).or_else(F::fallback)
	}
}

impl<F: SurfaceFamily> Widget for Surface<F> {
	fn id(&self) -> &str {
		&self.id
	}

	fn session(&self) -> Option<SessionDescriptor> {
		Surface::<F>::session(self)
	}

	fn surface_kind(&self) -> Option<SurfaceKind> {
		Some(F::KIND)
	}
}

/// Live surfaces of one family plus their lifecycle signals.
pub struct SurfaceCollection<F> {
	surfaces: Mutex<IndexMap<String, Arc<Surface<F>>>>,
	added: Signal<Arc<Surface<F>>>,
	disposed: Signal<Arc<Surface<F>>>,
	session_changed: Signal<Arc<Surface<F>>>,
	units_changed: Signal<Arc<Surface<F>>>,
}

impl<F: SurfaceFamily> Default for SurfaceCollection<F> {
	fn default() -> Self {
		Self::new()
	}
}

impl<F: SurfaceFamily> SurfaceCollection<F> {
	pub fn new() -> Self {
		Self {
			surfaces: Mutex::new(IndexMap::new()),
			added: Signal::new("surface.added"),
			disposed: Signal::new("surface.disposed"),
			session_changed: Signal::new("surface.session_changed"),
			units_changed: Signal::new("surface.units_changed"),
		}
	}

	/// Creates and adds a surface. Returns `None` if `id` is already live.
	pub fn open(
		&self,
		id: impl Into<String>,
		units: Vec<String>,
		session: Option<SessionDescriptor>,
	) -> Option<Arc<Surface<F>>> {
		let surface = Surface::<F>::new(id, units, session);
		self.add(Arc::clone(&surface)).then_some(surface)
	}

	/// Adds a surface and emits [`surface_added`](Self::surface_added).
	/// Returns `false` if a surface with the same id is already live.
	pub fn add(&self, surface: Arc<Surface<F>>) -> bool {
		{
			let mut surfaces = self.surfaces.lock();
			if surfaces.contains_key(surface.id()) {
				return false;
			}
			surfaces.insert(surface.id().to_string(), Arc::clone(&surface));
		}
		debug!(target: "kdbg.host", kind = %F::KIND, surface = surface.id(), "surface added");
		self.added.emit(&surface);
		true
	}

	/// Removes a surface permanently and emits [`surface_disposed`](Self::surface_disposed).
	pub fn dispose(&self, id: &str) -> Option<Arc<Surface<F>>> {
		let surface = self.surfaces.lock().shift_remove(id)?;
		debug!(target: "kdbg.host", kind = %F::KIND, surface = id, "surface disposed");
		self.disposed.emit(&surface);
		Some(surface)
	}

	/// Attaches, replaces, or (with `None`) removes the surface's session.
	pub fn set_session(&self, id: &str, session: Option<SessionDescriptor>) -> Option<Arc<Surface<F>>> {
		let surface = self.get(id)?;
		*surface.session.write() = session;
		self.session_changed.emit(&surface);
		Some(surface)
	}

	/// Replaces the units of a live surface.
	pub fn set_units(&self, id: &str, units: Vec<String>) -> Option<Arc<Surface<F>>> {
		let surface = self.get(id)?;
		*surface.units.write() = units;
		self.units_changed.emit(&surface);
		Some(surface)
	}

	pub fn get(&self, id: &str) -> Option<Arc<Surface<F>>> {
		self.surfaces.lock().get(id).cloned()
	}

	/// Live surfaces in creation order.
	pub fn surfaces(&self) -> Vec<Arc<Surface<F>>> {
		self.surfaces.lock().values().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.surfaces.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.surfaces.lock().is_empty()
	}

	pub fn surface_added(&self) -> &Signal<Arc<Surface<F>>> {
		&self.added
	}

	pub fn surface_disposed(&self) -> &Signal<Arc<Surface<F>>> {
		&self.disposed
	}

	pub fn session_changed(&self) -> &Signal<Arc<Surface<F>>> {
		&self.session_changed
	}

	pub fn units_changed(&self) -> &Signal<Arc<Surface<F>>> {
		&self.units_changed
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn kernel(id: &str, kind: SessionType) -> Option<SessionDescriptor> {
		Some(SessionDescriptor { id: id.into(), kind })
	}

	#[test]
	fn families_address_units() {
		assert_eq!(Notebook::source_id("cell-1").as_str(), "nb:cell-1");
		assert_eq!(Console::source_id("1").as_str(), "console:1");
		assert_eq!(Editor::source_id("/src/a.py").as_str(), "/src/a.py");
	}

	#[test]
	fn session_type_falls_back_per_family() {
		let notebook = Surface::<Notebook>::new("nb-1", vec![], None);
		assert_eq!(notebook.session_type(), None);

		let editor = Surface::<Editor>::new("/a.py", vec!["/a.py".into()], None);
		assert_eq!(editor.session_type(), Some(SessionType::None));

		let console = Surface::<Console>::new("c-1", vec![], kernel("k1", SessionType::Console));
		assert_eq!(console.session_type(), Some(SessionType::Console));
		assert_eq!(Widget::surface_kind(&*console), Some(SurfaceKind::Console));
	}

	#[test]
	fn open_rejects_live_duplicates() {
		let collection = SurfaceCollection::<Notebook>::new();
		assert!(collection.open("nb-1", vec!["a".into()], None).is_some());
		assert!(collection.open("nb-1", vec![], None).is_none());
		assert_eq!(collection.len(), 1);

		assert!(collection.dispose("nb-1").is_some());
		assert!(collection.is_empty());
		assert!(collection.dispose("nb-1").is_none());
	}

	#[test]
	fn signals_fire_for_lifecycle_changes() {
		let collection = SurfaceCollection::<Console>::new();
		let log = Arc::new(Mutex::new(Vec::new()));

		let subs = [
			("added", collection.surface_added()),
			("disposed", collection.surface_disposed()),
			("session", collection.session_changed()),
			("units", collection.units_changed()),
		]
		.map(|(label, signal)| {
			let log = Arc::clone(&log);
			signal.connect(move |s: &Arc<Surface<Console>>| log.lock().push(format!("{label}:{}", s.id())))
		});

		collection.open("c-1", vec!["1".into()], None);
		collection.set_session("c-1", kernel("k1", SessionType::Console));
		collection.set_units("c-1", vec!["1".into(), "2".into()]);
		collection.dispose("c-1");
		assert!(collection.set_session("c-1", None).is_none());

		assert_eq!(*log.lock(), vec!["added:c-1", "session:c-1", "units:c-1", "disposed:c-1"]);
		drop(subs);
	}
}
