//! Bridges a surface family's lifecycle signals to the coordinator.
//!
//! One [`SurfaceTracker`] exists per family. It never touches UI models; it only
//! reports registrations, disposals, and session swaps.

use std::collections::{BTreeSet, HashMap};
use std::marker::PhantomData;
use std::sync::Arc;

use kdbg_protocol::{SessionType, SourceId};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::coordinator::BreakpointCoordinator;
use crate::handlers::Subscription;
use crate::host::{Console, Editor, Notebook, Surface, SurfaceCollection, SurfaceFamily};
use crate::signal::Signal;

pub type NotebookTracker = SurfaceTracker<Notebook>;
pub type ConsoleTracker = SurfaceTracker<Console>;
pub type EditorTracker = SurfaceTracker<Editor>;

/// Lifecycle of one surface as seen by its tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceState {
	/// Alive but holding no session (and no fallback).
	Unregistered,
	/// Sources are registered with the coordinator under this type.
	Registered(SessionType),
	/// Terminal. The id is never tracked again.
	Disposed,
}

#[derive(Debug)]
struct TrackedSurface {
	state: SurfaceState,
	session_id: Option<String>,
	sources: BTreeSet<SourceId>,
}

/// Coordinator call computed under the tracker lock and issued after it is released.
enum Report {
	Register(SourceId, SessionType),
	Unregister(SourceId),
	ResetVerified(SourceId),
}

/// Tracked surfaces plus how many live registered surfaces claim each source.
///
/// Two editors on one file, or two consoles with the same entry id, share a
/// source id. The coordinator registration is dropped only with its last owner.
#[derive(Default)]
struct Registry {
	surfaces: HashMap<String, TrackedSurface>,
	owners: HashMap<SourceId, usize>,
}

impl Registry {
	fn acquire(&mut self, source_id: SourceId, session_type: SessionType, reports: &mut Vec<Report>) {
		*self.owners.entry(source_id.clone()).or_default() += 1;
		reports.push(Report::Register(source_id, session_type));
	}

	fn release(&mut self, source_id: SourceId, reports: &mut Vec<Report>) {
		let Some(count) = self.owners.get_mut(&source_id) else {
			return;
		};
		*count -= 1;
		if *count == 0 {
			self.owners.remove(&source_id);
			reports.push(Report::Unregister(source_id));
		} else {
			debug!(target: "kdbg.tracker", source = %source_id, owners = *count, "source still owned by another surface");
		}
	}
}

struct TrackerInner<F> {
	coordinator: BreakpointCoordinator,
	registry: Mutex<Registry>,
	_family: PhantomData<fn() -> F>,
}

impl<F: SurfaceFamily> TrackerInner<F> {
	fn on_added(&self, surface: &Surface<F>) {
		let session_type = surface.session_type();
		let sources: BTreeSet<SourceId> = surface.source_ids().into_iter().collect();
		let reports = {
			let mut registry = self.registry.lock();
			match registry.surfaces.get(surface.id()).map(|t| t.state) {
				Some(SurfaceState::Disposed) => {
					warn!(target: "kdbg.tracker", kind = %F::KIND, surface = surface.id(), "ignoring reuse of disposed surface id");
					return;
				}
				Some(_) => {
					debug!(target: "kdbg.tracker", kind = %F::KIND, surface = surface.id(), "surface already tracked");
					return;
				}
				None => {}
			}
			let mut reports = Vec::new();
			if let Some(session_type) = session_type {
				for source_id in &sources {
					registry.acquire(source_id.clone(), session_type, &mut reports);
				}
			}
			registry.surfaces.insert(
				surface.id().to_string(),
				TrackedSurface {
					state: session_type.map_or(SurfaceState::Unregistered, SurfaceState::Registered),
					session_id: surface.session().map(|s| s.id),
					sources,
				},
			);
			reports
		};

		debug!(target: "kdbg.tracker", kind = %F::KIND, surface = surface.id(), session_type = ?session_type, sources = reports.len(), "tracking surface");
		self.report(reports);
	}

	fn on_disposed(&self, surface: &Surface<F>) {
		let reports = {
			let mut registry = self.registry.lock();
			let Some(tracked) = registry.surfaces.get_mut(surface.id()) else {
				return;
			};
			let previous = std::mem::replace(&mut tracked.state, SurfaceState::Disposed);
			tracked.session_id = None;
			let sources = std::mem::take(&mut tracked.sources);
			let mut reports = Vec::new();
			if let SurfaceState::Registered(_) = previous {
				for source_id in sources {
					registry.release(source_id, &mut reports);
				}
			}
			reports
		};
		debug!(target: "kdbg.tracker", kind = %F::KIND, surface = surface.id(), sources = reports.len(), "surface disposed");
		self.report(reports);
	}

	fn on_session_changed(&self, surface: &Surface<F>) {
		let session_type = surface.session_type();
		let session_id = surface.session().map(|s| s.id);
		let reports = {
			let mut registry = self.registry.lock();
			let Some(tracked) = registry.surfaces.get_mut(surface.id()) else {
				warn!(target: "kdbg.tracker", kind = %F::KIND, surface = surface.id(), "session change on untracked surface");
				return;
			};
			if tracked.state == SurfaceState::Disposed {
				return;
			}

			let previous = tracked.state;
			let replaced = tracked.session_id.is_some() && session_id.is_some() && tracked.session_id != session_id;
			tracked.state = session_type.map_or(SurfaceState::Unregistered, SurfaceState::Registered);
			tracked.session_id = session_id;
			let sources: Vec<SourceId> = tracked.sources.iter().cloned().collect();

			let mut reports = Vec::new();
			match (previous, session_type) {
				(SurfaceState::Registered(old), Some(session_type)) => {
					if old == session_type && replaced {
						reports.extend(sources.iter().cloned().map(Report::ResetVerified));
					}
					reports.extend(sources.into_iter().map(|s| Report::Register(s, session_type)));
				}
				(_, Some(session_type)) => {
					for source_id in sources {
						registry.acquire(source_id, session_type, &mut reports);
					}
				}
				(SurfaceState::Registered(_), None) => {
					for source_id in sources {
						registry.release(source_id, &mut reports);
					}
				}
				(_, None) => {}
			}
			reports
		};
		debug!(target: "kdbg.tracker", kind = %F::KIND, surface = surface.id(), session_type = ?session_type, "session changed");
		self.report(reports);
	}

	fn on_units_changed(&self, surface: &Surface<F>) {
		let current: BTreeSet<SourceId> = surface.source_ids().into_iter().collect();
		let reports = {
			let mut registry = self.registry.lock();
			let Some(tracked) = registry.surfaces.get_mut(surface.id()) else {
				return;
			};
			if tracked.state == SurfaceState::Disposed {
				return;
			}
			let state = tracked.state;
			let removed: Vec<SourceId> = tracked.sources.difference(&current).cloned().collect();
			let added: Vec<SourceId> = current.difference(&tracked.sources).cloned().collect();
			tracked.sources = current;

			let mut reports = Vec::new();
			if let SurfaceState::Registered(session_type) = state {
				for source_id in removed {
					registry.release(source_id, &mut reports);
				}
				for source_id in added {
					registry.acquire(source_id, session_type, &mut reports);
				}
			}
			reports
		};
		self.report(reports);
	}

	fn report(&self, reports: Vec<Report>) {
		for report in reports {
			match report {
				Report::Register(source_id, session_type) => self.coordinator.register_surface(source_id, session_type),
				Report::Unregister(source_id) => self.coordinator.unregister_surface(source_id),
				Report::ResetVerified(source_id) => self.coordinator.reset_verified(source_id),
			}
		}
	}
}

/// Keeps the coordinator's registrations in step with one surface family.
///
/// Dropping the tracker disconnects it from the collection's signals.
pub struct SurfaceTracker<F: SurfaceFamily> {
	inner: Arc<TrackerInner<F>>,
	_subscriptions: Vec<Subscription>,
}

impl<F: SurfaceFamily> SurfaceTracker<F> {
	/// Registers every surface already open in `collection`, then follows its signals.
	pub fn new(collection: &SurfaceCollection<F>, coordinator: BreakpointCoordinator) -> Self {
		let inner = Arc::new(TrackerInner {
			coordinator,
			registry: Mutex::new(Registry::default()),
			_family: PhantomData,
		});

		for surface in collection.surfaces() {
			inner.on_added(&surface);
		}

		let subscriptions = vec![
			Self::follow(collection.surface_added(), &inner, TrackerInner::on_added),
			Self::follow(collection.surface_disposed(), &inner, TrackerInner::on_disposed),
			Self::follow(collection.session_changed(), &inner, TrackerInner::on_session_changed),
			Self::follow(collection.units_changed(), &inner, TrackerInner::on_units_changed),
		];

		Self {
			inner,
			_subscriptions: subscriptions,
		}
	}

	fn follow(
		signal: &Signal<Arc<Surface<F>>>,
		inner: &Arc<TrackerInner<F>>,
		handler: fn(&TrackerInner<F>, &Surface<F>),
	) -> Subscription {
		let inner = Arc::clone(inner);
		signal.connect(move |surface: &Arc<Surface<F>>| handler(&inner, surface))
	}

	pub fn state(&self, surface_id: &str) -> Option<SurfaceState> {
		self.inner.registry.lock().surfaces.get(surface_id).map(|t| t.state)
	}

	/// Number of live registered surfaces of this family that claim `source_id`.
	pub fn owners(&self, source_id: &str) -> usize {
		self.inner.registry.lock().owners.get(source_id).copied().unwrap_or(0)
	}

	/// Source ids the tracker currently attributes to a surface.
	pub fn sources(&self, surface_id: &str) -> Vec<SourceId> {
		self.inner
			.registry
			.lock()
			.surfaces
			.get(surface_id)
			.map(|t| t.sources.iter().cloned().collect())
			.unwrap_or_default()
	}

	/// Number of surfaces currently registered with the coordinator.
	pub fn registered_count(&self) -> usize {
		self.inner
			.registry
			.lock()
			.surfaces
			.values()
			.filter(|t| matches!(t.state, SurfaceState::Registered(_)))
			.count()
	}
}

impl<F: SurfaceFamily> std::fmt::Debug for SurfaceTracker<F> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SurfaceTracker")
			.field("kind", &F::KIND)
			.field("surfaces", &self.inner.registry.lock().surfaces.len())
			.finish()
	}
}
