//! Process-wide breakpoint and session-type state.
//!
//! [`BreakpointCoordinator`] is the single source of truth for what the
//! debugger UI shows. Surface trackers report lifecycle facts through
//! [`register_surface`](BreakpointCoordinator::register_surface) and
//! [`unregister_surface`](BreakpointCoordinator::unregister_surface), the
//! focus router reports the active [`SessionType`], and UI models
//! [`subscribe`](BreakpointCoordinator::subscribe) to receive a [`Snapshot`]
//! after every state change.
//!
//! Delivery is synchronous. A mutation issued from inside a listener is queued
//! and applied once the current notification round has finished, so every
//! listener observes the same total order of transitions.

mod snapshot;


use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kdbg_protocol::{Breakpoint, SessionType, SourceId};
use parking_lot::Mutex;
use tracing::{debug, warn};

pub use self::snapshot::{Change, Snapshot};
use crate::error::{Error, Result};
use crate::handlers::Subscription;
use crate::signal::Signal;

/// Result of [`BreakpointCoordinator::toggle_breakpoint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
	/// A breakpoint was created.
	Set(Breakpoint),
	/// The existing breakpoint was removed.
	Cleared(Breakpoint),
	/// Issued from inside a listener; queued until the notification round ends.
	Deferred,
}

impl Toggle {
	/// The created breakpoint, or `None` if one was removed or the toggle was deferred.
	pub fn breakpoint(&self) -> Option<&Breakpoint> {
		match self {
			Toggle::Set(bp) => Some(bp),
			Toggle::Cleared(_) | Toggle::Deferred => None,
		}
	}
}

#[derive(Debug, Clone)]
enum Mutation {
	SetActiveSessionType(SessionType),
	Register(SourceId, SessionType),
	Unregister(SourceId),
	Toggle(SourceId, u32),
	SetVerified(SourceId, u32, bool),
	ResetVerified(SourceId),
}

impl Mutation {
	fn name(&self) -> &'static str {
		match self {
			Mutation::SetActiveSessionType(_) => "set_active_session_type",
			Mutation::Register(..) => "register_surface",
			Mutation::Unregister(_) => "unregister_surface",
			Mutation::Toggle(..) => "toggle_breakpoint",
			Mutation::SetVerified(..) => "set_verified",
			Mutation::ResetVerified(_) => "reset_verified",
		}
	}
}

/// A toggle that was applied immediately.
enum Toggled {
	Set(Breakpoint),
	Cleared(Breakpoint),
}

impl Toggled {
	fn change(&self) -> Change {
		match self {
			Toggled::Set(breakpoint) => Change::BreakpointSet {
				breakpoint: breakpoint.clone(),
			},
			Toggled::Cleared(breakpoint) => Change::BreakpointCleared {
				breakpoint: breakpoint.clone(),
			},
		}
	}
}

impl From<Toggled> for Toggle {
	fn from(toggled: Toggled) -> Self {
		match toggled {
			Toggled::Set(breakpoint) => Toggle::Set(breakpoint),
			Toggled::Cleared(breakpoint) => Toggle::Cleared(breakpoint),
		}
	}
}

#[derive(Debug, Default)]
struct State {
	revision: u64,
	active_session_type: SessionType,
	registrations: HashMap<SourceId, SessionType>,
	breakpoints: HashMap<SourceId, BTreeMap<u32, Breakpoint>>,
}

impl State {
	fn apply(&mut self, mutation: Mutation) -> Result<Option<Change>> {
		let change = match mutation {
			Mutation::SetActiveSessionType(session_type) => {
				if self.active_session_type == session_type {
					return Ok(None);
				}
				self.active_session_type = session_type;
				Change::ActiveSessionType { session_type }
			}
			Mutation::Register(source_id, session_type) => {
				let previous = self.registrations.insert(source_id.clone(), session_type);
				if previous == Some(session_type) {
					return Ok(None);
				}
				if previous.is_some() {
					// New session has armed nothing yet; recorded session types stay.
					if let Some(lines) = self.breakpoints.get_mut(&source_id) {
						lines.values_mut().for_each(|bp| bp.verified = false);
					}
				}
				Change::Registered {
					source_id,
					session_type,
					previous,
				}
			}
			Mutation::Unregister(source_id) => {
				let registration = self.registrations.remove(&source_id);
				let removed = self.breakpoints.remove(&source_id).map(|lines| lines.len());
				if registration.is_none() && removed.is_none() {
					debug!(target: "kdbg.coordinator", source = %source_id, "unregister of unknown source ignored");
					return Ok(None);
				}
				Change::Unregistered {
					source_id,
					removed: removed.unwrap_or(0),
				}
			}
			Mutation::Toggle(source_id, line) => return self.toggle(source_id, line).map(|t| Some(t.change())),
			Mutation::SetVerified(source_id, line, verified) => {
				let Some(breakpoint) = self.breakpoints.get_mut(&source_id).and_then(|lines| lines.get_mut(&line)) else {
					return Err(Error::NotFound { source_id, line });
				};
				if breakpoint.verified == verified {
					return Ok(None);
				}
				breakpoint.verified = verified;
				Change::Verified {
					source_id,
					line,
					verified,
				}
			}
			Mutation::ResetVerified(source_id) => {
				let mut count = 0;
				if let Some(lines) = self.breakpoints.get_mut(&source_id) {
					for bp in lines.values_mut().filter(|bp| bp.verified) {
						bp.verified = false;
						count += 1;
					}
				}
				if count == 0 {
					return Ok(None);
				}
				Change::VerificationReset { source_id, count }
			}
		};

		self.revision += 1;
		Ok(Some(change))
	}

	fn toggle(&mut self, source_id: SourceId, line: u32) -> Result<Toggled> {
		if line == 0 {
			return Err(Error::InvalidLine { source_id, line });
		}
		if !self.registrations.contains_key(&source_id) {
			return Err(Error::InvalidSource { source_id });
		}
		let lines = self.breakpoints.entry(source_id.clone()).or_default();
		let toggled = match lines.remove(&line) {
			Some(breakpoint) => {
				if lines.is_empty() {
					self.breakpoints.remove(&source_id);
				}
				Toggled::Cleared(breakpoint)
			}
			None => {
				let breakpoint = Breakpoint::new(source_id, line, self.active_session_type);
				lines.insert(line, breakpoint.clone());
				Toggled::Set(breakpoint)
			}
		};
		self.revision += 1;
		Ok(toggled)
	}

	fn list(&self, source_id: &str) -> Vec<Breakpoint> {
		self.breakpoints
			.get(source_id)
			.map(|lines| lines.values().cloned().collect())
			.unwrap_or_default()
	}

	fn snapshot(&self, change: Change) -> Snapshot {
		Snapshot {
			revision: self.revision,
			active_session_type: self.active_session_type,
			change,
			breakpoints: self
				.breakpoints
				.iter()
				.map(|(source_id, lines)| (source_id.clone(), lines.values().cloned().collect()))
				.collect(),
		}
	}
}

struct Inner {
	state: Mutex<State>,
	changed: Signal<Snapshot>,
	pending: Mutex<VecDeque<Mutation>>,
	notifying: AtomicBool,
}

/// Clears the notifying flag even if a listener panics.
struct NotifyingGuard<'a>(&'a AtomicBool);

impl Drop for NotifyingGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

/// Handle to the breakpoint coordinator. Clones share the same state.
///
/// Construct exactly one per debugger and pass it to every component that
/// reports into it.
#[derive(Clone)]
pub struct BreakpointCoordinator {
	inner: Arc<Inner>,
}

impl Default for BreakpointCoordinator {
	fn default() -> Self {
		Self::new()
	}
}

impl BreakpointCoordinator {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(Inner {
				state: Mutex::new(State::default()),
				changed: Signal::new("coordinator.changed"),
				pending: Mutex::new(VecDeque::new()),
				notifying: AtomicBool::new(false),
			}),
		}
	}

	/// Records the session type of the focused surface. Last write wins.
	pub fn set_active_session_type(&self, session_type: SessionType) {
		let _ = self.submit(Mutation::SetActiveSessionType(session_type));
	}

	/// Associates a source unit with a session type.
	///
	/// Re-registering with the same type is a no-op. A different type updates
	/// the association and marks the source's breakpoints unverified; each
	/// breakpoint keeps the session type it was created under.
	pub fn register_surface(&self, source_id: impl Into<SourceId>, session_type: SessionType) {
		let _ = self.submit(Mutation::Register(source_id.into(), session_type));
	}

	/// Drops the registration and every breakpoint of a disposed source.
	/// Unknown sources are ignored.
	pub fn unregister_surface(&self, source_id: impl Into<SourceId>) {
		let _ = self.submit(Mutation::Unregister(source_id.into()));
	}

	/// Removes the breakpoint at `(source_id, line)` or creates an unverified
	/// one under the active session type.
	///
	/// # Errors
	///
	/// [`Error::InvalidSource`] if no surface registered `source_id`,
	/// [`Error::InvalidLine`] for line 0.
	pub fn toggle_breakpoint(&self, source_id: impl Into<SourceId>, line: u32) -> Result<Toggle> {
		let source_id = source_id.into();
		if self.try_defer(&Mutation::Toggle(source_id.clone(), line)) {
			return Ok(Toggle::Deferred);
		}
		let result = self.inner.state.lock().toggle(source_id.clone(), line);
		let result = match result {
			Ok(toggled) => {
				let change = toggled.change();
				debug!(target: "kdbg.coordinator", mutation = "toggle_breakpoint", ?change, "state changed");
				self.notify(change);
				Ok(toggled.into())
			}
			Err(err) => {
				if let Error::InvalidSource { .. } = &err {
					warn!(target: "kdbg.coordinator", source = %source_id, line, error = %err, "toggle on unregistered source");
				}
				Err(err)
			}
		};
		self.drain_pending();
		result
	}

	/// Updates the session acknowledgement state of a breakpoint.
	///
	/// # Errors
	///
	/// [`Error::NotFound`] if there is no such breakpoint. This is a soft
	/// condition ([`Error::is_soft`]): acknowledgements race with toggles and
	/// disposal, so callers should log it and continue.
	pub fn set_verified(&self, source_id: impl Into<SourceId>, line: u32, verified: bool) -> Result<()> {
		self.submit(Mutation::SetVerified(source_id.into(), line, verified))
	}

	/// Marks every breakpoint of `source_id` unverified, e.g. after its session
	/// was torn down or replaced.
	pub fn reset_verified(&self, source_id: impl Into<SourceId>) {
		let _ = self.submit(Mutation::ResetVerified(source_id.into()));
	}

	/// Breakpoints of `source_id` ordered by line.
	pub fn list_breakpoints(&self, source_id: &str) -> Vec<Breakpoint> {
		self.inner.state.lock().list(source_id)
	}

	pub fn breakpoint(&self, source_id: &str, line: u32) -> Option<Breakpoint> {
		self.inner
			.state
			.lock()
			.breakpoints
			.get(source_id)
			.and_then(|lines| lines.get(&line))
			.cloned()
	}

	pub fn active_session_type(&self) -> SessionType {
		self.inner.state.lock().active_session_type
	}

	pub fn is_registered(&self, source_id: &str) -> bool {
		self.inner.state.lock().registrations.contains_key(source_id)
	}

	/// Session type `source_id` is currently registered under.
	pub fn session_type_of(&self, source_id: &str) -> Option<SessionType> {
		self.inner.state.lock().registrations.get(source_id).copied()
	}

	pub fn revision(&self) -> u64 {
		self.inner.state.lock().revision
	}

	pub fn snapshot(&self) -> Snapshot {
		self.inner.state.lock().snapshot(Change::Current)
	}

	/// Registers a listener called with a [`Snapshot`] after every state change.
	///
	/// Listeners must not expect their own mutations to be visible before they
	/// return: such mutations are queued until the notification round ends.
	#[must_use = "dropping the subscription unsubscribes the listener"]
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&Snapshot) + Send + Sync + 'static,
	{
		self.inner.changed.connect(listener)
	}

	pub fn unsubscribe(&self, subscription: Subscription) {
		subscription.unsubscribe();
	}

	pub fn listener_count(&self) -> usize {
		self.inner.changed.handler_count()
	}

	/// Queues `mutation` behind the notification round in progress, if any.
	fn try_defer(&self, mutation: &Mutation) -> bool {
		if !self.inner.notifying.load(Ordering::Acquire) {
			return false;
		}
		debug!(target: "kdbg.coordinator", mutation = mutation.name(), "queued mutation issued during notification");
		self.inner.pending.lock().push_back(mutation.clone());
		true
	}

	/// Applies `mutation` and notifies, or queues it during a notification round.
	fn submit(&self, mutation: Mutation) -> Result<()> {
		if self.try_defer(&mutation) {
			return Ok(());
		}

		let result = self.apply(mutation);
		if let Ok(Some(change)) = &result {
			self.notify(change.clone());
		}
		self.drain_pending();
		result.map(|_| ())
	}

	fn apply(&self, mutation: Mutation) -> Result<Option<Change>> {
		let name = mutation.name();
		let result = self.inner.state.lock().apply(mutation);
		match &result {
			Ok(Some(change)) => debug!(target: "kdbg.coordinator", mutation = name, ?change, "state changed"),
			Ok(None) => debug!(target: "kdbg.coordinator", mutation = name, "no change"),
			Err(err) => debug!(target: "kdbg.coordinator", mutation = name, error = %err, "mutation rejected"),
		}
		result
	}

	fn drain_pending(&self) {
		loop {
			let Some(mutation) = self.inner.pending.lock().pop_front() else {
				break;
			};
			let name = mutation.name();
			match self.apply(mutation) {
				Ok(Some(change)) => self.notify(change),
				Ok(None) => {}
				Err(err) if err.is_soft() => {
					debug!(target: "kdbg.coordinator", mutation = name, error = %err, "queued mutation had no effect");
				}
				Err(err) => {
					warn!(target: "kdbg.coordinator", mutation = name, error = %err, "queued mutation failed");
				}
			}
		}
	}

	fn notify(&self, change: Change) {
		let snapshot = self.inner.state.lock().snapshot(change);
		self.inner.notifying.store(true, Ordering::Release);
		let _guard = NotifyingGuard(&self.inner.notifying);
		self.inner.changed.emit(&snapshot);
	}
}

impl std::fmt::Debug for BreakpointCoordinator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("BreakpointCoordinator")
			.field("revision", &state.revision)
			.field("active_session_type", &state.active_session_type)
			.field("sources", &state.registrations.len())
			.finish()
	}
}
