//! Listener registry behind [`Signal`](crate::Signal) and RAII [`Subscription`]s.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Process-unique listener identifier.
pub type HandlerId = u64;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct Handler<T> {
	pub(crate) id: HandlerId,
	pub(crate) call: Arc<dyn Fn(&T) + Send + Sync>,
}

impl<T> Clone for Handler<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			call: Arc::clone(&self.call),
		}
	}
}

/// Listeners keyed by id, iterated in registration order.
pub(crate) type HandlerMap<T> = Arc<Mutex<IndexMap<HandlerId, Handler<T>>>>;

/// Adds `call` to `map` and returns the subscription that removes it again.
pub(crate) fn register<T, F>(map: &HandlerMap<T>, call: F) -> Subscription
where
	T: 'static,
	F: Fn(&T) + Send + Sync + 'static,
{
	let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
	map.lock().insert(id, Handler { id, call: Arc::new(call) });

	let weak: Weak<Mutex<IndexMap<HandlerId, Handler<T>>>> = Arc::downgrade(map);
	Subscription {
		id,
		detach: Some(Box::new(move |id| {
			if let Some(map) = weak.upgrade() {
				map.lock().shift_remove(&id);
			}
		})),
	}
}

/// Clones the registered listeners out so none run under the lock.
pub(crate) fn listeners<T>(map: &HandlerMap<T>) -> Vec<Handler<T>> {
	map.lock().values().cloned().collect()
}

/// Keeps a listener connected until dropped or [`unsubscribe`](Self::unsubscribe)d.
///
/// Only a weak reference to the registry is held, so a subscription may
/// outlive the signal or coordinator it came from.
pub struct Subscription {
	id: HandlerId,
	detach: Option<Box<dyn FnOnce(HandlerId) + Send + Sync>>,
}

impl Subscription {
	pub fn id(&self) -> HandlerId {
		self.id
	}

	pub fn unsubscribe(mut self) {
		self.detach_now();
	}

	fn detach_now(&mut self) {
		if let Some(detach) = self.detach.take() {
			detach(self.id);
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.detach_now();
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("attached", &self.detach.is_some())
			.finish()
	}
}
