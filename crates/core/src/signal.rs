//! Synchronous publish/subscribe channel.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::handlers::{self, HandlerMap, Subscription};

/// Delivers each emitted value to every connected handler, in connection order,
/// before [`Signal::emit`] returns.
///
/// Handlers may connect or disconnect while an emission is in progress. A handler
/// disconnected mid-emission is not called for the remainder of that emission.
pub struct Signal<T> {
	name: &'static str,
	handlers: HandlerMap<T>,
}

impl<T: 'static> Signal<T> {
	pub fn new(name: &'static str) -> Self {
		Self {
			name,
			handlers: Arc::new(Mutex::new(IndexMap::new())),
		}
	}

	/// Connects a handler. It stays connected until the [`Subscription`] is dropped.
	#[must_use = "dropping the subscription disconnects the handler"]
	pub fn connect<F>(&self, handler: F) -> Subscription
	where
		F: Fn(&T) + Send + Sync + 'static,
	{
		handlers::register(&self.handlers, handler)
	}

	pub fn emit(&self, value: &T) {
		for handler in handlers::listeners(&self.handlers) {
			if !self.handlers.lock().contains_key(&handler.id) {
				continue;
			}
			tracing::trace!(signal = self.name, handler_id = handler.id, "emit");
			(handler.call)(value);
		}
	}

	pub fn handler_count(&self) -> usize {
		self.handlers.lock().len()
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl<T> std::fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Signal")
			.field("name", &self.name)
			.field("handlers", &self.handlers.lock().len())
			.finish()
	}
}
