//! Key-value JSON store used to persist debugger panel state.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::Result;

/// Host-provided persistent state.
pub trait StateDb: Send + Sync {
	fn fetch(&self, key: &str) -> Result<Option<Value>>;

	fn save(&self, key: &str, value: Value) -> Result<()>;

	/// Removes `key`. Returns the previous value, if any.
	fn remove(&self, key: &str) -> Result<Option<Value>>;

	fn keys(&self) -> Result<Vec<String>>;
}

/// Non-persistent [`StateDb`] for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryStateDb {
	entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStateDb {
	pub fn new() -> Self {
		Self::default()
	}
}

impl StateDb for MemoryStateDb {
	fn fetch(&self, key: &str) -> Result<Option<Value>> {
		Ok(self.entries.lock().get(key).cloned())
	}

	fn save(&self, key: &str, value: Value) -> Result<()> {
		self.entries.lock().insert(key.to_string(), value);
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<Option<Value>> {
		Ok(self.entries.lock().remove(key))
	}

	fn keys(&self) -> Result<Vec<String>> {
		Ok(self.entries.lock().keys().cloned().collect())
	}
}
