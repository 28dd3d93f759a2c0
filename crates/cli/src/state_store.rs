//! File-backed [`StateDb`]: one JSON object per state file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use kdbg::StateDb;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

/// Default state file: `$XDG_STATE_HOME/kdbg/state.json`, falling back to
/// `~/.local/state/kdbg/state.json`.
pub fn default_state_path() -> PathBuf {
	let state_home = std::env::var_os("XDG_STATE_HOME")
		.map(PathBuf::from)
		.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/state")))
		.unwrap_or_else(|| PathBuf::from("."));
	state_home.join("kdbg/state.json")
}

/// Keeps every key in memory and rewrites the whole file on each change.
#[derive(Debug)]
pub struct JsonStateDb {
	path: PathBuf,
	entries: Mutex<BTreeMap<String, Value>>,
}

impl JsonStateDb {
	/// Opens `path`. A missing file is an empty store; a malformed one is an error.
	pub fn open(path: impl Into<PathBuf>) -> kdbg::Result<Self> {
		let path = path.into();
		let entries = match fs::read_to_string(&path) {
			Ok(content) => serde_json::from_str(&content)?,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
			Err(err) => return Err(err.into()),
		};
		debug!(target: "kdbg.cli", path = %path.display(), "opened state file");
		Ok(Self {
			path,
			entries: Mutex::new(entries),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn persist(&self, entries: &BTreeMap<String, Value>) -> kdbg::Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
		Ok(())
	}
}

impl StateDb for JsonStateDb {
	fn fetch(&self, key: &str) -> kdbg::Result<Option<Value>> {
		Ok(self.entries.lock().get(key).cloned())
	}

	fn save(&self, key: &str, value: Value) -> kdbg::Result<()> {
		let mut entries = self.entries.lock();
		entries.insert(key.to_string(), value);
		self.persist(&entries)
	}

	fn remove(&self, key: &str) -> kdbg::Result<Option<Value>> {
		let mut entries = self.entries.lock();
		let removed = entries.remove(key);
		if removed.is_some() {
			self.persist(&entries)?;
		}
		Ok(removed)
	}

	fn keys(&self) -> kdbg::Result<Vec<String>> {
		Ok(self.entries.lock().keys().cloned().collect())
	}
}
