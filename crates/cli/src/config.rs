//! Loads [`DebuggerConfig`] from `--config`.

use std::path::Path;

use anyhow::Context;
use kdbg::{CONFIG_SCHEMA_VERSION, DebuggerConfig};
use tracing::{debug, warn};

use crate::error::{CliError, Result};

/// Reads the config file, or returns defaults when no path is given.
/// A missing or malformed file is an error.
pub fn load_config(path: Option<&Path>) -> Result<DebuggerConfig> {
	let Some(path) = path else {
		debug!(target: "kdbg.cli", "using default config");
		return Ok(DebuggerConfig::default());
	};

	let config = read_config(path).map_err(|source| CliError::Config {
		path: path.to_path_buf(),
		source,
	})?;
	if config.schema != CONFIG_SCHEMA_VERSION {
		warn!(
			target: "kdbg.cli",
			path = %path.display(),
			schema = config.schema,
			expected = CONFIG_SCHEMA_VERSION,
			"config schema mismatch; unknown fields are ignored"
		);
	}
	debug!(target: "kdbg.cli", path = %path.display(), "loaded config");
	Ok(config)
}

fn read_config(path: &Path) -> anyhow::Result<DebuggerConfig> {
	let content = std::fs::read_to_string(path).context("read failed")?;
	serde_json::from_str(&content).context("invalid JSON")
}

#[cfg(test)]
mod tests {
	use std::fs;

	use kdbg::host::Area;
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn no_path_means_defaults() {
		assert_eq!(load_config(None).unwrap(), DebuggerConfig::default());
	}

	#[test]
	fn reads_partial_config() {
		let temp = TempDir::new().unwrap();
		let path = temp.path().join("kdbg.json");
		fs::write(&path, r#"{"sidebar": {"area": "left"}, "panels": {"namespace": "dbg"}}"#).unwrap();

		let config = load_config(Some(path.as_path())).unwrap();
		assert_eq!(config.sidebar.area, Area::Left);
		assert_eq!(config.panels.namespace, "dbg");
		assert!(config.panels.restore);
	}

	#[test]
	fn missing_or_malformed_file_is_an_error() {
		let temp = TempDir::new().unwrap();
		let missing = temp.path().join("missing.json");
		assert!(matches!(load_config(Some(missing.as_path())), Err(CliError::Config { .. })));

		let bad = temp.path().join("bad.json");
		fs::write(&bad, "{ not json").unwrap();
		let err = load_config(Some(bad.as_path())).unwrap_err();
		assert!(err.to_string().contains("invalid JSON"));
	}
}
