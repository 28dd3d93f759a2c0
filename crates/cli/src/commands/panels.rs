use kdbg::{DebuggerConfig, PanelTracker, StateDb};
use tracing::info;

use crate::error::Result;
use crate::output::PanelsData;

pub fn list(config: &DebuggerConfig, state: &dyn StateDb) -> Result<PanelsData> {
	let tracker = PanelTracker::new(config.panels.namespace.clone());
	let panels = tracker.saved_ids(state)?;
	Ok(PanelsData {
		namespace: config.panels.namespace.clone(),
		panels,
		cleared: None,
	})
}

pub fn clear(config: &DebuggerConfig, state: &dyn StateDb) -> Result<PanelsData> {
	let namespace = config.panels.namespace.clone();
	let cleared = state.remove(&namespace)?.is_some();
	if cleared {
		info!(target: "kdbg.cli", %namespace, "cleared saved panels");
	}
	Ok(PanelsData {
		namespace,
		panels: Vec::new(),
		cleared: Some(cleared),
	})
}
