use serde::{Deserialize, Serialize};

use crate::host::Area;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Debugger settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebuggerConfig {
	pub schema: u32,
	pub sidebar: SidebarConfig,
	pub panels: PanelConfig,
}

impl Default for DebuggerConfig {
	fn default() -> Self {
		Self {
			schema: CONFIG_SCHEMA_VERSION,
			sidebar: SidebarConfig::default(),
			panels: PanelConfig::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SidebarConfig {
	pub id: String,
	pub label: String,
	pub area: Area,
	/// Focus the sidebar when it is attached.
	pub activate: bool,
}

impl Default for SidebarConfig {
	fn default() -> Self {
		Self {
			id: "jp-debugger-sidebar".to_string(),
			label: "Environment".to_string(),
			area: Area::Right,
			activate: false,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
	/// State DB key the open-panel list is stored under.
	pub namespace: String,
	/// Re-create saved panels on startup.
	pub restore: bool,
}

impl Default for PanelConfig {
	fn default() -> Self {
		Self {
			namespace: "debugger".to_string(),
			restore: true,
		}
	}
}
