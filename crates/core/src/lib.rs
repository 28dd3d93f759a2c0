//! kdbg: session-aware breakpoint coordination
//!
//! Keeps one coherent view of debugger state while the user moves between
//! notebooks, consoles, and file editors that are each optionally backed by a
//! running execution session.
//!
//! # Architecture
//!
//! ```text
//!  shell focus ──► FocusRouter ───────────┐
//!                                         ▼
//!  surfaces ─────► SurfaceTracker ──► BreakpointCoordinator ──► DebuggerModel
//!  (notebook,      (one per family)       (single state)          (panels,
//!   console,                                                       sidebar)
//!   editor)
//! ```
//!
//! [`Debugger`] builds and owns all of the above. Components only report facts
//! to the coordinator; nothing but the coordinator mutates breakpoints or the
//! active session type.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use kdbg::{Debugger, DebuggerConfig, MemoryStateDb, SessionDescriptor, SessionType, SurfaceKind};
//!
//! let debugger = Debugger::new(DebuggerConfig::default(), Arc::new(MemoryStateDb::new()))?;
//! let session = SessionDescriptor { id: "k1".into(), kind: SessionType::Notebook };
//! debugger.open_surface(SurfaceKind::Notebook, "nb-1", vec!["cell-1".into()], Some(session))?;
//! debugger.focus(Some("nb-1"))?;
//! debugger.toggle_breakpoint("nb:cell-1", 5)?;
//! ```

mod app;
mod config;
mod coordinator;
mod error;
mod focus;
mod handlers;
pub mod host;
mod panel;
mod signal;
mod state;
mod tracker;

pub use app::{Debugger, Outcome, command_ids};
pub use config::{CONFIG_SCHEMA_VERSION, DebuggerConfig, PanelConfig, SidebarConfig};
pub use coordinator::{BreakpointCoordinator, Change, Snapshot, Toggle};
pub use error::{Error, Result};
pub use focus::{FocusRouter, route as route_focus};
pub use handlers::{HandlerId, Subscription};
pub use kdbg_protocol::{Breakpoint, HostEvent, SessionDescriptor, SessionType, SourceId, SurfaceKind};
pub use panel::{DebuggerModel, DebuggerPanel, PanelTracker, Sidebar};
pub use signal::Signal;
pub use state::{MemoryStateDb, StateDb};
pub use tracker::{ConsoleTracker, EditorTracker, NotebookTracker, SurfaceState, SurfaceTracker};
