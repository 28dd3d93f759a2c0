//! Host environment model: the shell, its widgets, and surface collections.
//!
//! These are the collaborators the debugger consumes rather than implements.
//! They carry just enough behaviour to drive the trackers and the focus router.

mod shell;
mod surface;

pub use self::shell::{Area, FocusChange, Shell};
pub use self::surface::{Console, Editor, Notebook, Surface, SurfaceCollection, SurfaceFamily};

use kdbg_protocol::{SessionDescriptor, SurfaceKind};

/// A focusable unit in the shell.
pub trait Widget: Send + Sync + 'static {
	fn id(&self) -> &str;

	/// The execution session attached to this widget, if any.
	fn session(&self) -> Option<SessionDescriptor> {
		None
	}

	/// Surface family, for widgets that are editing surfaces.
	fn surface_kind(&self) -> Option<SurfaceKind> {
		None
	}
}

impl std::fmt::Debug for dyn Widget {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Widget")
			.field("id", &self.id())
			.field("surface_kind", &self.surface_kind())
			.finish()
	}
}
