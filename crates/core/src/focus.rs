//! Shell focus → active session type.

use kdbg_protocol::SessionType;
use tracing::debug;

use crate::coordinator::BreakpointCoordinator;
use crate::handlers::Subscription;
use crate::host::{FocusChange, Shell, Widget};

/// Reports the session type of the focused widget to the coordinator.
///
/// Holds nothing but its subscription; dropping it stops the routing.
#[derive(Debug)]
pub struct FocusRouter {
	_subscription: Subscription,
}

impl FocusRouter {
	pub fn new(shell: &Shell, coordinator: BreakpointCoordinator) -> Self {
		let subscription = shell
			.current_changed()
			.connect(move |change: &FocusChange| route(&coordinator, change.new.as_deref()));
		Self {
			_subscription: subscription,
		}
	}
}

/// Applies one focus change. Widgets without an attached session map to
/// [`SessionType::None`], as does an empty focus.
pub fn route(coordinator: &BreakpointCoordinator, widget: Option<&dyn Widget>) {
	let session_type = widget
		.and_then(|w| w.session())
		.map_or(SessionType::None, |session| session.kind);
	debug!(
		target: "kdbg.focus",
		widget = widget.map(|w| w.id()),
		session_type = %session_type,
		"focus changed"
	);
	coordinator.set_active_session_type(session_type);
}
