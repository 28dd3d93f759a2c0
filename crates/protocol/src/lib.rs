//! Data model shared by the kdbg crates.
//!
//! # Main Types
//!
//! - [`SessionType`] - kind of execution surface currently focused
//! - [`SourceId`] - identity of a line-numbered source unit
//! - [`Breakpoint`] - one user-set stop point
//! - [`HostEvent`] - host-side fact replayed from an event script

mod breakpoint;
mod event;
mod session;

pub use breakpoint::{Breakpoint, SourceId};
pub use event::{HostEvent, SessionDescriptor, SurfaceKind};
pub use session::{ParseSessionTypeError, SessionType};
