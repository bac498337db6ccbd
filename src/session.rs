//! Session state reconciler
//!
//! Elm Architecture: a pure [`transition`] maps state and event to a new state
//! plus effects, and [`SessionRuntime`] executes the effects against the
//! backend, feeding results back in as events.

mod effect;
pub mod event;
mod runtime;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Notice, NoticeLevel};
pub use event::Event;
pub use runtime::SessionRuntime;
pub use state::{PendingSend, SessionState};
pub use transition::transition;
