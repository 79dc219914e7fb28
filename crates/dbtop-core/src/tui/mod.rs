//! Interactive terminal UI.
//!
//! Single-threaded: the loop polls input with a bounded wait, accumulates waited time
//! toward the refresh interval and samples when it is reached. Keys redraw from the last
//! sample.

mod app;
mod event;
mod render;
pub(crate) mod style;
mod widgets;

pub use app::{App, TuiError};
pub use event::{CrosstermEvents, Event, EventSource, POLL_TIMEOUT, ScriptedEvents, key_from_crossterm};
