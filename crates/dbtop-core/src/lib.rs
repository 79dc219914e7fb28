//! dbtop-core: sampling, delta and view engine for the dbtop monitor.
//!
//! Provides:
//! - `collector`: host (`/proc`) and database metric acquisition
//! - `model`: snapshot data model
//! - `provider`: snapshot source abstraction (live, replay)
//! - `rates`: delta engine: rates, percentages, real-time wait baseline
//! - `mode`: display mode state machine
//! - `view`: UI-agnostic table model
//! - `monitor`: sampling step shared by both drivers
//! - `output`: text and JSON batch sinks
//! - `batch`: batch driver
//! - `fmt`: shared formatting helpers
//!
//! With `tui` feature (default):
//! - `tui`: interactive terminal UI (ratatui/crossterm)

pub mod batch;
pub mod collector;
pub mod fmt;
pub mod mode;
pub mod model;
pub mod monitor;
pub mod output;
pub mod provider;
pub mod rates;
pub mod view;

#[cfg(feature = "tui")]
pub mod tui;
