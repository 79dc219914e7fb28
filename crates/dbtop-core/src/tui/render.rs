//! Main rendering logic for TUI.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};

use crate::mode::ModeState;
use crate::view::TableSet;

use super::widgets::{render_footer, render_header, render_help, render_tables, render_waiting};

/// Everything one frame needs, already computed.
pub struct Screen<'a> {
    pub status: String,
    pub tables: Option<TableSet>,
    pub mode: &'a ModeState,
    /// Failure of the most recent sampling attempt.
    pub failure: Option<&'a str>,
}

pub fn render(frame: &mut Frame, screen: &Screen<'_>) {
    let area = frame.area();
    let chunks = Layout::vertical([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Tables
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_header(frame, chunks[0], &screen.status, screen.mode.paused);
    match &screen.tables {
        Some(set) => render_tables(frame, chunks[1], set),
        None => render_waiting(frame, chunks[1]),
    }
    render_footer(frame, chunks[2], screen.mode, screen.failure);

    if screen.mode.show_help {
        render_help(frame, area, screen.mode);
    }
}
