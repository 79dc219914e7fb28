//! Header bar: program name, sample time and mode summary.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::widgets::Paragraph;

use crate::tui::style::Styles;

pub fn render_header(frame: &mut Frame, area: Rect, status: &str, paused: bool) {
    let chunks = Layout::horizontal([
        Constraint::Length(7), // Name
        Constraint::Min(20),   // Status line
        Constraint::Length(9), // LIVE / PAUSED
    ])
    .split(area);

    frame.render_widget(Paragraph::new(" dbtop").style(Styles::header()), chunks[0]);
    frame.render_widget(Paragraph::new(status.to_string()).style(Styles::header()), chunks[1]);

    let mode = if paused { " PAUSED " } else { " LIVE " };
    frame.render_widget(Paragraph::new(mode).style(Styles::header()), chunks[2]);
}
