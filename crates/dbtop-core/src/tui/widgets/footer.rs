//! Footer line: interval prompt, input errors, acquisition failures or key hints.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::mode::{InputMode, ModeState};
use crate::tui::style::Styles;

pub fn render_footer(frame: &mut Frame, area: Rect, mode: &ModeState, failure: Option<&str>) {
    let line = if let InputMode::Interval(buffer) = &mode.input {
        Line::from(vec![
            Span::styled("Interval (seconds): ", Styles::help_key()),
            Span::styled(format!("{}_", buffer), Styles::prompt()),
            Span::styled("  Enter apply, Esc cancel", Styles::dim()),
        ])
    } else if let Some(err) = &mode.input_error {
        Line::from(Span::styled(err.clone(), Styles::warning()))
    } else if let Some(failure) = failure {
        Line::from(Span::styled(failure.to_string(), Styles::critical()))
    } else {
        Line::from(vec![
            Span::styled("h", Styles::help_key()),
            Span::styled(" help  ", Styles::dim()),
            Span::styled("p", Styles::help_key()),
            Span::styled(" pause  ", Styles::dim()),
            Span::styled("1-4", Styles::help_key()),
            Span::styled(" section  ", Styles::dim()),
            Span::styled("q", Styles::help_key()),
            Span::styled(" quit", Styles::dim()),
        ])
    };
    frame.render_widget(Paragraph::new(line), area);
}
