//! Help popup listing the key bindings.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::mode::ModeState;
use crate::tui::style::Styles;

const BINDINGS: &[(&str, &str)] = &[
    ("d", "toggle detailed columns"),
    ("w", "toggle cumulative / real-time waits"),
    ("s", "toggle SQL / session view"),
    ("m", "toggle user-program / module-action"),
    ("1-4", "show one section (again: all)"),
    ("0, a", "show all sections"),
    ("p, space", "pause / resume"),
    ("i", "change refresh interval"),
    ("c / M", "sort processes by CPU / memory"),
    ("+ / -", "more / fewer rows"),
    ("h, ?", "toggle this help"),
    ("q, Ctrl-C", "quit"),
];

fn help_lines(mode: &ModeState) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = BINDINGS
        .iter()
        .map(|(key, text)| {
            Line::from(vec![
                Span::styled(format!("{:>10}  ", key), Styles::help_key()),
                Span::raw(*text),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "top {} rows, sorted by {}, refresh every {}s",
            mode.top_n,
            mode.sort,
            mode.interval.as_secs()
        ),
        Styles::dim(),
    )));
    lines
}

/// Renders the help popup centered on screen.
pub fn render_help(frame: &mut Frame, area: Rect, mode: &ModeState) {
    let lines = help_lines(mode);
    let popup_width = (area.width * 60 / 100).clamp(40.min(area.width), 64.min(area.width));
    let popup_height = (lines.len() as u16 + 2).min(area.height);
    let popup_area = Rect::new(
        area.x + (area.width.saturating_sub(popup_width)) / 2,
        area.y + (area.height.saturating_sub(popup_height)) / 2,
        popup_width,
        popup_height,
    );

    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .title(" Keys ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}
