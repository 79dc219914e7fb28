//! Stacked dashboard tables.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph, Row, Table as TableWidget};

use crate::tui::style::Styles;
use crate::view::{Table, TableSet};

/// Lines a table occupies: title, header, rows, one spacer.
fn table_height(table: &Table) -> u16 {
    (table.rows.len() + 3).min(u16::MAX as usize) as u16
}

/// Column widths fitting the widest cell, the last column taking the rest.
fn column_widths(table: &Table) -> Vec<Constraint> {
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (idx, cell) in row.cells.iter().enumerate() {
            if let Some(w) = widths.get_mut(idx) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let last = widths.len().saturating_sub(1);
    widths
        .into_iter()
        .enumerate()
        .map(|(idx, w)| {
            let w = w.min(u16::MAX as usize) as u16;
            if idx == last {
                Constraint::Min(w)
            } else {
                Constraint::Length(w)
            }
        })
        .collect()
}

/// Renders tables top to bottom. Tables that do not fit are cut at the bottom.
pub fn render_tables(frame: &mut Frame, area: Rect, set: &TableSet) {
    let mut constraints: Vec<Constraint> = set
        .tables
        .iter()
        .map(|t| Constraint::Length(table_height(t)))
        .collect();
    constraints.push(Constraint::Min(0));
    let chunks = Layout::vertical(constraints).split(area);

    for (table, chunk) in set.tables.iter().zip(chunks.iter()) {
        if chunk.height == 0 {
            break;
        }
        let header = Row::new(table.headers.clone()).style(Styles::table_header());
        let rows = table
            .rows
            .iter()
            .map(|r| Row::new(r.cells.clone()).style(Styles::from_class(r.style)));
        let widget = TableWidget::new(rows, column_widths(table))
            .header(header)
            .column_spacing(2)
            .block(Block::default().title(Line::styled(table.title.clone(), Styles::table_title())));
        frame.render_widget(widget, *chunk);
    }
}

/// Placeholder shown before the first sample is available.
pub fn render_waiting(frame: &mut Frame, area: Rect) {
    frame.render_widget(
        Paragraph::new("waiting for first sample...").style(Styles::dim()),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{RowStyleClass, Section};

    #[test]
    fn widths_follow_widest_cell() {
        let mut t = Table::new(Section::Locks, "Locks", &["MODE", "COUNT"]);
        t.push(vec!["AccessShareLock".into(), "3".into()], RowStyleClass::Normal);
        assert_eq!(
            column_widths(&t),
            vec![Constraint::Length(15), Constraint::Min(5)]
        );
        assert_eq!(table_height(&t), 4);
    }
}
