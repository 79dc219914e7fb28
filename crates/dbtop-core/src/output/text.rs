//! Fixed-width text rendering of a [`TableSet`].

use crate::fmt::truncate_chars;
use crate::view::{Table, TableSet};

/// ANSI sequence clearing the screen and homing the cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Formats one table: left-aligned columns joined by two spaces, a dashed separator under
/// the header, trailing blanks trimmed.
pub fn format_table(headers: &[String], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(idx) {
                Some(w) => *w = (*w).max(len),
                None => widths.push(len),
            }
        }
    }

    let join = |cells: &[String]| -> String {
        let line = cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| format!("{:<width$}", cell, width = widths[idx]))
            .collect::<Vec<_>>()
            .join("  ");
        line.trim_end().to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(join(headers));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    lines.extend(rows.iter().map(|r| join(r)));
    lines
}

fn table_lines(table: &Table) -> Vec<String> {
    let rows: Vec<Vec<String>> = table.rows.iter().map(|r| r.cells.clone()).collect();
    let mut lines = vec![table.title.clone()];
    lines.extend(format_table(&table.headers, &rows));
    lines
}

/// Renders a frame: status line, then each table preceded by a blank line.
///
/// With `width`, every line is cut to that many characters.
pub fn render_frame(status: &str, set: &TableSet, width: Option<usize>) -> Vec<String> {
    let mut lines = vec![format!("dbtop  {}", status)];
    for table in &set.tables {
        lines.push(String::new());
        lines.extend(table_lines(table));
    }
    if let Some(width) = width {
        for line in &mut lines {
            *line = truncate_chars(line, width);
        }
    }
    lines
}
