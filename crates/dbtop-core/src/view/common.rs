//! UI-agnostic view model types.
//!
//! These types carry presentation data without any dependency on a rendering framework.
//! The TUI maps them to ratatui styles, the batch sinks print them as text or JSON.

use serde::Serialize;

/// Row-level style classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStyleClass {
    #[default]
    Normal,
    /// Warning level (TUI: yellow). E.g. a session in a wait.
    Warning,
    /// Critical level (TUI: red). E.g. a failed source.
    Critical,
    /// Critical + bold (TUI: red + bold). Ungranted locks.
    CriticalBold,
    /// Positive/active (TUI: green). E.g. "active" state.
    Active,
    /// Dimmed (TUI: dark gray). E.g. idle sessions.
    Dimmed,
    /// Accent (TUI: cyan). E.g. database server processes.
    Accent,
}

/// Display section. Sections 1 to 4 are selectable; locks only show with all sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Instance identity, or host identity without a database.
    Summary,
    Gauges,
    /// Wait events, or process states without a database.
    Activity,
    /// Statements, sessions or top processes.
    Detail,
    Locks,
}

impl Section {
    /// Key that selects this section, `None` for the locks appendage.
    pub fn number(self) -> Option<u8> {
        match self {
            Section::Summary => Some(1),
            Section::Gauges => Some(2),
            Section::Activity => Some(3),
            Section::Detail => Some(4),
            Section::Locks => None,
        }
    }

    /// True when the section is shown under filter `selected` (0 = all).
    pub fn selected_by(self, selected: u8) -> bool {
        selected == 0 || self.number() == Some(selected)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub style: RowStyleClass,
}

/// A titled table of string cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub section: Section,
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn new(section: Section, title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            section,
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// One-row table standing in for a source that failed this cycle.
    pub fn unavailable(section: Section, title: impl Into<String>, reason: &str) -> Self {
        let mut table = Self::new(section, title, &["STATUS"]);
        table.push(
            vec![format!("unavailable: {}", reason)],
            RowStyleClass::Critical,
        );
        table
    }

    pub fn push(&mut self, cells: Vec<String>, style: RowStyleClass) {
        self.rows.push(TableRow { cells, style });
    }

    pub fn is_unavailable(&self) -> bool {
        self.headers.len() == 1 && self.headers[0] == "STATUS"
    }
}

/// Ordered list of tables making up one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableSet {
    /// Capture time of the displayed sample, Unix milliseconds.
    pub timestamp_ms: i64,
    pub tables: Vec<Table>,
}

impl TableSet {
    pub fn sections(&self) -> Vec<Section> {
        self.tables.iter().map(|t| t.section).collect()
    }

    pub fn table(&self, title_prefix: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.title.starts_with(title_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_numbers() {
        assert_eq!(Section::Summary.number(), Some(1));
        assert_eq!(Section::Detail.number(), Some(4));
        assert_eq!(Section::Locks.number(), None);
        assert!(Section::Locks.selected_by(0));
        assert!(!Section::Locks.selected_by(4));
        assert!(Section::Activity.selected_by(3));
    }

    #[test]
    fn unavailable_table() {
        let t = Table::unavailable(Section::Activity, "Wait events", "permission denied");
        assert!(t.is_unavailable());
        assert_eq!(t.rows[0].cells[0], "unavailable: permission denied");
        assert_eq!(t.rows[0].style, RowStyleClass::Critical);
    }
}
