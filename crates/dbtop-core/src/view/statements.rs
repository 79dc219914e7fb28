//! Section 4 on a database: grouped active statements or the top sessions.

use std::collections::HashMap;

use crate::fmt::{flatten_and_truncate, format_duration};
use crate::mode::{DetailView, Grouping, ModeState};
use crate::model::{ActiveStatementRow, SessionRow, Snapshot, Source};
use crate::view::common::{RowStyleClass, Section, Table};
use crate::view::database::state_style;

/// Grouping key length for active statements.
pub const SQL_GROUP_CHARS: usize = 120;
/// Query text length in the session table.
pub const SESSION_SQL_CHARS: usize = 80;
pub const TOP_STATEMENTS: usize = 10;

/// Sessions running longer than this are highlighted.
const LONG_RUNNING_SECS: i64 = 60;

/// Active statements folded by their cut-down text.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementGroup {
    pub query: String,
    pub count: usize,
    pub max_runtime_secs: i64,
    pub waiting: usize,
}

/// Groups statements by flattened text cut to [`SQL_GROUP_CHARS`].
///
/// The cut happens before grouping, so texts that only differ past the limit merge. Groups
/// are ordered by count descending, ties by first appearance.
pub fn group_statements(rows: &[ActiveStatementRow]) -> Vec<StatementGroup> {
    let mut groups: Vec<StatementGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let key = flatten_and_truncate(&row.query, SQL_GROUP_CHARS);
        let waiting = usize::from(is_waiting(&row.wait_type));
        match index.get(&key) {
            Some(&i) => {
                let g = &mut groups[i];
                g.count += 1;
                g.max_runtime_secs = g.max_runtime_secs.max(row.runtime_secs);
                g.waiting += waiting;
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(StatementGroup {
                    query: key,
                    count: 1,
                    max_runtime_secs: row.runtime_secs,
                    waiting,
                });
            }
        }
    }

    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

pub fn detail_table(snapshot: &Snapshot, mode: &ModeState) -> Option<Table> {
    match mode.view {
        DetailView::Sql => statements_table(snapshot),
        DetailView::Session => sessions_table(snapshot, mode),
    }
}

fn statements_table(snapshot: &Snapshot) -> Option<Table> {
    const TITLE: &str = "Active statements";
    if let Some(reason) = snapshot.unavailable_reason(Source::ActiveStatements) {
        return Some(Table::unavailable(Section::Detail, TITLE, reason));
    }

    let mut table = Table::new(
        Section::Detail,
        TITLE,
        &["EXECS", "WAITING", "MAX TIME", "QUERY"],
    );
    for g in group_statements(snapshot.active_statements())
        .into_iter()
        .take(TOP_STATEMENTS)
    {
        let style = if g.max_runtime_secs >= LONG_RUNNING_SECS {
            RowStyleClass::Critical
        } else if g.waiting > 0 {
            RowStyleClass::Warning
        } else {
            RowStyleClass::Normal
        };
        table.push(
            vec![
                g.count.to_string(),
                g.waiting.to_string(),
                format_duration(g.max_runtime_secs),
                g.query,
            ],
            style,
        );
    }
    Some(table)
}

/// Non-idle sessions, longest running first.
pub fn top_sessions(rows: &[SessionRow], top_n: usize) -> Vec<&SessionRow> {
    let mut sessions: Vec<&SessionRow> = rows.iter().filter(|s| s.state != "idle").collect();
    sessions.sort_by(|a, b| {
        b.runtime_secs
            .cmp(&a.runtime_secs)
            .then_with(|| a.pid.cmp(&b.pid))
    });
    sessions.truncate(top_n);
    sessions
}

fn sessions_table(snapshot: &Snapshot, mode: &ModeState) -> Option<Table> {
    const TITLE: &str = "Sessions";
    if let Some(reason) = snapshot.unavailable_reason(Source::Sessions) {
        return Some(Table::unavailable(Section::Detail, TITLE, reason));
    }

    let pair: [&str; 2] = match mode.grouping {
        Grouping::UserProgram => ["USER", "PROGRAM"],
        Grouping::ModuleAction => ["MODULE", "ACTION"],
    };
    let mut headers = vec!["PID", pair[0], pair[1]];
    if mode.detailed {
        headers.push("CLIENT");
    }
    headers.extend_from_slice(&["STATE", "WAIT", "RUNTIME", "QUERY"]);

    let mut table = Table::new(Section::Detail, TITLE, &headers);
    for s in top_sessions(snapshot.sessions(), mode.top_n) {
        let (first, second) = match mode.grouping {
            Grouping::UserProgram => (&s.user, &s.program),
            Grouping::ModuleAction => (&s.module, &s.action),
        };
        let mut cells = vec![s.pid.to_string(), first.clone(), second.clone()];
        if mode.detailed {
            cells.push(s.client.clone());
        }
        cells.extend([
            s.state.clone(),
            s.wait_type.clone(),
            format_duration(s.runtime_secs),
            flatten_and_truncate(&s.query, SESSION_SQL_CHARS),
        ]);

        let style = if s.runtime_secs >= LONG_RUNNING_SECS && s.state == "active" {
            RowStyleClass::Critical
        } else {
            state_style(&s.state, &s.wait_type)
        };
        table.push(cells, style);
    }
    Some(table)
}

fn is_waiting(wait_type: &str) -> bool {
    !wait_type.is_empty() && !wait_type.eq_ignore_ascii_case("none")
}
