//! Text rows → typed records.
//!
//! Column positions follow the select lists in `queries.rs`. Unparsable numbers become 0
//! and are logged here, so nothing downstream has to deal with malformed input.

use tracing::debug;

use super::Rows;
use crate::model::{
    ActiveStatementRow, BgwriterCounters, DatabaseCounters, InstanceInfo, LockRow, SessionRow,
    SessionStateRow, WaitEventRow,
};

fn text(row: &[String], idx: usize) -> String {
    row.get(idx).map(|s| s.trim().to_string()).unwrap_or_default()
}

fn int(row: &[String], idx: usize, field: &str) -> i64 {
    let raw = row.get(idx).map(|s| s.trim()).unwrap_or("");
    if raw.is_empty() {
        return 0;
    }
    raw.parse::<i64>()
        .or_else(|_| raw.parse::<f64>().map(|f| f as i64))
        .unwrap_or_else(|_| {
            debug!(field, value = raw, "unparsable integer field, using 0");
            0
        })
}

fn uint(row: &[String], idx: usize, field: &str) -> u64 {
    int(row, idx, field).max(0) as u64
}

fn float(row: &[String], idx: usize, field: &str) -> f64 {
    let raw = row.get(idx).map(|s| s.trim()).unwrap_or("");
    if raw.is_empty() {
        return 0.0;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            debug!(field, value = raw, "unparsable numeric field, using 0");
            0.0
        }
    }
}

pub(super) fn server_version(rows: &Rows) -> Option<i32> {
    rows.first()
        .and_then(|row| row.first())
        .and_then(|v| v.trim().parse().ok())
}

pub(super) fn instance(rows: &Rows) -> InstanceInfo {
    let Some(row) = rows.first() else {
        return InstanceInfo::default();
    };
    InstanceInfo {
        database: text(row, 0),
        host: text(row, 1),
        port: text(row, 2),
        version: text(row, 3),
        start_time: text(row, 4),
        uptime_secs: int(row, 5, "uptime"),
    }
}

pub(super) fn databases(rows: &Rows) -> Vec<DatabaseCounters> {
    rows.iter()
        .map(|row| DatabaseCounters {
            name: text(row, 0),
            backends: int(row, 1, "numbackends"),
            xact_commit: int(row, 2, "xact_commit"),
            xact_rollback: int(row, 3, "xact_rollback"),
            blks_read: int(row, 4, "blks_read"),
            blks_hit: int(row, 5, "blks_hit"),
            tup_returned: int(row, 6, "tup_returned"),
            tup_fetched: int(row, 7, "tup_fetched"),
            tup_inserted: int(row, 8, "tup_inserted"),
            tup_updated: int(row, 9, "tup_updated"),
            tup_deleted: int(row, 10, "tup_deleted"),
        })
        .collect()
}

pub(super) fn session_states(rows: &Rows) -> Vec<SessionStateRow> {
    rows.iter()
        .map(|row| SessionStateRow {
            state: text(row, 0),
            wait_type: text(row, 1),
            count: int(row, 2, "sessions"),
        })
        .collect()
}

/// Cumulative wait counters; `total_wait_time` arrives in microseconds.
pub(super) fn wait_events(rows: &Rows) -> Vec<WaitEventRow> {
    rows.iter()
        .map(|row| WaitEventRow {
            event: text(row, 0),
            class: text(row, 1),
            waits: uint(row, 2, "wait"),
            time_ms: float(row, 3, "total_wait_time").max(0.0) / 1000.0,
        })
        .collect()
}

/// (event, class, sessions waiting now).
pub(super) fn sampled_waits(rows: &Rows) -> Vec<(String, String, u64)> {
    rows.iter()
        .map(|row| (text(row, 0), text(row, 1), uint(row, 2, "count")))
        .collect()
}

pub(super) fn active_statements(rows: &Rows) -> Vec<ActiveStatementRow> {
    rows.iter()
        .map(|row| ActiveStatementRow {
            runtime_secs: int(row, 0, "runtime"),
            wait_type: text(row, 1),
            query: row.get(2).cloned().unwrap_or_default(),
        })
        .collect()
}

pub(super) fn sessions(rows: &Rows) -> Vec<SessionRow> {
    rows.iter()
        .map(|row| {
            let query = row.get(8).cloned().unwrap_or_default();
            SessionRow {
                pid: int(row, 0, "pid"),
                user: text(row, 1),
                program: text(row, 2),
                client: text(row, 3),
                module: text(row, 4),
                action: statement_keyword(&query),
                state: text(row, 5),
                wait_type: text(row, 6),
                runtime_secs: int(row, 7, "runtime"),
                query,
            }
        })
        .collect()
}

pub(super) fn locks(rows: &Rows) -> Vec<LockRow> {
    rows.iter()
        .map(|row| LockRow {
            mode: text(row, 0),
            lock_type: text(row, 1),
            granted: matches!(text(row, 2).as_str(), "t" | "true" | "on" | "1"),
            count: int(row, 3, "count"),
        })
        .collect()
}

pub(super) fn bgwriter(rows: &Rows) -> BgwriterCounters {
    let Some(row) = rows.first() else {
        return BgwriterCounters::default();
    };
    BgwriterCounters {
        checkpoints_timed: int(row, 0, "checkpoints_timed"),
        checkpoints_req: int(row, 1, "checkpoints_req"),
        buffers_checkpoint: int(row, 2, "buffers_checkpoint"),
        buffers_clean: int(row, 3, "buffers_clean"),
        maxwritten_clean: int(row, 4, "maxwritten_clean"),
        buffers_backend: int(row, 5, "buffers_backend"),
        buffers_alloc: int(row, 6, "buffers_alloc"),
    }
}

/// Leading SQL keyword, upper-cased. Empty for empty statements.
fn statement_keyword(query: &str) -> String {
    query
        .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
        .find(|w| !w.is_empty())
        .map(|w| w.to_ascii_uppercase())
        .unwrap_or_default()
}
