//! View model: (snapshot pair, delta set, mode) → [`TableSet`].
//!
//! Rendering is pure. The same inputs always give the same tables, so a mode toggle can
//! redraw from the last sample without touching any source.

pub mod common;
pub mod database;
pub mod host;
pub mod statements;

pub use common::{RowStyleClass, Section, Table, TableRow, TableSet};

use crate::mode::ModeState;
use crate::model::Snapshot;
use crate::rates::DeltaSet;

/// The two snapshots a delta set was computed from.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPair<'a> {
    pub previous: Option<&'a Snapshot>,
    pub current: &'a Snapshot,
}

impl<'a> SnapshotPair<'a> {
    pub fn new(previous: Option<&'a Snapshot>, current: &'a Snapshot) -> Self {
        Self { previous, current }
    }
}

/// Builds the frame for one sample.
///
/// With database data the layout is instance, gauges, waits, statements or sessions, then
/// locks. Without it the host layout is used. The section filter of `mode` is applied last.
pub fn render(pair: SnapshotPair<'_>, delta: &DeltaSet, mode: &ModeState) -> TableSet {
    let snapshot = pair.current;
    let candidates: Vec<Option<Table>> = if snapshot.has_database() {
        vec![
            database::instance_table(snapshot),
            database::database_table(snapshot, delta, mode),
            host::host_gauges_table(snapshot, delta),
            database::session_summary_table(snapshot),
            mode.detailed
                .then(|| database::bgwriter_table(snapshot, delta))
                .flatten(),
            database::waits_table(snapshot, delta, mode),
            statements::detail_table(snapshot, mode),
            database::locks_table(snapshot),
        ]
    } else {
        vec![
            host::host_summary_table(snapshot),
            host::host_gauges_table(snapshot, delta),
            host::process_states_table(snapshot),
            host::top_processes_table(snapshot, delta, mode),
        ]
    };

    let mut tables: Vec<Table> = candidates
        .into_iter()
        .flatten()
        .filter(|t| t.section.selected_by(mode.section))
        .collect();
    tables.sort_by_key(|t| t.section);

    TableSet {
        timestamp_ms: snapshot.timestamp_ms,
        tables,
    }
}
