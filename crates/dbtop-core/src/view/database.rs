//! Database dashboard tables: instance, database gauges, session summary, waits, locks.

use crate::fmt::{format_delta, format_duration, format_ms, format_pct, format_rate};
use crate::mode::{ModeState, WaitMode};
use crate::model::{Snapshot, Source};
use crate::rates::{DatabaseRates, DeltaSet, WaitCounters, WaitDelta};
use crate::view::common::{RowStyleClass, Section, Table};

/// Wait events shown in section 3.
pub const TOP_WAITS: usize = 5;
/// Lock-mode rows in the locks appendage.
pub const TOP_LOCKS: usize = 5;

const DB_HEADERS: &[&str] = &[
    "DATABASE", "SESSIONS", "COMMIT/S", "ROLLBACK/S", "READ/S", "HIT/S", "HIT%",
];
const DB_DETAILED_HEADERS: &[&str] = &["RET/S", "FETCH/S", "INS/S", "UPD/S", "DEL/S"];

/// Falls back to an unavailable table when the source failed this cycle.
fn unavailable(snapshot: &Snapshot, source: Source, section: Section, title: &str) -> Option<Table> {
    snapshot
        .unavailable_reason(source)
        .map(|reason| Table::unavailable(section, title, reason))
}

pub fn instance_table(snapshot: &Snapshot) -> Option<Table> {
    const TITLE: &str = "Instance";
    if let Some(t) = unavailable(snapshot, Source::Instance, Section::Summary, TITLE) {
        return Some(t);
    }
    let info = snapshot.instance()?;
    let mut table = Table::new(
        Section::Summary,
        TITLE,
        &["DATABASE", "HOST", "PORT", "VERSION", "START TIME", "UPTIME"],
    );
    table.push(
        vec![
            info.database.clone(),
            info.host.clone(),
            info.port.clone(),
            info.version.clone(),
            info.start_time.clone(),
            format_duration(info.uptime_secs),
        ],
        RowStyleClass::Normal,
    );
    Some(table)
}

pub fn database_table(snapshot: &Snapshot, delta: &DeltaSet, mode: &ModeState) -> Option<Table> {
    const TITLE: &str = "Database statistics";
    if let Some(t) = unavailable(snapshot, Source::Databases, Section::Gauges, TITLE) {
        return Some(t);
    }
    if snapshot.databases().is_empty() {
        return None;
    }

    let mut headers: Vec<&str> = DB_HEADERS.to_vec();
    if mode.detailed {
        headers.extend_from_slice(DB_DETAILED_HEADERS);
    }
    let mut table = Table::new(Section::Gauges, TITLE, &headers);

    for db in snapshot.databases() {
        let r: DatabaseRates = delta.databases.get(&db.name).copied().unwrap_or_default();
        let mut cells = vec![
            db.name.clone(),
            db.backends.to_string(),
            format_rate(r.commit_s),
            format_rate(r.rollback_s),
            format_rate(r.blks_read_s),
            format_rate(r.blks_hit_s),
            format_pct(r.hit_pct),
        ];
        if mode.detailed {
            cells.extend([
                format_rate(r.tup_returned_s),
                format_rate(r.tup_fetched_s),
                format_rate(r.tup_inserted_s),
                format_rate(r.tup_updated_s),
                format_rate(r.tup_deleted_s),
            ]);
        }
        let style = match r.hit_pct {
            Some(pct) if pct < 90.0 => RowStyleClass::Warning,
            _ if db.backends > 0 => RowStyleClass::Normal,
            _ => RowStyleClass::Dimmed,
        };
        table.push(cells, style);
    }
    Some(table)
}

pub fn session_summary_table(snapshot: &Snapshot) -> Option<Table> {
    const TITLE: &str = "Session summary";
    if let Some(t) = unavailable(snapshot, Source::SessionStates, Section::Gauges, TITLE) {
        return Some(t);
    }
    if snapshot.session_states().is_empty() {
        return None;
    }
    let mut table = Table::new(Section::Gauges, TITLE, &["STATE", "WAIT TYPE", "COUNT"]);
    for row in snapshot.session_states() {
        table.push(
            vec![row.state.clone(), row.wait_type.clone(), row.count.to_string()],
            state_style(&row.state, &row.wait_type),
        );
    }
    Some(table)
}

pub fn bgwriter_table(snapshot: &Snapshot, delta: &DeltaSet) -> Option<Table> {
    const TITLE: &str = "Background writer";
    if let Some(t) = unavailable(snapshot, Source::Bgwriter, Section::Gauges, TITLE) {
        return Some(t);
    }
    snapshot.bgwriter()?;
    let d = delta.bgwriter;
    let mut table = Table::new(
        Section::Gauges,
        TITLE,
        &[
            "CKPT TIMED",
            "CKPT REQ",
            "BUF CKPT",
            "BUF CLEAN",
            "MAXWRITTEN",
            "BUF BACKEND",
            "BUF ALLOC",
        ],
    );
    table.push(
        vec![
            format_delta(d.map(|d| d.checkpoints_timed)),
            format_delta(d.map(|d| d.checkpoints_req)),
            format_delta(d.map(|d| d.buffers_checkpoint)),
            format_delta(d.map(|d| d.buffers_clean)),
            format_delta(d.map(|d| d.maxwritten_clean)),
            format_delta(d.map(|d| d.buffers_backend)),
            format_delta(d.map(|d| d.buffers_alloc)),
        ],
        match d {
            Some(d) if d.checkpoints_req > 0 || d.maxwritten_clean > 0 => RowStyleClass::Warning,
            _ => RowStyleClass::Normal,
        },
    );
    Some(table)
}

/// Top wait events by time-in-wait for the selected wait mode.
pub fn waits_table(snapshot: &Snapshot, delta: &DeltaSet, mode: &ModeState) -> Option<Table> {
    let title = format!("Wait events ({})", mode.wait_mode.label());
    if let Some(t) = unavailable(snapshot, Source::WaitEvents, Section::Activity, &title) {
        return Some(t);
    }

    let pick = |w: &WaitDelta| -> WaitCounters {
        match mode.wait_mode {
            WaitMode::Cumulative => w.cumulative,
            WaitMode::Realtime => w.realtime,
        }
    };

    let mut waits: Vec<(&WaitDelta, WaitCounters)> =
        delta.waits.iter().map(|w| (w, pick(w))).collect();
    waits.sort_by(|(a, ca), (b, cb)| {
        cb.time_ms
            .total_cmp(&ca.time_ms)
            .then_with(|| a.event.cmp(&b.event))
    });
    waits.truncate(TOP_WAITS);

    let mut table = Table::new(
        Section::Activity,
        title,
        &["EVENT", "CLASS", "WAITS", "TIME(ms)", "AVG(ms)"],
    );
    for (w, c) in waits {
        table.push(
            vec![
                w.event.clone(),
                w.class.clone(),
                c.waits.to_string(),
                format_ms(c.time_ms),
                format_ms(c.avg_ms()),
            ],
            if c.waits == 0 {
                RowStyleClass::Dimmed
            } else {
                RowStyleClass::Normal
            },
        );
    }
    Some(table)
}

pub fn locks_table(snapshot: &Snapshot) -> Option<Table> {
    const TITLE: &str = "Locks";
    if let Some(t) = unavailable(snapshot, Source::Locks, Section::Locks, TITLE) {
        return Some(t);
    }
    if snapshot.locks().is_empty() {
        return None;
    }

    let mut locks: Vec<_> = snapshot.locks().iter().collect();
    locks.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.mode.cmp(&b.mode)));
    locks.truncate(TOP_LOCKS);

    let mut table = Table::new(Section::Locks, TITLE, &["MODE", "TYPE", "GRANTED", "COUNT"]);
    for lock in locks {
        table.push(
            vec![
                lock.mode.clone(),
                lock.lock_type.clone(),
                if lock.granted { "yes" } else { "no" }.to_string(),
                lock.count.to_string(),
            ],
            if lock.granted {
                RowStyleClass::Normal
            } else {
                RowStyleClass::CriticalBold
            },
        );
    }
    Some(table)
}

pub(crate) fn state_style(state: &str, wait_type: &str) -> RowStyleClass {
    let waiting = !wait_type.is_empty() && !wait_type.eq_ignore_ascii_case("none");
    match state {
        "active" if waiting => RowStyleClass::Warning,
        "active" => RowStyleClass::Active,
        "idle" => RowStyleClass::Dimmed,
        s if s.starts_with("idle in transaction") => RowStyleClass::Warning,
        _ => RowStyleClass::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataBlock, LockRow, WaitEventRow};
    use crate::rates::DeltaEngine;

    fn waits_snapshot(rows: &[(&str, u64, f64)]) -> Snapshot {
        Snapshot::new(0).with_block(DataBlock::PgWaitEvents(
            rows.iter()
                .map(|(e, n, t)| WaitEventRow {
                    event: e.to_string(),
                    class: "IO".into(),
                    waits: *n,
                    time_ms: *t,
                })
                .collect(),
        ))
    }

    #[test]
    fn waits_ordered_by_time_and_capped() {
        let snap = waits_snapshot(&[
            ("a", 1, 10.0),
            ("b", 1, 60.0),
            ("c", 1, 30.0),
            ("d", 1, 50.0),
            ("e", 1, 20.0),
            ("f", 1, 40.0),
        ]);
        let delta = DeltaEngine::new().compute(None, &snap, 1.0);
        let table = waits_table(&snap, &delta, &ModeState::default()).unwrap();
        let events: Vec<&str> = table.rows.iter().map(|r| r.cells[0].as_str()).collect();
        assert_eq!(events, vec!["b", "d", "f", "c", "e"]);
    }

    #[test]
    fn realtime_mode_orders_by_realtime_time() {
        let mut engine = DeltaEngine::new();
        let first = waits_snapshot(&[("big", 100, 10_000.0), ("small", 1, 1.0)]);
        engine.compute(None, &first, 1.0);
        let second = waits_snapshot(&[("big", 101, 10_001.0), ("small", 50, 500.0)]);
        let delta = engine.compute(Some(&first), &second, 1.0);

        let mode = ModeState {
            wait_mode: WaitMode::Realtime,
            ..Default::default()
        };
        let table = waits_table(&second, &delta, &mode).unwrap();
        assert_eq!(table.title, "Wait events (real-time)");
        assert_eq!(table.rows[0].cells[0], "small");
        assert_eq!(table.rows[0].cells[2], "49");

        let cumulative = waits_table(&second, &delta, &ModeState::default()).unwrap();
        assert_eq!(cumulative.rows[0].cells[0], "big");
    }

    #[test]
    fn failed_source_renders_unavailable() {
        let mut snap = Snapshot::new(0);
        snap.mark_unavailable(Source::WaitEvents, "relation does not exist");
        let delta = DeltaSet::default();
        let table = waits_table(&snap, &delta, &ModeState::default()).unwrap();
        assert!(table.is_unavailable());
        assert_eq!(table.section, Section::Activity);
    }

    #[test]
    fn locks_top_by_count() {
        let snap = Snapshot::new(0).with_block(DataBlock::PgLocks(
            (0..7)
                .map(|i| LockRow {
                    mode: format!("m{}", i),
                    lock_type: "relation".into(),
                    granted: i != 6,
                    count: i,
                })
                .collect(),
        ));
        let table = locks_table(&snap).unwrap();
        assert_eq!(table.rows.len(), TOP_LOCKS);
        assert_eq!(table.rows[0].cells, vec!["m6", "relation", "no", "6"]);
        assert_eq!(table.rows[0].style, RowStyleClass::CriticalBold);
    }

    #[test]
    fn detailed_adds_tuple_rates() {
        let snap = Snapshot::new(0).with_block(DataBlock::PgDatabases(vec![Default::default()]));
        let delta = DeltaEngine::new().compute(None, &snap, 1.0);
        let standard = database_table(&snap, &delta, &ModeState::default()).unwrap();
        let detailed = database_table(
            &snap,
            &delta,
            &ModeState {
                detailed: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(standard.headers.len(), 7);
        assert_eq!(detailed.headers.len(), 12);
        assert_eq!(standard.rows[0].cells[2], "N/A");
    }

    #[test]
    fn state_styles() {
        assert_eq!(state_style("active", "Lock"), RowStyleClass::Warning);
        assert_eq!(state_style("active", "none"), RowStyleClass::Active);
        assert_eq!(state_style("idle", ""), RowStyleClass::Dimmed);
        assert_eq!(
            state_style("idle in transaction", ""),
            RowStyleClass::Warning
        );
    }
}
