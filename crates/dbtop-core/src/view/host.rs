//! Host tables: identity, gauges, process states and top processes.

use std::collections::BTreeMap;

use crate::fmt::{format_duration, format_kb};
use crate::mode::{ModeState, SortKey};
use crate::model::{HostProcessInfo, Snapshot, Source};
use crate::rates::{DeltaSet, ProcessRates};
use crate::view::common::{RowStyleClass, Section, Table};

/// Process names highlighted as database server processes.
const DB_PROCESS_NAMES: &[&str] = &["postgres", "gaussdb", "postmaster"];

fn host_unavailable(snapshot: &Snapshot, section: Section, title: &str) -> Option<Table> {
    snapshot
        .unavailable_reason(Source::Host)
        .map(|reason| Table::unavailable(section, title, reason))
}

pub fn host_summary_table(snapshot: &Snapshot) -> Option<Table> {
    const TITLE: &str = "Host";
    if let Some(t) = host_unavailable(snapshot, Section::Summary, TITLE) {
        return Some(t);
    }
    let cpu = snapshot.host_cpu()?;
    let uptime = snapshot.host_stat().map(|s| s.uptime_secs).unwrap_or(0.0);

    let mut table = Table::new(Section::Summary, TITLE, &["UPTIME", "CPUS", "PROCESSES"]);
    table.push(
        vec![
            format_duration(uptime as i64),
            cpu.cpu_count.to_string(),
            snapshot.processes().len().to_string(),
        ],
        RowStyleClass::Normal,
    );
    Some(table)
}

pub fn host_gauges_table(snapshot: &Snapshot, delta: &DeltaSet) -> Option<Table> {
    const TITLE: &str = "Host gauges";
    if let Some(t) = host_unavailable(snapshot, Section::Gauges, TITLE) {
        return Some(t);
    }
    snapshot.host_cpu()?;
    let rates = delta.host.unwrap_or_default();
    let mem = snapshot.host_mem().copied().unwrap_or_default();
    let load = snapshot.host_load().copied().unwrap_or_default();

    let mut table = Table::new(
        Section::Gauges,
        TITLE,
        &[
            "CPU%", "MEM USED", "MEM TOTAL", "MEM%", "LOAD1", "LOAD5", "LOAD15",
        ],
    );
    let style = if rates.cpu_pct >= 90.0 || rates.mem_pct >= 90.0 {
        RowStyleClass::Critical
    } else if rates.cpu_pct >= 70.0 || rates.mem_pct >= 80.0 {
        RowStyleClass::Warning
    } else {
        RowStyleClass::Normal
    };
    table.push(
        vec![
            format!("{:.1}", rates.cpu_pct),
            format_kb(mem.used_kb()),
            format_kb(mem.total_kb),
            format!("{:.1}", rates.mem_pct),
            format!("{:.2}", load.load1),
            format!("{:.2}", load.load5),
            format!("{:.2}", load.load15),
        ],
        style,
    );
    Some(table)
}

/// Count per process state letter plus the scheduler counts from `/proc/stat`.
pub fn process_states_table(snapshot: &Snapshot) -> Option<Table> {
    const TITLE: &str = "Process states";
    if let Some(t) = host_unavailable(snapshot, Section::Activity, TITLE) {
        return Some(t);
    }
    let stat = snapshot.host_stat()?;

    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    for p in snapshot.processes() {
        *counts.entry(p.state).or_default() += 1;
    }

    let mut table = Table::new(Section::Activity, TITLE, &["STATE", "COUNT"]);
    for (state, count) in counts {
        let style = match state {
            'R' => RowStyleClass::Active,
            'D' => RowStyleClass::Warning,
            'Z' => RowStyleClass::Critical,
            _ => RowStyleClass::Normal,
        };
        table.push(vec![state.to_string(), count.to_string()], style);
    }
    table.push(
        vec!["running".into(), stat.procs_running.to_string()],
        RowStyleClass::Normal,
    );
    table.push(
        vec!["blocked".into(), stat.procs_blocked.to_string()],
        if stat.procs_blocked > 0 {
            RowStyleClass::Warning
        } else {
            RowStyleClass::Normal
        },
    );
    Some(table)
}

/// Processes ordered by the sort key, descending, ties by pid.
pub fn top_processes<'a>(
    snapshot: &'a Snapshot,
    delta: &DeltaSet,
    sort: SortKey,
    top_n: usize,
) -> Vec<(&'a HostProcessInfo, ProcessRates)> {
    let mut procs: Vec<(&HostProcessInfo, ProcessRates)> = snapshot
        .processes()
        .iter()
        .map(|p| (p, delta.processes.get(&p.pid).copied().unwrap_or_default()))
        .collect();
    procs.sort_by(|(a, ra), (b, rb)| {
        let ord = match sort {
            SortKey::Cpu => rb.cpu_pct.total_cmp(&ra.cpu_pct),
            SortKey::Mem => b.rss_kb.cmp(&a.rss_kb),
        };
        ord.then_with(|| a.pid.cmp(&b.pid))
    });
    procs.truncate(top_n);
    procs
}

pub fn top_processes_table(snapshot: &Snapshot, delta: &DeltaSet, mode: &ModeState) -> Option<Table> {
    let title = format!("Top processes (by {})", mode.sort);
    if let Some(t) = host_unavailable(snapshot, Section::Detail, &title) {
        return Some(t);
    }
    snapshot.host_cpu()?;

    let mut headers = vec!["PID", "CPU%", "MEM%", "RSS", "S", "NAME"];
    if mode.detailed {
        headers.push("TICKS");
    }
    let mut table = Table::new(Section::Detail, title, &headers);

    for (p, r) in top_processes(snapshot, delta, mode.sort, mode.top_n) {
        let mut cells = vec![
            p.pid.to_string(),
            format!("{:.1}", r.cpu_pct),
            format!("{:.1}", r.mem_pct),
            format_kb(p.rss_kb),
            p.state.to_string(),
            p.name.clone(),
        ];
        if mode.detailed {
            cells.push(p.cpu_ticks.to_string());
        }
        let style = if p.state == 'D' {
            RowStyleClass::Warning
        } else if DB_PROCESS_NAMES.iter().any(|n| p.name.starts_with(n)) {
            RowStyleClass::Accent
        } else {
            RowStyleClass::Normal
        };
        table.push(cells, style);
    }
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{HostCollector, MockFs};
    use crate::rates::DeltaEngine;

    fn typical() -> Snapshot {
        let blocks = HostCollector::new(MockFs::typical_host(), "/proc")
            .collect()
            .unwrap();
        Snapshot {
            timestamp_ms: 0,
            blocks,
            unavailable: Vec::new(),
        }
    }

    #[test]
    fn summary_and_states() {
        let snap = typical();
        let summary = host_summary_table(&snap).unwrap();
        assert_eq!(summary.rows[0].cells, vec!["3h25m", "4", "3"]);

        let states = process_states_table(&snap).unwrap();
        let cells: Vec<Vec<String>> = states.rows.iter().map(|r| r.cells.clone()).collect();
        assert_eq!(cells[0], vec!["D", "1"]);
        assert_eq!(cells[1], vec!["R", "1"]);
        assert_eq!(cells[2], vec!["S", "1"]);
        assert_eq!(cells[3], vec!["running", "2"]);
        assert_eq!(cells[4], vec!["blocked", "1"]);
    }

    #[test]
    fn top_processes_by_mem_and_cpu() {
        let mut collector = HostCollector::new(MockFs::typical_host(), "/proc");
        let first = Snapshot {
            timestamp_ms: 0,
            blocks: collector.collect().unwrap(),
            unavailable: Vec::new(),
        };
        collector.fs_mut().set_cpu_counters(&[10100, 500, 3100, 80200, 1000, 200, 100, 0]);
        collector.fs_mut().set_process_ticks(1, "systemd", 400, 200);
        let second = Snapshot {
            timestamp_ms: 1_000,
            blocks: collector.collect().unwrap(),
            unavailable: Vec::new(),
        };
        let delta = DeltaEngine::new().compute(Some(&first), &second, 1.0);

        let by_cpu: Vec<u32> = top_processes(&second, &delta, SortKey::Cpu, 10)
            .iter()
            .map(|(p, _)| p.pid)
            .collect();
        assert_eq!(by_cpu, vec![1, 88, 1200]);

        let by_mem: Vec<u32> = top_processes(&second, &delta, SortKey::Mem, 2)
            .iter()
            .map(|(p, _)| p.pid)
            .collect();
        assert_eq!(by_mem, vec![1200, 1]);
    }

    #[test]
    fn gauges_on_bootstrap() {
        let snap = typical();
        let delta = DeltaEngine::new().compute(None, &snap, 0.0);
        let table = host_gauges_table(&snap, &delta).unwrap();
        assert_eq!(table.rows[0].cells[0], "0.0");
        assert_eq!(table.rows[0].cells[4], "0.15");
    }

    #[test]
    fn database_processes_are_accented() {
        let snap = typical();
        let delta = DeltaEngine::new().compute(None, &snap, 0.0);
        let mode = ModeState {
            sort: SortKey::Mem,
            ..Default::default()
        };
        let table = top_processes_table(&snap, &delta, &mode).unwrap();
        assert_eq!(table.title, "Top processes (by mem)");
        assert_eq!(table.rows[0].cells[5], "postgres");
        assert_eq!(table.rows[0].style, RowStyleClass::Accent);
    }

    #[test]
    fn host_failure_renders_unavailable() {
        let mut snap = Snapshot::new(0);
        snap.mark_unavailable(Source::Host, "cannot read /proc/stat");
        let delta = DeltaSet::default();
        assert!(host_gauges_table(&snap, &delta).unwrap().is_unavailable());
    }
}
