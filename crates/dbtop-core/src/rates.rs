//! Delta engine: derived metrics from two consecutive snapshots.
//!
//! Every function here is total. A missing previous snapshot, a key seen for the first
//! time, or a counter that went backwards (server restart, stats reset, pid reuse) yields
//! zero or `None`, never an error and never a negative value.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{BgwriterCounters, CpuTimes, DatabaseCounters, HostMemInfo, Snapshot};

// ---------------------------------------------------------------------------
// Delta helpers
// ---------------------------------------------------------------------------

/// Compute i64 counter delta, clamped to zero on regression.
pub fn counter_delta(curr: i64, prev: i64) -> i64 {
    curr.saturating_sub(prev).max(0)
}

/// Compute u64 counter delta, clamped to zero on regression.
pub fn counter_delta_u64(curr: u64, prev: u64) -> u64 {
    curr.saturating_sub(prev)
}

/// Compute f64 counter delta, clamped to zero on regression.
pub fn counter_delta_f64(curr: f64, prev: f64) -> f64 {
    (curr - prev).max(0.0)
}

/// Per-second rate of a counter delta. Zero when no time elapsed.
pub fn per_second(delta: i64, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        delta as f64 / elapsed_secs
    } else {
        0.0
    }
}

/// Aggregate CPU usage between two readings, in `[0, 100]`.
///
/// `100 * (1 - idle_delta / total_delta)`, where idle is idle + iowait.
/// Returns 0 when the total did not advance.
pub fn cpu_usage_pct(prev: &CpuTimes, curr: &CpuTimes) -> f64 {
    let total_delta = counter_delta_u64(curr.total(), prev.total());
    if total_delta == 0 {
        return 0.0;
    }
    let idle_delta = counter_delta_u64(curr.idle_total(), prev.idle_total()).min(total_delta);
    (100.0 * (1.0 - idle_delta as f64 / total_delta as f64)).clamp(0.0, 100.0)
}

/// Process share of all CPUs, scaled so one saturated core is 100%.
pub fn process_cpu_pct(prev_ticks: u64, curr_ticks: u64, total_delta: u64, cpu_count: u32) -> f64 {
    if total_delta == 0 {
        return 0.0;
    }
    let d = counter_delta_u64(curr_ticks, prev_ticks) as f64;
    (d / total_delta as f64 * 100.0 * cpu_count.max(1) as f64).max(0.0)
}

/// Used memory (total - available) as a percentage of total.
pub fn mem_used_pct(mem: &HostMemInfo) -> f64 {
    share_pct(mem.used_kb(), mem.total_kb)
}

/// `part / total * 100`, 0 for a zero total.
pub fn share_pct(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

// ---------------------------------------------------------------------------
// Delta set
// ---------------------------------------------------------------------------

/// Wait statistics for one event in one view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WaitCounters {
    pub waits: u64,
    pub time_ms: f64,
}

impl WaitCounters {
    /// Average time per wait; 0 when there were no waits.
    pub fn avg_ms(&self) -> f64 {
        if self.waits > 0 {
            self.time_ms / self.waits as f64
        } else {
            0.0
        }
    }
}

/// Both views of one wait event, so the display mode can switch without recomputing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitDelta {
    pub event: String,
    pub class: String,
    /// Raw current counters.
    pub cumulative: WaitCounters,
    /// Counters since the event was last seen.
    pub realtime: WaitCounters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HostRates {
    pub cpu_pct: f64,
    pub mem_pct: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProcessRates {
    pub cpu_pct: f64,
    pub mem_pct: f64,
}

/// Per-second rates for one database. `None` until a previous reading exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DatabaseRates {
    pub commit_s: Option<f64>,
    pub rollback_s: Option<f64>,
    pub blks_read_s: Option<f64>,
    pub blks_hit_s: Option<f64>,
    /// Buffer hit ratio over the interval. `None` when no blocks were accessed.
    pub hit_pct: Option<f64>,
    pub tup_returned_s: Option<f64>,
    pub tup_fetched_s: Option<f64>,
    pub tup_inserted_s: Option<f64>,
    pub tup_updated_s: Option<f64>,
    pub tup_deleted_s: Option<f64>,
}

/// Background writer counter deltas over the interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BgwriterDelta {
    pub checkpoints_timed: i64,
    pub checkpoints_req: i64,
    pub buffers_checkpoint: i64,
    pub buffers_clean: i64,
    pub maxwritten_clean: i64,
    pub buffers_backend: i64,
    pub buffers_alloc: i64,
}

/// Everything derived from one (previous, current) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeltaSet {
    pub elapsed_secs: f64,
    /// No previous snapshot was available.
    pub bootstrap: bool,
    pub host: Option<HostRates>,
    pub processes: HashMap<u32, ProcessRates>,
    pub databases: HashMap<String, DatabaseRates>,
    pub bgwriter: Option<BgwriterDelta>,
    pub waits: Vec<WaitDelta>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Computes [`DeltaSet`]s and owns the real-time wait baseline.
///
/// The baseline holds the last-seen cumulative counters of every wait event. It is updated
/// on every computation, whatever wait mode is displayed, and keeps entries for events that
/// temporarily drop out of the result set.
#[derive(Debug, Default)]
pub struct DeltaEngine {
    wait_baseline: HashMap<String, WaitCounters>,
}

impl DeltaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-seen counters for a wait event.
    pub fn baseline(&self, event: &str) -> Option<WaitCounters> {
        self.wait_baseline.get(event).copied()
    }

    pub fn compute(
        &mut self,
        previous: Option<&Snapshot>,
        current: &Snapshot,
        elapsed_secs: f64,
    ) -> DeltaSet {
        let elapsed_secs = if elapsed_secs.is_finite() {
            elapsed_secs.max(0.0)
        } else {
            0.0
        };

        let mut delta = DeltaSet {
            elapsed_secs,
            bootstrap: previous.is_none(),
            ..Default::default()
        };

        self.host_rates(previous, current, &mut delta);
        delta.databases = database_rates(previous, current, elapsed_secs);
        delta.bgwriter = match (previous.and_then(|p| p.bgwriter()), current.bgwriter()) {
            (Some(prev), Some(curr)) => Some(bgwriter_delta(prev, curr)),
            _ => None,
        };
        delta.waits = self.wait_deltas(current);
        delta
    }

    fn host_rates(&self, previous: Option<&Snapshot>, current: &Snapshot, out: &mut DeltaSet) {
        let Some(curr_cpu) = current.host_cpu() else {
            return;
        };
        let prev_cpu = previous.and_then(|p| p.host_cpu());
        let mem_total_kb = current.host_mem().map(|m| m.total_kb).unwrap_or(0);

        out.host = Some(HostRates {
            cpu_pct: prev_cpu
                .map(|p| cpu_usage_pct(&p.times, &curr_cpu.times))
                .unwrap_or(0.0),
            mem_pct: current.host_mem().map(mem_used_pct).unwrap_or(0.0),
        });

        let total_delta = prev_cpu
            .map(|p| counter_delta_u64(curr_cpu.times.total(), p.times.total()))
            .unwrap_or(0);
        let prev_ticks: HashMap<u32, u64> = previous
            .map(|p| p.processes().iter().map(|pr| (pr.pid, pr.cpu_ticks)).collect())
            .unwrap_or_default();

        out.processes = current
            .processes()
            .iter()
            .map(|p| {
                let cpu_pct = prev_ticks
                    .get(&p.pid)
                    .map(|&prev| {
                        process_cpu_pct(prev, p.cpu_ticks, total_delta, curr_cpu.cpu_count)
                    })
                    .unwrap_or(0.0);
                (
                    p.pid,
                    ProcessRates {
                        cpu_pct,
                        mem_pct: share_pct(p.rss_kb, mem_total_kb),
                    },
                )
            })
            .collect();
    }

    fn wait_deltas(&mut self, current: &Snapshot) -> Vec<WaitDelta> {
        let deltas = current
            .wait_events()
            .iter()
            .map(|w| {
                let cumulative = WaitCounters {
                    waits: w.waits,
                    time_ms: w.time_ms.max(0.0),
                };
                let realtime = self
                    .wait_baseline
                    .get(&w.event)
                    .map(|base| WaitCounters {
                        waits: counter_delta_u64(cumulative.waits, base.waits),
                        time_ms: counter_delta_f64(cumulative.time_ms, base.time_ms),
                    })
                    .unwrap_or_default();
                WaitDelta {
                    event: w.event.clone(),
                    class: w.class.clone(),
                    cumulative,
                    realtime,
                }
            })
            .collect::<Vec<_>>();

        for d in &deltas {
            self.wait_baseline.insert(d.event.clone(), d.cumulative);
        }
        deltas
    }
}

fn database_rates(
    previous: Option<&Snapshot>,
    current: &Snapshot,
    elapsed_secs: f64,
) -> HashMap<String, DatabaseRates> {
    let prev_by_name: HashMap<&str, &DatabaseCounters> = previous
        .map(|p| p.databases().iter().map(|d| (d.name.as_str(), d)).collect())
        .unwrap_or_default();

    current
        .databases()
        .iter()
        .map(|curr| {
            let rates = prev_by_name
                .get(curr.name.as_str())
                .map(|prev| database_rate(prev, curr, elapsed_secs))
                .unwrap_or_default();
            (curr.name.clone(), rates)
        })
        .collect()
}

fn database_rate(
    prev: &DatabaseCounters,
    curr: &DatabaseCounters,
    elapsed_secs: f64,
) -> DatabaseRates {
    let rate = |c: i64, p: i64| Some(per_second(counter_delta(c, p), elapsed_secs));
    let read = counter_delta(curr.blks_read, prev.blks_read);
    let hit = counter_delta(curr.blks_hit, prev.blks_hit);
    let accessed = read + hit;

    DatabaseRates {
        commit_s: rate(curr.xact_commit, prev.xact_commit),
        rollback_s: rate(curr.xact_rollback, prev.xact_rollback),
        blks_read_s: rate(curr.blks_read, prev.blks_read),
        blks_hit_s: rate(curr.blks_hit, prev.blks_hit),
        hit_pct: (accessed > 0).then(|| hit as f64 / accessed as f64 * 100.0),
        tup_returned_s: rate(curr.tup_returned, prev.tup_returned),
        tup_fetched_s: rate(curr.tup_fetched, prev.tup_fetched),
        tup_inserted_s: rate(curr.tup_inserted, prev.tup_inserted),
        tup_updated_s: rate(curr.tup_updated, prev.tup_updated),
        tup_deleted_s: rate(curr.tup_deleted, prev.tup_deleted),
    }
}

fn bgwriter_delta(prev: &BgwriterCounters, curr: &BgwriterCounters) -> BgwriterDelta {
    BgwriterDelta {
        checkpoints_timed: counter_delta(curr.checkpoints_timed, prev.checkpoints_timed),
        checkpoints_req: counter_delta(curr.checkpoints_req, prev.checkpoints_req),
        buffers_checkpoint: counter_delta(curr.buffers_checkpoint, prev.buffers_checkpoint),
        buffers_clean: counter_delta(curr.buffers_clean, prev.buffers_clean),
        maxwritten_clean: counter_delta(curr.maxwritten_clean, prev.maxwritten_clean),
        buffers_backend: counter_delta(curr.buffers_backend, prev.buffers_backend),
        buffers_alloc: counter_delta(curr.buffers_alloc, prev.buffers_alloc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataBlock, HostCpuInfo, HostProcessInfo, WaitEventRow};
    use proptest::prelude::*;

    fn cpu_snapshot(ts_ms: i64, counters: &[u64]) -> Snapshot {
        Snapshot::new(ts_ms)
            .with_block(DataBlock::HostCpu(HostCpuInfo {
                times: CpuTimes::from_counters(counters),
                cpu_count: 4,
            }))
            .with_block(DataBlock::HostMem(HostMemInfo {
                total_kb: 1000,
                free_kb: 100,
                available_kb: 250,
            }))
    }

    fn waits_snapshot(ts_ms: i64, waits: &[(&str, u64, f64)]) -> Snapshot {
        Snapshot::new(ts_ms).with_block(DataBlock::PgWaitEvents(
            waits
                .iter()
                .map(|(event, n, t)| WaitEventRow {
                    event: event.to_string(),
                    class: "IO".to_string(),
                    waits: *n,
                    time_ms: *t,
                })
                .collect(),
        ))
    }

    fn db_snapshot(ts_ms: i64, commits: i64, read: i64, hit: i64) -> Snapshot {
        Snapshot::new(ts_ms).with_block(DataBlock::PgDatabases(vec![DatabaseCounters {
            name: "orders".into(),
            xact_commit: commits,
            blks_read: read,
            blks_hit: hit,
            ..Default::default()
        }]))
    }

    #[test]
    fn cpu_usage_from_proc_stat_fixture() {
        let prev = CpuTimes::from_counters(&[100, 0, 100, 700, 50]);
        let curr = CpuTimes::from_counters(&[110, 0, 110, 740, 50]);
        assert_eq!(curr.total() - prev.total(), 60);
        assert_eq!(curr.idle_total() - prev.idle_total(), 40);
        assert_eq!(format!("{:.1}", cpu_usage_pct(&prev, &curr)), "33.3");
    }

    #[test]
    fn cpu_usage_degenerate_total_is_zero() {
        let t = CpuTimes::from_counters(&[5, 5, 5, 5]);
        assert_eq!(cpu_usage_pct(&t, &t), 0.0);
        let later = CpuTimes::from_counters(&[1, 1, 1, 1]);
        assert_eq!(cpu_usage_pct(&t, &later), 0.0);
    }

    proptest! {
        #[test]
        fn cpu_usage_always_in_range(
            prev in proptest::collection::vec(0u64..1_000_000, 0..9),
            curr in proptest::collection::vec(0u64..1_000_000, 0..9),
        ) {
            let pct = cpu_usage_pct(&CpuTimes::from_counters(&prev), &CpuTimes::from_counters(&curr));
            prop_assert!((0.0..=100.0).contains(&pct));
        }

        #[test]
        fn counter_delta_never_negative(curr in any::<i64>(), prev in any::<i64>()) {
            prop_assert!(counter_delta(curr, prev) >= 0);
        }
    }

    #[test]
    fn bootstrap_gives_zero_or_none() {
        let mut engine = DeltaEngine::new();
        let mut snap = cpu_snapshot(1_000, &[100, 0, 100, 700, 50]);
        snap.blocks.push(DataBlock::HostProcesses(vec![HostProcessInfo {
            pid: 42,
            name: "postgres".into(),
            state: 'R',
            cpu_ticks: 500,
            rss_kb: 100,
        }]));
        snap.blocks.push(DataBlock::PgDatabases(vec![DatabaseCounters {
            name: "orders".into(),
            xact_commit: 10,
            ..Default::default()
        }]));

        let delta = engine.compute(None, &snap, 0.0);
        assert!(delta.bootstrap);
        assert_eq!(delta.host.unwrap().cpu_pct, 0.0);
        assert_eq!(delta.processes[&42].cpu_pct, 0.0);
        assert_eq!(delta.databases["orders"], DatabaseRates::default());
        assert!(delta.bgwriter.is_none());
    }

    #[test]
    fn memory_percentages() {
        let mut engine = DeltaEngine::new();
        let mut snap = cpu_snapshot(0, &[1, 1, 1, 1]);
        snap.blocks.push(DataBlock::HostProcesses(vec![HostProcessInfo {
            pid: 7,
            rss_kb: 100,
            ..Default::default()
        }]));
        let delta = engine.compute(None, &snap, 1.0);
        assert!((delta.host.unwrap().mem_pct - 75.0).abs() < 1e-9);
        assert!((delta.processes[&7].mem_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn process_cpu_scaled_by_core_count() {
        let mut engine = DeltaEngine::new();
        let proc_block = |ticks| {
            DataBlock::HostProcesses(vec![HostProcessInfo {
                pid: 1,
                cpu_ticks: ticks,
                ..Default::default()
            }])
        };
        let mut prev = cpu_snapshot(0, &[100, 0, 100, 700, 50]);
        prev.blocks.push(proc_block(10));
        let mut curr = cpu_snapshot(1_000, &[110, 0, 110, 740, 50]);
        curr.blocks.push(proc_block(25));

        let delta = engine.compute(Some(&prev), &curr, 1.0);
        // 15 of 60 ticks on a 4-CPU box.
        assert!((delta.processes[&1].cpu_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn new_and_reused_pids_report_zero() {
        let mut engine = DeltaEngine::new();
        let mut prev = cpu_snapshot(0, &[100, 0, 100, 700]);
        prev.blocks.push(DataBlock::HostProcesses(vec![HostProcessInfo {
            pid: 5,
            cpu_ticks: 9_000,
            ..Default::default()
        }]));
        let mut curr = cpu_snapshot(1_000, &[200, 0, 200, 800]);
        curr.blocks.push(DataBlock::HostProcesses(vec![
            HostProcessInfo {
                pid: 5,
                cpu_ticks: 10,
                ..Default::default()
            },
            HostProcessInfo {
                pid: 6,
                cpu_ticks: 50,
                ..Default::default()
            },
        ]));

        let delta = engine.compute(Some(&prev), &curr, 1.0);
        assert_eq!(delta.processes[&5].cpu_pct, 0.0);
        assert_eq!(delta.processes[&6].cpu_pct, 0.0);
    }

    #[test]
    fn database_rates_and_hit_ratio() {
        let mut engine = DeltaEngine::new();
        let prev = db_snapshot(0, 1_000, 100, 900);
        let curr = db_snapshot(5_000, 1_050, 110, 990);

        let delta = engine.compute(Some(&prev), &curr, 5.0);
        let r = delta.databases["orders"];
        assert_eq!(r.commit_s, Some(10.0));
        assert_eq!(r.blks_read_s, Some(2.0));
        assert!((r.hit_pct.unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn counter_reset_clamps_to_zero() {
        let mut engine = DeltaEngine::new();
        let prev = db_snapshot(0, 5_000, 100, 900);
        let curr = db_snapshot(5_000, 10, 0, 0);

        let delta = engine.compute(Some(&prev), &curr, 5.0);
        let r = delta.databases["orders"];
        assert_eq!(r.commit_s, Some(0.0));
        assert_eq!(r.hit_pct, None);
    }

    #[test]
    fn zero_elapsed_gives_zero_rates() {
        let mut engine = DeltaEngine::new();
        let prev = db_snapshot(0, 0, 0, 0);
        let curr = db_snapshot(0, 100, 0, 0);
        let delta = engine.compute(Some(&prev), &curr, 0.0);
        assert_eq!(delta.databases["orders"].commit_s, Some(0.0));
    }

    #[test]
    fn realtime_waits_sum_to_total_since_baseline() {
        let mut engine = DeltaEngine::new();
        let counts = [100u64, 130, 175, 260];
        let mut realtime_sum = 0;
        let mut previous: Option<Snapshot> = None;

        for (i, n) in counts.iter().enumerate() {
            let snap = waits_snapshot(i as i64 * 1_000, &[("DataFileRead", *n, *n as f64 * 2.0)]);
            let delta = engine.compute(previous.as_ref(), &snap, 1.0);
            let w = &delta.waits[0];
            assert_eq!(w.cumulative.waits, *n);
            if i > 0 {
                realtime_sum += w.realtime.waits;
            } else {
                assert_eq!(w.realtime, WaitCounters::default());
            }
            previous = Some(snap);
        }

        assert_eq!(realtime_sum, 260 - 100);
    }

    #[test]
    fn baseline_survives_event_dropping_out() {
        let mut engine = DeltaEngine::new();
        engine.compute(None, &waits_snapshot(0, &[("Lock", 10, 100.0)]), 1.0);
        engine.compute(None, &waits_snapshot(1_000, &[("WALWrite", 1, 1.0)]), 1.0);
        let delta = engine.compute(None, &waits_snapshot(2_000, &[("Lock", 15, 160.0)]), 1.0);

        assert_eq!(delta.waits[0].realtime.waits, 5);
        assert!((delta.waits[0].realtime.time_ms - 60.0).abs() < 1e-9);
        assert!((delta.waits[0].realtime.avg_ms() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn wait_counter_reset_clamps() {
        let mut engine = DeltaEngine::new();
        engine.compute(None, &waits_snapshot(0, &[("Lock", 10, 100.0)]), 1.0);
        let delta = engine.compute(None, &waits_snapshot(1_000, &[("Lock", 3, 20.0)]), 1.0);
        assert_eq!(delta.waits[0].realtime, WaitCounters::default());
        assert_eq!(engine.baseline("Lock").unwrap().waits, 3);
    }

    #[test]
    fn avg_wait_zero_without_waits() {
        assert_eq!(
            WaitCounters {
                waits: 0,
                time_ms: 50.0
            }
            .avg_ms(),
            0.0
        );
    }

    #[test]
    fn bgwriter_delta_requires_both_sides() {
        let mut engine = DeltaEngine::new();
        let snap = |timed| {
            Snapshot::new(0).with_block(DataBlock::PgBgwriter(BgwriterCounters {
                checkpoints_timed: timed,
                buffers_alloc: timed * 10,
                ..Default::default()
            }))
        };
        assert!(engine.compute(None, &snap(5), 1.0).bgwriter.is_none());
        let d = engine.compute(Some(&snap(5)), &snap(8), 1.0).bgwriter.unwrap();
        assert_eq!(d.checkpoints_timed, 3);
        assert_eq!(d.buffers_alloc, 30);
    }
}
