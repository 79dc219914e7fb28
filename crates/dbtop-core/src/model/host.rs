//! Host-level records captured from `/proc`.

use serde::{Deserialize, Serialize};

/// Aggregate CPU time by mode, in clock ticks since boot.
///
/// Source: the `cpu` line of `/proc/stat`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// Builds from the positional counters of a `cpu` line
    /// (user, nice, system, idle, iowait, irq, softirq, steal).
    ///
    /// Missing trailing counters are treated as 0, extra ones are ignored.
    pub fn from_counters(values: &[u64]) -> Self {
        let at = |idx: usize| values.get(idx).copied().unwrap_or(0);
        Self {
            user: at(0),
            nice: at(1),
            system: at(2),
            idle: at(3),
            iowait: at(4),
            irq: at(5),
            softirq: at(6),
            steal: at(7),
        }
    }

    /// Sum of all modes.
    pub fn total(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
            .saturating_add(self.idle)
            .saturating_add(self.iowait)
            .saturating_add(self.irq)
            .saturating_add(self.softirq)
            .saturating_add(self.steal)
    }

    /// Idle-class time: idle plus iowait.
    pub fn idle_total(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }
}

/// CPU block: aggregate times plus the number of online CPUs.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct HostCpuInfo {
    pub times: CpuTimes,
    pub cpu_count: u32,
}

/// Memory totals in kB.
///
/// Source: `/proc/meminfo`
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct HostMemInfo {
    pub total_kb: u64,
    pub free_kb: u64,
    pub available_kb: u64,
}

impl HostMemInfo {
    pub fn used_kb(&self) -> u64 {
        self.total_kb.saturating_sub(self.available_kb)
    }
}

/// Load averages.
///
/// Source: `/proc/loadavg`
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct HostLoadInfo {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

/// Uptime and scheduler counts.
///
/// Source: `/proc/uptime`, `procs_running`/`procs_blocked` from `/proc/stat`
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct HostStatInfo {
    pub uptime_secs: f64,
    pub procs_running: u32,
    pub procs_blocked: u32,
}

/// One process row.
///
/// Source: `/proc/[pid]/stat`
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct HostProcessInfo {
    pub pid: u32,
    pub name: String,
    pub state: char,
    /// utime + stime, in clock ticks.
    pub cpu_ticks: u64,
    pub rss_kb: u64,
}
