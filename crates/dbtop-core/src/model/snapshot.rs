//! Snapshot structures.
//!
//! A snapshot is one sampling cycle of one provider: a timestamp, the typed blocks that were
//! acquired, and the sources that failed during the cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::database::{
    ActiveStatementRow, BgwriterCounters, DatabaseCounters, InstanceInfo, LockRow, SessionRow,
    SessionStateRow, WaitEventRow,
};
use super::host::{HostCpuInfo, HostLoadInfo, HostMemInfo, HostProcessInfo, HostStatInfo};

/// A block of data of a specific type within a snapshot.
///
/// Each variant corresponds to one query or one group of `/proc` files.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum DataBlock {
    /// Source: `/proc/stat`
    HostCpu(HostCpuInfo),
    /// Source: `/proc/meminfo`
    HostMem(HostMemInfo),
    /// Source: `/proc/loadavg`
    HostLoad(HostLoadInfo),
    /// Source: `/proc/uptime` + `/proc/stat`
    HostStat(HostStatInfo),
    /// Source: `/proc/[pid]/stat`
    HostProcesses(Vec<HostProcessInfo>),

    PgInstance(InstanceInfo),
    /// Source: `pg_stat_database`
    PgDatabases(Vec<DatabaseCounters>),
    /// Source: `pg_stat_activity` grouped by state and wait type
    PgSessionStates(Vec<SessionStateRow>),
    /// Source: `dbe_perf.wait_events` or sampled `pg_stat_activity`
    PgWaitEvents(Vec<WaitEventRow>),
    /// Source: `pg_stat_activity` where state = 'active'
    PgActiveStatements(Vec<ActiveStatementRow>),
    /// Source: `pg_stat_activity`
    PgSessions(Vec<SessionRow>),
    /// Source: `pg_locks`
    PgLocks(Vec<LockRow>),
    PgBgwriter(BgwriterCounters),
}

/// Logical acquisition source. Every block comes from exactly one source.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    Host,
    Instance,
    Databases,
    SessionStates,
    WaitEvents,
    ActiveStatements,
    Sessions,
    Locks,
    Bgwriter,
}

impl Source {
    /// All database sources, in query order.
    pub const DATABASE: [Source; 8] = [
        Source::Instance,
        Source::Databases,
        Source::SessionStates,
        Source::WaitEvents,
        Source::ActiveStatements,
        Source::Sessions,
        Source::Locks,
        Source::Bgwriter,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Source::Host => "host",
            Source::Instance => "instance",
            Source::Databases => "database stats",
            Source::SessionStates => "session summary",
            Source::WaitEvents => "wait events",
            Source::ActiveStatements => "active statements",
            Source::Sessions => "sessions",
            Source::Locks => "locks",
            Source::Bgwriter => "bgwriter",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A source that failed during this cycle.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Unavailable {
    pub source: Source,
    pub reason: String,
}

/// A point-in-time capture of one provider.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Snapshot {
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: i64,
    pub blocks: Vec<DataBlock>,
    pub unavailable: Vec<Unavailable>,
}

impl Snapshot {
    pub fn new(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            blocks: Vec::new(),
            unavailable: Vec::new(),
        }
    }

    pub fn with_block(mut self, block: DataBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn mark_unavailable(&mut self, source: Source, reason: impl Into<String>) {
        self.unavailable.push(Unavailable {
            source,
            reason: reason.into(),
        });
    }

    /// Reason the source failed this cycle, if it did.
    pub fn unavailable_reason(&self, source: Source) -> Option<&str> {
        self.unavailable
            .iter()
            .find(|u| u.source == source)
            .map(|u| u.reason.as_str())
    }

    /// True when the snapshot carries any database block or database failure.
    pub fn has_database(&self) -> bool {
        self.blocks.iter().any(|b| {
            !matches!(
                b,
                DataBlock::HostCpu(_)
                    | DataBlock::HostMem(_)
                    | DataBlock::HostLoad(_)
                    | DataBlock::HostStat(_)
                    | DataBlock::HostProcesses(_)
            )
        }) || self.unavailable.iter().any(|u| u.source != Source::Host)
    }

    pub fn host_cpu(&self) -> Option<&HostCpuInfo> {
        self.blocks.iter().find_map(|b| match b {
            DataBlock::HostCpu(v) => Some(v),
            _ => None,
        })
    }

    pub fn host_mem(&self) -> Option<&HostMemInfo> {
        self.blocks.iter().find_map(|b| match b {
            DataBlock::HostMem(v) => Some(v),
            _ => None,
        })
    }

    pub fn host_load(&self) -> Option<&HostLoadInfo> {
        self.blocks.iter().find_map(|b| match b {
            DataBlock::HostLoad(v) => Some(v),
            _ => None,
        })
    }

    pub fn host_stat(&self) -> Option<&HostStatInfo> {
        self.blocks.iter().find_map(|b| match b {
            DataBlock::HostStat(v) => Some(v),
            _ => None,
        })
    }

    pub fn processes(&self) -> &[HostProcessInfo] {
        self.blocks
            .iter()
            .find_map(|b| match b {
                DataBlock::HostProcesses(v) => Some(v.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn instance(&self) -> Option<&InstanceInfo> {
        self.blocks.iter().find_map(|b| match b {
            DataBlock::PgInstance(v) => Some(v),
            _ => None,
        })
    }

    pub fn databases(&self) -> &[DatabaseCounters] {
        self.blocks
            .iter()
            .find_map(|b| match b {
                DataBlock::PgDatabases(v) => Some(v.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn session_states(&self) -> &[SessionStateRow] {
        self.blocks
            .iter()
            .find_map(|b| match b {
                DataBlock::PgSessionStates(v) => Some(v.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn wait_events(&self) -> &[WaitEventRow] {
        self.blocks
            .iter()
            .find_map(|b| match b {
                DataBlock::PgWaitEvents(v) => Some(v.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn active_statements(&self) -> &[ActiveStatementRow] {
        self.blocks
            .iter()
            .find_map(|b| match b {
                DataBlock::PgActiveStatements(v) => Some(v.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn sessions(&self) -> &[SessionRow] {
        self.blocks
            .iter()
            .find_map(|b| match b {
                DataBlock::PgSessions(v) => Some(v.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn locks(&self) -> &[LockRow] {
        self.blocks
            .iter()
            .find_map(|b| match b {
                DataBlock::PgLocks(v) => Some(v.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn bgwriter(&self) -> Option<&BgwriterCounters> {
        self.blocks.iter().find_map(|b| match b {
            DataBlock::PgBgwriter(v) => Some(v),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CpuTimes;

    #[test]
    fn accessors_find_blocks() {
        let snap = Snapshot::new(1_000)
            .with_block(DataBlock::HostCpu(HostCpuInfo {
                times: CpuTimes::from_counters(&[1, 2, 3, 4]),
                cpu_count: 2,
            }))
            .with_block(DataBlock::PgLocks(vec![LockRow {
                mode: "AccessShareLock".into(),
                lock_type: "relation".into(),
                granted: true,
                count: 3,
            }]));

        assert_eq!(snap.host_cpu().map(|c| c.cpu_count), Some(2));
        assert_eq!(snap.locks().len(), 1);
        assert!(snap.sessions().is_empty());
        assert!(snap.host_mem().is_none());
        assert!(snap.has_database());
    }

    #[test]
    fn host_only_snapshot_has_no_database() {
        let mut snap = Snapshot::new(0).with_block(DataBlock::HostMem(HostMemInfo::default()));
        assert!(!snap.has_database());

        snap.mark_unavailable(Source::WaitEvents, "relation does not exist");
        assert!(snap.has_database());
        assert_eq!(
            snap.unavailable_reason(Source::WaitEvents),
            Some("relation does not exist")
        );
        assert_eq!(snap.unavailable_reason(Source::Locks), None);
    }
}
