//! Snapshot data model shared by collectors, the delta engine and views.

mod database;
mod host;
mod snapshot;

pub use database::{
    ActiveStatementRow, BgwriterCounters, DatabaseCounters, InstanceInfo, LockRow, SessionRow,
    SessionStateRow, WaitEventRow,
};
pub use host::{CpuTimes, HostCpuInfo, HostLoadInfo, HostMemInfo, HostProcessInfo, HostStatInfo};
pub use snapshot::{DataBlock, Snapshot, Source, Unavailable};
