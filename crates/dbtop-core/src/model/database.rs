//! Database-server records.
//!
//! All rows are built once by `collector::db::rows` from the text fields returned by the
//! server. Fields that failed to parse are already defaulted to 0 or empty here.

use serde::{Deserialize, Serialize};

/// Instance identity.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct InstanceInfo {
    pub database: String,
    pub host: String,
    pub port: String,
    pub version: String,
    pub start_time: String,
    pub uptime_secs: i64,
}

/// Cumulative counters for one database.
///
/// Source: `pg_stat_database`
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct DatabaseCounters {
    pub name: String,
    /// Gauge, not a counter.
    pub backends: i64,
    pub xact_commit: i64,
    pub xact_rollback: i64,
    pub blks_read: i64,
    pub blks_hit: i64,
    pub tup_returned: i64,
    pub tup_fetched: i64,
    pub tup_inserted: i64,
    pub tup_updated: i64,
    pub tup_deleted: i64,
}

/// Session count per (state, wait type).
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct SessionStateRow {
    pub state: String,
    pub wait_type: String,
    pub count: i64,
}

/// Cumulative wait statistics for one wait event.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct WaitEventRow {
    pub event: String,
    /// Wait class (`LWLock`, `IO`, `Lock`, ...).
    pub class: String,
    pub waits: u64,
    pub time_ms: f64,
}

/// One active backend's statement, unaggregated.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct ActiveStatementRow {
    pub query: String,
    pub runtime_secs: i64,
    pub wait_type: String,
}

/// One backend session.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct SessionRow {
    pub pid: i64,
    pub user: String,
    pub program: String,
    pub client: String,
    /// Database the session is connected to.
    pub module: String,
    /// Leading keyword of the current statement (`SELECT`, `UPDATE`, ...).
    pub action: String,
    pub state: String,
    pub wait_type: String,
    pub runtime_secs: i64,
    pub query: String,
}

/// Lock count per (mode, lock type, granted).
///
/// Source: `pg_locks`
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct LockRow {
    pub mode: String,
    pub lock_type: String,
    pub granted: bool,
    pub count: i64,
}

/// Background writer and checkpointer counters (singleton).
///
/// Source: `pg_stat_bgwriter` (+ `pg_stat_checkpointer` on PG 17+)
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct BgwriterCounters {
    pub checkpoints_timed: i64,
    pub checkpoints_req: i64,
    pub buffers_checkpoint: i64,
    pub buffers_clean: i64,
    pub maxwritten_clean: i64,
    pub buffers_backend: i64,
    pub buffers_alloc: i64,
}
