use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Query, QueryKind};
use crate::model::Source;

/// Server flavor. Decides where wait statistics come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DbFlavor {
    /// GaussDB / openGauss: cumulative counters in `dbe_perf.wait_events`.
    #[default]
    GaussDb,
    /// PostgreSQL: waits sampled from `pg_stat_activity` each cycle.
    Postgres,
}

impl fmt::Display for DbFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DbFlavor::GaussDb => "gaussdb",
            DbFlavor::Postgres => "postgres",
        })
    }
}

impl FromStr for DbFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gaussdb" | "opengauss" | "gauss" => Ok(DbFlavor::GaussDb),
            "postgres" | "postgresql" | "pg" => Ok(DbFlavor::Postgres),
            other => Err(format!("unknown flavor '{}'", other)),
        }
    }
}

/// Newlines inside `query` would split rows in unaligned client output.
const FLAT_QUERY: &str = "REPLACE(REPLACE(REPLACE(query, chr(10), ' '), chr(13), ' '), chr(9), ' ')";

pub(super) fn server_version() -> Query {
    Query {
        kind: QueryKind::ServerVersion,
        sql: "SHOW server_version_num".to_string(),
        columns: 1,
    }
}

/// Builds the query for one source.
pub(super) fn build(source: Source, flavor: DbFlavor, server_version_num: Option<i32>) -> Query {
    let (sql, columns) = match source {
        Source::Instance => (build_instance_query().to_string(), 6),
        Source::Databases => (build_stat_database_query().to_string(), 11),
        Source::SessionStates => (build_session_summary_query().to_string(), 3),
        Source::WaitEvents => match flavor {
            DbFlavor::GaussDb => (build_wait_events_query().to_string(), 4),
            DbFlavor::Postgres => (build_sampled_waits_query().to_string(), 3),
        },
        Source::ActiveStatements => (build_active_statements_query(), 3),
        Source::Sessions => (build_sessions_query(), 9),
        Source::Locks => (build_locks_query().to_string(), 4),
        Source::Bgwriter => (build_stat_bgwriter_query(server_version_num), 7),
        Source::Host => (String::new(), 0),
    };
    Query {
        kind: QueryKind::Fetch(source),
        sql,
        columns,
    }
}

fn build_instance_query() -> &'static str {
    r#"
        SELECT
            current_database(),
            COALESCE(inet_server_addr()::text, 'local'),
            COALESCE(inet_server_port()::text, '-'),
            current_setting('server_version'),
            pg_postmaster_start_time()::timestamp(0)::text,
            EXTRACT(EPOCH FROM (now() - pg_postmaster_start_time()))::bigint
    "#
}

fn build_stat_database_query() -> &'static str {
    r#"
        SELECT
            datname,
            numbackends,
            xact_commit,
            xact_rollback,
            blks_read,
            blks_hit,
            tup_returned,
            tup_fetched,
            tup_inserted,
            tup_updated,
            tup_deleted
        FROM pg_stat_database
        WHERE datname IS NOT NULL
          AND datname NOT IN ('template0', 'template1')
        ORDER BY datname
    "#
}

fn build_session_summary_query() -> &'static str {
    r#"
        SELECT
            COALESCE(state, 'unknown'),
            COALESCE(wait_event_type, 'none'),
            COUNT(*)
        FROM pg_stat_activity
        GROUP BY 1, 2
        ORDER BY 3 DESC
    "#
}

/// `total_wait_time` is reported in microseconds.
fn build_wait_events_query() -> &'static str {
    r#"
        SELECT
            event,
            type,
            wait,
            total_wait_time
        FROM dbe_perf.wait_events
        WHERE wait > 0
        ORDER BY total_wait_time DESC
        LIMIT 100
    "#
}

fn build_sampled_waits_query() -> &'static str {
    r#"
        SELECT
            wait_event,
            wait_event_type,
            COUNT(*)
        FROM pg_stat_activity
        WHERE wait_event IS NOT NULL
          AND state = 'active'
          AND pid <> pg_backend_pid()
        GROUP BY 1, 2
    "#
}

fn build_active_statements_query() -> String {
    format!(
        r#"
        SELECT
            COALESCE(EXTRACT(EPOCH FROM (now() - query_start)), 0)::bigint,
            COALESCE(wait_event_type, 'none'),
            {FLAT_QUERY}
        FROM pg_stat_activity
        WHERE state = 'active'
          AND pid <> pg_backend_pid()
          AND query NOT ILIKE '%pg_stat_activity%'
        "#
    )
}

fn build_sessions_query() -> String {
    format!(
        r#"
        SELECT
            pid,
            COALESCE(usename, ''),
            COALESCE(application_name, ''),
            COALESCE(client_addr::text, 'local'),
            COALESCE(datname, ''),
            COALESCE(state, 'unknown'),
            COALESCE(wait_event_type, 'none'),
            COALESCE(EXTRACT(EPOCH FROM (now() - query_start)), 0)::bigint,
            {FLAT_QUERY}
        FROM pg_stat_activity
        WHERE pid <> pg_backend_pid()
          AND state IS DISTINCT FROM 'idle'
        ORDER BY 8 DESC NULLS LAST
        LIMIT 50
        "#
    )
}

fn build_locks_query() -> &'static str {
    r#"
        SELECT
            mode,
            locktype,
            granted,
            COUNT(*)
        FROM pg_locks
        GROUP BY 1, 2, 3
        ORDER BY 4 DESC
        LIMIT 20
    "#
}

/// PG < 17: everything in `pg_stat_bgwriter`.
/// PG 17+: checkpoint counters moved to `pg_stat_checkpointer`, `buffers_backend` to
/// `pg_stat_io` (reported as 0 here).
fn build_stat_bgwriter_query(server_version_num: Option<i32>) -> String {
    let v = server_version_num.unwrap_or(0);

    if v >= 170000 {
        r#"
            SELECT
                COALESCE(c.num_timed, 0)::bigint,
                COALESCE(c.num_requested, 0)::bigint,
                COALESCE(c.buffers_written, 0)::bigint,
                COALESCE(b.buffers_clean, 0)::bigint,
                COALESCE(b.maxwritten_clean, 0)::bigint,
                0::bigint AS buffers_backend,
                COALESCE(b.buffers_alloc, 0)::bigint
            FROM pg_stat_bgwriter b
            CROSS JOIN pg_stat_checkpointer c
        "#
        .to_string()
    } else {
        r#"
            SELECT
                checkpoints_timed,
                checkpoints_req,
                buffers_checkpoint,
                buffers_clean,
                maxwritten_clean,
                buffers_backend,
                buffers_alloc
            FROM pg_stat_bgwriter
        "#
        .to_string()
    }
}
