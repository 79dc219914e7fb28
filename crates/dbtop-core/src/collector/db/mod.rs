//! Database snapshot collection.
//!
//! [`DbCollector`] runs one query per [`Source`] through a [`QueryExecutor`] and turns the
//! text rows into typed blocks. The executor hides the transport: the native protocol
//! ([`PgExecutor`]) or a command-line client such as `gsql`/`psql` ([`CliExecutor`]).
//!
//! ## Failure policy
//!
//! - A single failed query marks its source unavailable for the cycle.
//! - A connection failure, or every query failing, fails the whole cycle.

mod executor;
mod queries;
mod rows;
mod waits;

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{DataBlock, Source, Unavailable};

pub use executor::{CliExecutor, ConnectionParams, PgExecutor};
pub use queries::DbFlavor;
pub use waits::WaitSampler;

/// Error type for query execution.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("{0}")]
    Query(String),
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    ClientExit {
        program: String,
        status: String,
        stderr: String,
    },
}

impl QueryError {
    /// True when retrying other queries in the same cycle is pointless.
    pub fn is_connection(&self) -> bool {
        matches!(self, QueryError::Connection(_) | QueryError::Spawn { .. })
    }
}

/// Text rows as returned by the server: NULL is an empty string.
pub type Rows = Vec<Vec<String>>;

/// What a query fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    ServerVersion,
    Fetch(Source),
}

/// A query ready to execute.
#[derive(Debug, Clone)]
pub struct Query {
    pub kind: QueryKind,
    pub sql: String,
    /// Number of result columns. Free-text columns are always last.
    pub columns: usize,
}

/// Executes SQL text and returns rows of string fields.
pub trait QueryExecutor: Send {
    fn execute(&mut self, query: &Query) -> Result<Rows, QueryError>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for Box<E> {
    fn execute(&mut self, query: &Query) -> Result<Rows, QueryError> {
        (**self).execute(query)
    }
}

/// Blocks and per-source failures of one database cycle.
#[derive(Debug, Default)]
pub struct DbCollection {
    pub blocks: Vec<DataBlock>,
    pub unavailable: Vec<Unavailable>,
}

/// Database collector.
pub struct DbCollector<E> {
    executor: E,
    flavor: DbFlavor,
    server_version_num: Option<i32>,
    waits: WaitSampler,
    last_error: Option<String>,
}

impl<E: QueryExecutor> DbCollector<E> {
    pub fn new(executor: E, flavor: DbFlavor) -> Self {
        Self {
            executor,
            flavor,
            server_version_num: None,
            waits: WaitSampler::default(),
            last_error: None,
        }
    }

    /// Server version as reported by `server_version_num`, once known.
    pub fn server_version_num(&self) -> Option<i32> {
        self.server_version_num
    }

    /// Returns the last cycle-level error message, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Runs one collection cycle.
    ///
    /// `now_ms` timestamps sampled wait counters on flavors without cumulative wait views.
    pub fn collect(&mut self, now_ms: i64) -> Result<DbCollection, QueryError> {
        match self.collect_inner(now_ms) {
            Ok(collection) => {
                self.last_error = None;
                Ok(collection)
            }
            Err(e) => {
                self.server_version_num = None;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn collect_inner(&mut self, now_ms: i64) -> Result<DbCollection, QueryError> {
        if self.server_version_num.is_none() {
            match self.executor.execute(&queries::server_version()) {
                Ok(rows) => {
                    self.server_version_num = rows::server_version(&rows);
                    debug!(version = ?self.server_version_num, "server version detected");
                }
                Err(e) if e.is_connection() => return Err(e),
                Err(e) => warn!(error = %e, "failed to read server version, assuming oldest"),
            }
        }

        let mut collection = DbCollection::default();
        let mut last_failure = None;

        for source in Source::DATABASE {
            let query = queries::build(source, self.flavor, self.server_version_num);
            match self.executor.execute(&query) {
                Ok(rows) => collection.blocks.extend(self.to_block(source, &rows, now_ms)),
                Err(e) if e.is_connection() => return Err(e),
                Err(e) => {
                    warn!(source = %source, error = %e, "query failed");
                    collection.unavailable.push(Unavailable {
                        source,
                        reason: e.to_string(),
                    });
                    last_failure = Some(e);
                }
            }
        }

        if collection.blocks.is_empty()
            && let Some(e) = last_failure
        {
            return Err(e);
        }

        Ok(collection)
    }

    fn to_block(&mut self, source: Source, result: &Rows, now_ms: i64) -> Option<DataBlock> {
        let block = match source {
            Source::Instance => DataBlock::PgInstance(rows::instance(result)),
            Source::Databases => DataBlock::PgDatabases(rows::databases(result)),
            Source::SessionStates => DataBlock::PgSessionStates(rows::session_states(result)),
            Source::WaitEvents => DataBlock::PgWaitEvents(match self.flavor {
                DbFlavor::GaussDb => rows::wait_events(result),
                DbFlavor::Postgres => self.waits.accumulate(rows::sampled_waits(result), now_ms),
            }),
            Source::ActiveStatements => {
                DataBlock::PgActiveStatements(rows::active_statements(result))
            }
            Source::Sessions => DataBlock::PgSessions(rows::sessions(result)),
            Source::Locks => DataBlock::PgLocks(rows::locks(result)),
            Source::Bgwriter => DataBlock::PgBgwriter(rows::bgwriter(result)),
            Source::Host => return None,
        };
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::StaticExecutor;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn collects_every_source() {
        let executor = StaticExecutor::typical_gaussdb();
        let mut collector = DbCollector::new(executor, DbFlavor::GaussDb);
        let out = collector.collect(1_000).unwrap();

        assert_eq!(out.blocks.len(), Source::DATABASE.len());
        assert!(out.unavailable.is_empty());
        assert_eq!(collector.server_version_num(), Some(90204));
        assert!(collector.last_error().is_none());
    }

    #[test]
    fn single_query_failure_is_partial() {
        let executor = StaticExecutor::typical_gaussdb()
            .with_failure(Source::WaitEvents, "relation \"dbe_perf.wait_events\" does not exist");
        let mut collector = DbCollector::new(executor, DbFlavor::GaussDb);
        let out = collector.collect(1_000).unwrap();

        assert_eq!(out.blocks.len(), Source::DATABASE.len() - 1);
        assert_eq!(out.unavailable.len(), 1);
        assert_eq!(out.unavailable[0].source, Source::WaitEvents);
        assert!(out.unavailable[0].reason.contains("does not exist"));
    }

    #[test]
    fn connection_failure_is_total() {
        let executor = StaticExecutor::new().refusing_connections();
        let mut collector = DbCollector::new(executor, DbFlavor::GaussDb);
        let err = collector.collect(1_000).unwrap_err();

        assert!(err.is_connection());
        assert!(collector.last_error().is_some());
    }

    #[test]
    fn all_queries_failing_is_total() {
        let mut executor = StaticExecutor::new().with_version(160000);
        for source in Source::DATABASE {
            executor = executor.with_failure(source, "permission denied");
        }
        let mut collector = DbCollector::new(executor, DbFlavor::Postgres);
        let err = collector.collect(1_000).unwrap_err();
        assert_eq!(err.to_string(), "permission denied");
    }

    #[test]
    fn version_is_requeried_after_total_failure() {
        let mut executor = StaticExecutor::new().with_version(150000);
        for source in Source::DATABASE {
            executor = executor.with_failure(source, "boom");
        }
        let mut collector = DbCollector::new(executor, DbFlavor::Postgres);
        assert!(collector.collect(0).is_err());
        assert_eq!(collector.server_version_num(), None);
    }

    #[test]
    fn postgres_flavor_accumulates_sampled_waits() {
        let executor = StaticExecutor::new()
            .with_version(160000)
            .with_rows(Source::WaitEvents, vec![row(&["DataFileRead", "IO", "2"])]);
        let mut collector = DbCollector::new(executor, DbFlavor::Postgres);

        collector.collect(1_000).unwrap();
        let out = collector.collect(3_000).unwrap();
        let waits = out
            .blocks
            .iter()
            .find_map(|b| match b {
                DataBlock::PgWaitEvents(w) => Some(w.clone()),
                _ => None,
            })
            .unwrap();

        assert_eq!(waits.len(), 1);
        assert_eq!(waits[0].waits, 4);
        assert!((waits[0].time_ms - 4_000.0).abs() < f64::EPSILON);
    }
}
