//! Scripted query executor for database collector tests.

use std::collections::{HashMap, VecDeque};

use crate::collector::db::{Query, QueryError, QueryExecutor, QueryKind, Rows};
use crate::model::Source;

type Response = Result<Rows, String>;

/// Returns canned rows per query kind.
///
/// Each kind holds a queue of responses. The front response is popped while more than one is
/// queued, so the last one repeats forever. Kinds with no responses return no rows.
#[derive(Debug, Default)]
pub struct StaticExecutor {
    responses: HashMap<QueryKind, VecDeque<Response>>,
    refuse_connections: bool,
    executed: Vec<QueryKind>,
}

impl StaticExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(self, version_num: i32) -> Self {
        self.push(
            QueryKind::ServerVersion,
            Ok(vec![vec![version_num.to_string()]]),
        )
    }

    /// Queues a successful response for a source.
    pub fn with_rows(self, source: Source, rows: Rows) -> Self {
        self.push(QueryKind::Fetch(source), Ok(rows))
    }

    /// Replaces every queued response for a source with a query error.
    pub fn with_failure(mut self, source: Source, message: &str) -> Self {
        self.responses.remove(&QueryKind::Fetch(source));
        self.push(QueryKind::Fetch(source), Err(message.to_string()))
    }

    /// Every query fails as if the server were down.
    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connections = true;
        self
    }

    /// Kinds executed so far, in order.
    pub fn executed(&self) -> &[QueryKind] {
        &self.executed
    }

    fn push(mut self, kind: QueryKind, response: Response) -> Self {
        self.responses.entry(kind).or_default().push_back(response);
        self
    }

    /// A GaussDB 9.2-compatible server with a busy `orders` database.
    pub fn typical_gaussdb() -> Self {
        fn rows(data: &[&[&str]]) -> Rows {
            data.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect()
        }

        Self::new()
            .with_version(90204)
            .with_rows(
                Source::Instance,
                rows(&[&[
                    "orders",
                    "10.0.0.1",
                    "8000",
                    "9.2.4",
                    "2024-05-01 08:00:00",
                    "86400",
                ]]),
            )
            .with_rows(
                Source::Databases,
                rows(&[&[
                    "orders", "12", "50000", "20", "1000", "99000", "500000", "30000", "900",
                    "400", "10",
                ]]),
            )
            .with_rows(
                Source::SessionStates,
                rows(&[
                    &["idle", "none", "8"],
                    &["active", "IO", "3"],
                    &["active", "none", "1"],
                ]),
            )
            .with_rows(
                Source::WaitEvents,
                rows(&[
                    &["DataFileRead", "IO", "1200", "3600000"],
                    &["WALWrite", "IO", "300", "900000"],
                    &["LockMgrLock", "LWLock", "40", "20000"],
                ]),
            )
            .with_rows(
                Source::ActiveStatements,
                rows(&[
                    &["3", "IO", "SELECT * FROM orders WHERE id = $1"],
                    &["1", "none", "SELECT * FROM orders WHERE id = $1"],
                    &["7", "Lock", "UPDATE stock SET qty = qty - 1"],
                ]),
            )
            .with_rows(
                Source::Sessions,
                rows(&[
                    &[
                        "2001", "app", "api", "10.0.0.9", "orders", "active", "Lock", "7",
                        "UPDATE stock SET qty = qty - 1",
                    ],
                    &[
                        "2002", "app", "api", "10.0.0.9", "orders", "active", "IO", "3",
                        "SELECT * FROM orders WHERE id = $1",
                    ],
                    &[
                        "2003", "batch", "loader", "10.0.0.7", "orders", "idle", "none", "900",
                        "COMMIT",
                    ],
                ]),
            )
            .with_rows(
                Source::Locks,
                rows(&[
                    &["AccessShareLock", "relation", "t", "14"],
                    &["RowExclusiveLock", "relation", "t", "4"],
                    &["ShareLock", "transactionid", "f", "1"],
                ]),
            )
            .with_rows(
                Source::Bgwriter,
                rows(&[&["120", "3", "40000", "2000", "5", "1500", "90000"]]),
            )
    }
}

impl QueryExecutor for StaticExecutor {
    fn execute(&mut self, query: &Query) -> Result<Rows, QueryError> {
        self.executed.push(query.kind);
        if self.refuse_connections {
            return Err(QueryError::Connection("connection refused".to_string()));
        }

        let Some(queue) = self.responses.get_mut(&query.kind) else {
            return Ok(Vec::new());
        };
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match response {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(QueryError::Query(message)),
            None => Ok(Vec::new()),
        }
    }
}
