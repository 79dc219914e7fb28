//! Live data provider for real-time monitoring.

use std::time::Instant;

use tracing::{debug, warn};

use crate::collector::traits::FileSystem;
use crate::collector::{DbCollector, HostCollector, QueryExecutor};
use crate::model::{Snapshot, Source};

use super::{ProviderError, SnapshotProvider};

/// Samples the host and, when configured, one database server.
///
/// Sources are acquired one after the other. With a database configured, a host failure only
/// marks the host unavailable; without one it fails the cycle.
pub struct LiveProvider<F: FileSystem, E: QueryExecutor = Box<dyn QueryExecutor>> {
    host: Option<HostCollector<F>>,
    db: Option<DbCollector<E>>,
}

impl<F: FileSystem, E: QueryExecutor> LiveProvider<F, E> {
    /// Host-only monitoring.
    pub fn host_only(host: HostCollector<F>) -> Self {
        Self {
            host: Some(host),
            db: None,
        }
    }

    /// Database monitoring, with host gauges when `host` is given.
    pub fn with_database(host: Option<HostCollector<F>>, db: DbCollector<E>) -> Self {
        Self { host, db: Some(db) }
    }
}

impl<F: FileSystem, E: QueryExecutor> SnapshotProvider for LiveProvider<F, E> {
    fn collect(&mut self) -> Result<Snapshot, ProviderError> {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let mut snapshot = Snapshot::new(timestamp_ms);

        if let Some(host) = &self.host {
            let start = Instant::now();
            match host.collect() {
                Ok(blocks) => snapshot.blocks.extend(blocks),
                Err(e) if self.db.is_none() => {
                    return Err(ProviderError::Acquisition {
                        target: "host",
                        message: e.to_string(),
                        connection: false,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "host collection failed");
                    snapshot.mark_unavailable(Source::Host, e.to_string());
                }
            }
            debug!(elapsed_us = start.elapsed().as_micros() as u64, "host collected");
        }

        if let Some(db) = &mut self.db {
            let start = Instant::now();
            let collection = db.collect(timestamp_ms).map_err(|e| ProviderError::Acquisition {
                target: "database",
                message: e.to_string(),
                connection: e.is_connection(),
            })?;
            snapshot.blocks.extend(collection.blocks);
            snapshot.unavailable.extend(collection.unavailable);
            debug!(
                elapsed_us = start.elapsed().as_micros() as u64,
                unavailable = snapshot.unavailable.len(),
                "database collected"
            );
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{DbFlavor, MockFs, StaticExecutor};

    fn host() -> HostCollector<MockFs> {
        HostCollector::new(MockFs::typical_host(), "/proc")
    }

    #[test]
    fn host_only_collects_host_blocks() {
        let mut provider: LiveProvider<MockFs, StaticExecutor> = LiveProvider::host_only(host());
        let snap = provider.collect().unwrap();
        assert!(snap.host_cpu().is_some());
        assert!(!snap.has_database());
        assert!(snap.timestamp_ms > 0);
    }

    #[test]
    fn host_failure_is_fatal_without_database() {
        let mut provider: LiveProvider<MockFs, StaticExecutor> =
            LiveProvider::host_only(HostCollector::new(MockFs::new(), "/proc"));
        let err = provider.collect().unwrap_err();
        assert!(matches!(err, ProviderError::Acquisition { target: "host", .. }));
        assert!(!err.is_connection());
    }

    #[test]
    fn host_failure_is_partial_with_database() {
        let db = DbCollector::new(StaticExecutor::typical_gaussdb(), DbFlavor::GaussDb);
        let mut provider =
            LiveProvider::with_database(Some(HostCollector::new(MockFs::new(), "/proc")), db);
        let snap = provider.collect().unwrap();
        assert!(snap.unavailable_reason(Source::Host).is_some());
        assert!(snap.instance().is_some());
    }

    #[test]
    fn combined_snapshot() {
        let db = DbCollector::new(StaticExecutor::typical_gaussdb(), DbFlavor::GaussDb);
        let mut provider = LiveProvider::with_database(Some(host()), db);
        let snap = provider.collect().unwrap();
        assert!(snap.host_cpu().is_some());
        assert_eq!(snap.databases()[0].name, "orders");
        assert!(snap.unavailable.is_empty());
    }

    #[test]
    fn refused_connection_is_total() {
        let db = DbCollector::new(
            StaticExecutor::typical_gaussdb().refusing_connections(),
            DbFlavor::GaussDb,
        );
        let mut provider = LiveProvider::with_database(Some(host()), db);
        let err = provider.collect().unwrap_err();
        assert!(err.is_connection());
        assert!(err.to_string().starts_with("database acquisition failed"));
    }
}
