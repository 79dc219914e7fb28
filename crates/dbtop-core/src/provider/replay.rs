//! Provider replaying a prepared sequence of cycles.

use std::collections::VecDeque;

use crate::model::Snapshot;

use super::{ProviderError, SnapshotProvider};

/// Hands out queued snapshots (or failures) in order, then [`ProviderError::Exhausted`].
#[derive(Debug, Default)]
pub struct ReplayProvider {
    queue: VecDeque<Result<Snapshot, ProviderError>>,
    collected: usize,
}

impl ReplayProvider {
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = Snapshot>) -> Self {
        Self {
            queue: snapshots.into_iter().map(Ok).collect(),
            collected: 0,
        }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.queue.push_back(Ok(snapshot));
    }

    /// Queues a failed cycle.
    pub fn push_failure(&mut self, message: &str) {
        self.queue.push_back(Err(ProviderError::Acquisition {
            target: "database",
            message: message.to_string(),
            connection: true,
        }));
    }

    /// Number of `collect` calls so far.
    pub fn collected(&self) -> usize {
        self.collected
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl SnapshotProvider for ReplayProvider {
    fn collect(&mut self) -> Result<Snapshot, ProviderError> {
        self.collected += 1;
        self.queue.pop_front().unwrap_or(Err(ProviderError::Exhausted))
    }
}
