//! Snapshot source abstraction.
//!
//! - [`LiveProvider`] samples `/proc` and the database server.
//! - [`ReplayProvider`] hands out prepared snapshots, for drivers under test.

mod live;
mod replay;

pub use live::LiveProvider;
pub use replay::ReplayProvider;

use thiserror::Error;

use crate::model::Snapshot;

/// Error produced when a whole sampling cycle failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Nothing usable was acquired from a required target.
    #[error("{target} acquisition failed: {message}")]
    Acquisition {
        target: &'static str,
        message: String,
        /// The target could not be reached at all.
        connection: bool,
    },
    /// A replay ran out of snapshots.
    #[error("no more snapshots")]
    Exhausted,
}

impl ProviderError {
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            ProviderError::Acquisition {
                connection: true,
                ..
            }
        )
    }
}

/// Produces one snapshot per call.
///
/// Partial failures are recorded inside the snapshot as unavailable sources. An `Err` means
/// the cycle produced nothing usable.
pub trait SnapshotProvider {
    fn collect(&mut self) -> Result<Snapshot, ProviderError>;
}

impl<P: SnapshotProvider + ?Sized> SnapshotProvider for Box<P> {
    fn collect(&mut self) -> Result<Snapshot, ProviderError> {
        (**self).collect()
    }
}
