//! Raw metric acquisition.
//!
//! ```text
//!   ┌───────────────────────────┐     ┌────────────────────────────────┐
//!   │      HostCollector        │     │          DbCollector           │
//!   │  /proc/stat, meminfo,     │     │  one query per Source          │
//!   │  loadavg, uptime,         │     │  rows → typed records          │
//!   │  /proc/[pid]/stat         │     └───────────────┬────────────────┘
//!   └─────────────┬─────────────┘                     │
//!          ┌──────▼──────┐                   ┌────────▼────────┐
//!          │  FileSystem │ (trait)           │  QueryExecutor  │ (trait)
//!          └──────┬──────┘                   └────────┬────────┘
//!        ┌────────┴────────┐         ┌────────────────┼────────────────┐
//!    RealFs             MockFs    PgExecutor     CliExecutor     StaticExecutor
//! ```
//!
//! ## Testing
//!
//! ```
//! use dbtop_core::collector::{HostCollector, MockFs};
//!
//! let collector = HostCollector::new(MockFs::typical_host(), "/proc");
//! let blocks = collector.collect().unwrap();
//! assert!(!blocks.is_empty());
//! ```

pub mod db;
pub mod mock;
pub mod procfs;
pub mod traits;

pub use db::{
    CliExecutor, ConnectionParams, DbCollection, DbCollector, DbFlavor, PgExecutor, QueryError,
    QueryExecutor,
};
pub use mock::{MockFs, StaticExecutor};
pub use procfs::{CollectError, HostCollector};
pub use traits::{FileSystem, RealFs};
