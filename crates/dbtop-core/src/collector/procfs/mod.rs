//! Collectors for the Linux `/proc` filesystem.

mod host;
pub mod parser;

pub use host::{CollectError, DEFAULT_PAGE_SIZE, HostCollector};
