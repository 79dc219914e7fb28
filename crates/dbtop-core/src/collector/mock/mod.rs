//! Test doubles for the host and database collectors.

mod database;
mod filesystem;
mod scenarios;

pub use database::StaticExecutor;
pub use filesystem::MockFs;
pub use scenarios::proc_stat_line;
