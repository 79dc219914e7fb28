//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use dbtop_core::collector::{ConnectionParams, DbFlavor};
use dbtop_core::mode::{DetailView, Grouping, ModeState, SortKey, WaitMode};
use dbtop_core::monitor::MonitorConfig;
use dbtop_core::output::OutputFormat;

/// How database queries reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClientKind {
    /// Native protocol via the `postgres` driver.
    Pg,
    /// Shell out to `gsql`/`psql`.
    Cli,
}

/// Terminal monitor for GaussDB/PostgreSQL servers and Linux hosts.
#[derive(Parser, Debug)]
#[command(
    name = "dbtop",
    about = "Terminal monitor for GaussDB/PostgreSQL servers and Linux hosts",
    version
)]
pub struct Args {
    /// Refresh interval in seconds.
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Number of frames to print in batch mode (0 = until interrupted).
    #[arg(short = 'n', long, default_value_t = 0)]
    pub iterations: u64,

    /// Print frames to stdout (or --output) instead of the interactive screen.
    #[arg(short, long)]
    pub batch: bool,

    /// Write batch frames to this file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Batch frame format: text or json.
    #[arg(long, default_value = "text", value_parser = parse_format)]
    pub format: OutputFormat,

    /// Truncate text frames to this many columns.
    #[arg(long, value_name = "COLS")]
    pub width: Option<usize>,

    /// Do not clear the terminal between text frames.
    #[arg(long)]
    pub no_clear: bool,

    /// Start with detailed columns.
    #[arg(long)]
    pub detailed: bool,

    /// Start with real-time (per-interval) wait events.
    #[arg(long)]
    pub realtime: bool,

    /// Start in session view instead of SQL view.
    #[arg(long)]
    pub session: bool,

    /// Label sessions by module/action instead of user/program.
    #[arg(long)]
    pub module: bool,

    /// Show one section only (1-4), 0 for all.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=4))]
    pub section: u8,

    /// Process sort key: cpu or mem.
    #[arg(long, default_value = "cpu", value_parser = parse_sort)]
    pub sort: SortKey,

    /// Rows in top-N tables.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=50))]
    pub top: u16,

    /// Monitor the host only, without a database connection.
    #[arg(long)]
    pub host_only: bool,

    /// Server flavor: gaussdb or postgres.
    #[arg(long, default_value = "gaussdb", value_parser = parse_flavor)]
    pub flavor: DbFlavor,

    /// Query transport.
    #[arg(long, value_enum, default_value_t = ClientKind::Pg)]
    pub client: ClientKind,

    /// Client binary for --client cli (default: gsql, or psql for postgres).
    #[arg(long, value_name = "PATH")]
    pub client_bin: Option<PathBuf>,

    /// Database server host.
    #[arg(short = 'H', long, env = "PGHOST")]
    pub host: Option<String>,

    /// Database server port.
    #[arg(short, long, env = "PGPORT")]
    pub port: Option<u16>,

    /// Database user.
    #[arg(short = 'U', long, env = "PGUSER")]
    pub user: Option<String>,

    /// Database name.
    #[arg(short, long, env = "PGDATABASE")]
    pub database: Option<String>,

    /// Database password. Falls back to PGPASSWORD.
    #[arg(short = 'W', long, env = "GAUSSDB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    pub proc_path: PathBuf,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Write logs to this file. Without it the interactive screen logs nothing.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse()
}

fn parse_sort(s: &str) -> Result<SortKey, String> {
    s.parse()
}

fn parse_flavor(s: &str) -> Result<DbFlavor, String> {
    s.parse()
}

/// Explicit password first, then the fallback variable. Empty values count as unset.
fn resolve_password(explicit: Option<&str>, fallback: Option<String>) -> Option<String> {
    explicit
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .or(fallback.filter(|p| !p.is_empty()))
}

impl Args {
    pub fn interactive(&self) -> bool {
        !self.batch
    }

    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            database: self.database.clone(),
            password: resolve_password(
                self.password.as_deref(),
                std::env::var("PGPASSWORD").ok(),
            ),
        }
    }

    pub fn client_program(&self) -> PathBuf {
        self.client_bin.clone().unwrap_or_else(|| {
            PathBuf::from(match self.flavor {
                DbFlavor::GaussDb => "gsql",
                DbFlavor::Postgres => "psql",
            })
        })
    }

    /// Initial display mode.
    pub fn mode_state(&self) -> ModeState {
        let mut mode = ModeState::default()
            .with_interval(Duration::from_secs(self.interval))
            .with_section(self.section)
            .with_top_n(self.top as usize);
        mode.detailed = self.detailed;
        mode.sort = self.sort;
        if self.realtime {
            mode.wait_mode = WaitMode::Realtime;
        }
        if self.session {
            mode.view = DetailView::Session;
        }
        if self.module {
            mode.grouping = Grouping::ModuleAction;
        }
        mode
    }

    /// Batch settings. Clearing only applies to text written to the terminal.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            iterations: self.iterations,
            format: self.format,
            width: self.width,
            clear_screen: !self.no_clear
                && self.output.is_none()
                && self.format == OutputFormat::Text,
        }
    }
}
