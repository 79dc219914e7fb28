//! dbtop - terminal monitor for GaussDB/PostgreSQL servers and Linux hosts.
//!
//! Runs an interactive dashboard by default, or prints text/JSON frames with `--batch`.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod cli;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use dbtop_core::batch::{self, BatchError};
use dbtop_core::collector::{
    CliExecutor, DbCollector, FileSystem, HostCollector, PgExecutor, QueryExecutor, RealFs,
};
use dbtop_core::monitor::Monitor;
use dbtop_core::output::{FrameWriter, OutputError, open_sink};
use dbtop_core::provider::{LiveProvider, ProviderError};
use dbtop_core::tui::{App, CrosstermEvents, TuiError};

use cli::{Args, ClientKind};

const CONNECTION_HINT: &str = "hint: check --host/--port/--user/--database (or PGHOST, PGPORT, \
PGUSER, PGDATABASE) and the password in GAUSSDB_PASSWORD or PGPASSWORD; with --client cli the \
client binary must be on PATH or given with --client-bin";

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Tui(#[from] TuiError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

impl RunError {
    fn provider(&self) -> Option<&ProviderError> {
        match self {
            RunError::Batch(BatchError::Provider(e)) | RunError::Tui(TuiError::Provider(e)) => {
                Some(e)
            }
            _ => None,
        }
    }
}

fn build_provider(args: &Args) -> LiveProvider<RealFs> {
    let host = HostCollector::new(RealFs::new(), &args.proc_path);
    if args.host_only {
        info!(proc_path = %args.proc_path.display(), "monitoring host only");
        return LiveProvider::host_only(host);
    }

    let params = args.connection_params();
    let executor: Box<dyn QueryExecutor> = match args.client {
        ClientKind::Pg => Box::new(PgExecutor::new(&params)),
        ClientKind::Cli => {
            let program = args.client_program();
            debug!(program = %program.display(), "using command-line client");
            Box::new(CliExecutor::new(program, params))
        }
    };
    let db = DbCollector::new(executor, args.flavor);

    // Host gauges are optional next to a database, e.g. when run off-host.
    let host = RealFs::new()
        .exists(&args.proc_path.join("stat"))
        .then_some(host);
    if host.is_none() {
        warn!(proc_path = %args.proc_path.display(), "no /proc/stat, host metrics disabled");
    }
    info!(flavor = %args.flavor, "monitoring database");
    LiveProvider::with_database(host, db)
}

fn run_batch(args: &Args, monitor: &mut Monitor<LiveProvider<RealFs>>) -> Result<(), RunError> {
    let stop = Arc::new(AtomicBool::new(false));
    let s = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        s.store(true, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let config = args.monitor_config();
    let sink = open_sink(args.output.as_deref())?;
    let mut writer = FrameWriter::new(sink, config.format)
        .with_width(config.width)
        .with_clear_screen(config.clear_screen);

    let frames = batch::run(
        monitor,
        &mut writer,
        config.iterations,
        &stop,
        std::thread::sleep,
    )?;
    info!(frames, "batch output finished");
    Ok(())
}

fn run(args: &Args) -> Result<(), RunError> {
    let mut monitor = Monitor::new(build_provider(args), args.mode_state());
    if args.interactive() {
        App::new(monitor).run(CrosstermEvents)?;
        Ok(())
    } else {
        run_batch(args, &mut monitor)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = logging::init_logging(
        args.verbose,
        args.quiet,
        args.log_file.as_deref(),
        args.interactive(),
    ) {
        eprintln!("dbtop: cannot open log file: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("dbtop: {}", e);
            if e.provider().is_some_and(ProviderError::is_connection) {
                eprintln!("{}", CONNECTION_HINT);
            }
            ExitCode::FAILURE
        }
    }
}
