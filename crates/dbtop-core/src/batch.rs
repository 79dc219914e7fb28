//! Batch driver: sample on an interval and write frames to a sink.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::monitor::Monitor;
use crate::output::{FrameWriter, OutputError};
use crate::provider::{ProviderError, SnapshotProvider};

/// Granularity at which the stop flag is checked while sleeping.
pub const SLEEP_STEP: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Sleeps for `total` in [`SLEEP_STEP`] slices. Returns false if `stop` was raised.
pub fn sleep_interruptible(
    total: Duration,
    stop: &AtomicBool,
    mut sleep: impl FnMut(Duration),
) -> bool {
    let mut remaining = total;
    while !remaining.is_zero() {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let step = remaining.min(SLEEP_STEP);
        sleep(step);
        remaining -= step;
    }
    !stop.load(Ordering::SeqCst)
}

/// Runs the batch loop until `iterations` frames were written (0 = no limit), the stop flag
/// is raised or a replay runs dry. Returns the number of frames written.
///
/// The first sample is a baseline and is not rendered. Any failed cycle ends the run.
pub fn run<P, W>(
    monitor: &mut Monitor<P>,
    writer: &mut FrameWriter<W>,
    iterations: u64,
    stop: &AtomicBool,
    mut sleep: impl FnMut(Duration),
) -> Result<u64, BatchError>
where
    P: SnapshotProvider,
    W: Write,
{
    match monitor.sample() {
        Ok(_) => debug!("baseline sample taken"),
        Err(ProviderError::Exhausted) => return Ok(0),
        Err(e) => return Err(e.into()),
    }
    info!(
        interval_secs = monitor.mode().interval.as_secs(),
        iterations, "batch output started"
    );

    let mut frames = 0u64;
    while iterations == 0 || frames < iterations {
        if !sleep_interruptible(monitor.mode().interval, stop, &mut sleep) {
            debug!(frames, "stop requested");
            break;
        }
        match monitor.sample() {
            Ok(_) => {}
            Err(ProviderError::Exhausted) => break,
            Err(e) => return Err(e.into()),
        }
        if let Some(set) = monitor.view() {
            writer.write_frame(&monitor.status_line(), &set)?;
            frames += 1;
        }
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{HostCollector, MockFs};
    use crate::mode::ModeState;
    use crate::model::Snapshot;
    use crate::output::OutputFormat;
    use crate::provider::ReplayProvider;

    fn host_snapshots(n: usize) -> Vec<Snapshot> {
        let mut collector = HostCollector::new(MockFs::typical_host(), "/proc");
        (0..n)
            .map(|i| {
                let base = 10_000 + i as u64 * 100;
                collector
                    .fs_mut()
                    .set_cpu_counters(&[base, 500, 3000, 80_000 + i as u64 * 100]);
                Snapshot {
                    timestamp_ms: i as i64 * 1_000,
                    blocks: collector.collect().unwrap(),
                    unavailable: Vec::new(),
                }
            })
            .collect()
    }

    #[test]
    fn stops_after_iterations() {
        let mut monitor = Monitor::new(
            ReplayProvider::from_snapshots(host_snapshots(10)),
            ModeState::default(),
        );
        let mut writer = FrameWriter::new(Vec::new(), OutputFormat::Text);
        let stop = AtomicBool::new(false);
        let mut slept = Duration::ZERO;

        let frames = run(&mut monitor, &mut writer, 3, &stop, |d| slept += d).unwrap();
        assert_eq!(frames, 3);
        assert_eq!(monitor.provider().collected(), 4);
        assert_eq!(slept, Duration::from_secs(15));

        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out.matches("Host gauges").count(), 3);
        assert!(out.contains("50.0"));
    }

    #[test]
    fn replay_running_dry_ends_cleanly() {
        let mut monitor = Monitor::new(
            ReplayProvider::from_snapshots(host_snapshots(3)),
            ModeState::default(),
        );
        let mut writer = FrameWriter::new(Vec::new(), OutputFormat::Json);
        let stop = AtomicBool::new(false);
        let frames = run(&mut monitor, &mut writer, 0, &stop, |_| {}).unwrap();
        assert_eq!(frames, 2);
    }

    #[test]
    fn failure_aborts() {
        let mut provider = ReplayProvider::from_snapshots(host_snapshots(1));
        provider.push_failure("connection refused");
        let mut monitor = Monitor::new(provider, ModeState::default());
        let mut writer = FrameWriter::new(Vec::new(), OutputFormat::Text);
        let stop = AtomicBool::new(false);

        let err = run(&mut monitor, &mut writer, 0, &stop, |_| {}).unwrap_err();
        assert!(matches!(err, BatchError::Provider(e) if e.is_connection()));
        assert_eq!(writer.frames(), 0);
    }

    #[test]
    fn stop_flag_interrupts_sleep() {
        let stop = AtomicBool::new(false);
        let mut steps = 0;
        let finished = sleep_interruptible(Duration::from_secs(5), &stop, |_| {
            steps += 1;
            if steps == 3 {
                stop.store(true, Ordering::SeqCst);
            }
        });
        assert!(!finished);
        assert_eq!(steps, 3);
    }

    #[test]
    fn sleep_is_sliced() {
        let stop = AtomicBool::new(false);
        let mut slices = Vec::new();
        assert!(sleep_interruptible(
            Duration::from_millis(250),
            &stop,
            |d| slices.push(d)
        ));
        assert_eq!(
            slices,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(100),
                Duration::from_millis(50)
            ]
        );
    }
}
