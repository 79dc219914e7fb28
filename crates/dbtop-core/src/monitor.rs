//! Sampling step shared by the batch and interactive drivers.
//!
//! A [`Monitor`] owns the provider, the delta engine, the previous-sample cache and the
//! mode state. Each [`Monitor::sample`] call collects one snapshot, computes deltas against
//! the previous one and replaces the cache. Pausing only freezes what is displayed.

use chrono::{Local, TimeZone};
use tracing::debug;

use crate::mode::{DetailView, Key, KeyAction, ModeState};
use crate::model::Snapshot;
use crate::output::OutputFormat;
use crate::provider::{ProviderError, SnapshotProvider};
use crate::rates::{DeltaEngine, DeltaSet};
use crate::view::{SnapshotPair, TableSet, render};

/// Driver settings that are not part of the display mode.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Frames to render before stopping, 0 = until interrupted.
    pub iterations: u64,
    pub format: OutputFormat,
    /// Truncate text lines to this many columns.
    pub width: Option<usize>,
    /// Clear the screen before each text frame.
    pub clear_screen: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            iterations: 0,
            format: OutputFormat::Text,
            width: None,
            clear_screen: true,
        }
    }
}

/// One computed sample: the snapshot pair and the deltas between them.
#[derive(Debug, Clone)]
pub struct Sample {
    pub previous: Option<Snapshot>,
    pub current: Snapshot,
    pub delta: DeltaSet,
}

impl Sample {
    pub fn pair(&self) -> SnapshotPair<'_> {
        SnapshotPair::new(self.previous.as_ref(), &self.current)
    }
}

pub struct Monitor<P> {
    provider: P,
    engine: DeltaEngine,
    mode: ModeState,
    latest: Option<Sample>,
    /// Sample shown while paused.
    frozen: Option<Sample>,
    last_error: Option<ProviderError>,
    samples: u64,
}

impl<P: SnapshotProvider> Monitor<P> {
    pub fn new(provider: P, mode: ModeState) -> Self {
        Self {
            provider,
            engine: DeltaEngine::new(),
            mode,
            latest: None,
            frozen: None,
            last_error: None,
            samples: 0,
        }
    }

    pub fn mode(&self) -> &ModeState {
        &self.mode
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Successful samples so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn last_error(&self) -> Option<&ProviderError> {
        self.last_error.as_ref()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.latest.as_ref()
    }

    /// Collects a snapshot and computes deltas against the cached one.
    ///
    /// On failure the cache is kept, so the next success measures against the last good
    /// snapshot.
    pub fn sample(&mut self) -> Result<&Sample, ProviderError> {
        let current = match self.provider.collect() {
            Ok(s) => s,
            Err(e) => {
                self.last_error = Some(e.clone());
                return Err(e);
            }
        };
        self.last_error = None;

        let previous = self.latest.take().map(|s| s.current);
        let elapsed_secs = previous
            .as_ref()
            .map(|p| (current.timestamp_ms - p.timestamp_ms) as f64 / 1000.0)
            .unwrap_or(0.0);
        let delta = self.engine.compute(previous.as_ref(), &current, elapsed_secs);
        debug!(
            elapsed_secs,
            bootstrap = delta.bootstrap,
            blocks = current.blocks.len(),
            "sample computed"
        );

        self.samples += 1;
        Ok(&*self.latest.insert(Sample {
            previous,
            current,
            delta,
        }))
    }

    /// Sample currently on display: the frozen one while paused, else the latest.
    pub fn displayed(&self) -> Option<&Sample> {
        if self.mode.paused {
            self.frozen.as_ref().or(self.latest.as_ref())
        } else {
            self.latest.as_ref()
        }
    }

    /// Tables for the displayed sample under the current mode.
    pub fn view(&self) -> Option<TableSet> {
        self.displayed()
            .map(|s| render(s.pair(), &s.delta, &self.mode))
    }

    /// Applies a key to the mode state. Never samples.
    pub fn handle_key(&mut self, key: Key) -> KeyAction {
        let action = self.mode.handle_key(key);
        match action {
            KeyAction::Paused => self.frozen = self.latest.clone(),
            KeyAction::Resumed => self.frozen = None,
            _ => {}
        }
        action
    }

    /// One-line summary of the displayed sample and mode.
    pub fn status_line(&self) -> String {
        let time = self
            .displayed()
            .and_then(|s| Local.timestamp_millis_opt(s.current.timestamp_ms).single())
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "--".to_string());
        let view = match self.mode.view {
            DetailView::Sql => "sql",
            DetailView::Session => "session",
        };
        let section = match self.mode.section {
            0 => "all".to_string(),
            k => k.to_string(),
        };
        let mut line = format!(
            "{}  interval {}s  waits {}  view {}  section {}",
            time,
            self.mode.interval.as_secs(),
            self.mode.wait_mode.label(),
            view,
            section
        );
        if self.mode.detailed {
            line.push_str("  detailed");
        }
        if self.mode.paused {
            line.push_str("  [paused]");
        }
        line
    }
}
