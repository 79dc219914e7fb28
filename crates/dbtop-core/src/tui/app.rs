//! Main TUI application.

use std::io;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use thiserror::Error;
use tracing::{debug, warn};

use crate::mode::KeyAction;
use crate::monitor::Monitor;
use crate::provider::{ProviderError, SnapshotProvider};

use super::event::{Event, EventSource, POLL_TIMEOUT};
use super::render::{Screen, render};

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
    /// The first sample failed, so there is nothing to show.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Interactive application: one monitor driven by an event source.
pub struct App<P> {
    monitor: Monitor<P>,
    /// Time waited since the last sample.
    since_sample: Duration,
    failure: Option<String>,
    should_quit: bool,
}

impl<P: SnapshotProvider> App<P> {
    pub fn new(monitor: Monitor<P>) -> Self {
        Self {
            monitor,
            since_sample: Duration::ZERO,
            failure: None,
            should_quit: false,
        }
    }

    pub fn monitor(&self) -> &Monitor<P> {
        &self.monitor
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Takes the first sample. Failing here is fatal.
    pub fn start(&mut self) -> Result<(), ProviderError> {
        self.monitor.sample()?;
        Ok(())
    }

    /// Applies one event. Returns true when the screen needs a redraw.
    ///
    /// Ticks accumulate until the interval has passed, then one sample is taken. Sampling
    /// continues while paused. Keys only change the mode and never sample.
    pub fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Tick(waited) => {
                self.since_sample += waited;
                if self.since_sample < self.monitor.mode().interval {
                    return false;
                }
                self.since_sample = Duration::ZERO;
                match self.monitor.sample() {
                    Ok(_) => self.failure = None,
                    Err(e) => {
                        warn!(error = %e, "sample failed, keeping last data");
                        self.failure = Some(format!("{} (retrying)", e));
                    }
                }
                true
            }
            Event::Key(key) => match self.monitor.handle_key(key) {
                KeyAction::Quit => {
                    self.should_quit = true;
                    false
                }
                KeyAction::None => false,
                KeyAction::IntervalChanged(interval) => {
                    debug!(interval_secs = interval.as_secs(), "interval changed");
                    true
                }
                KeyAction::Redraw | KeyAction::Paused | KeyAction::Resumed => true,
            },
            Event::Resize(..) => true,
        }
    }

    fn draw<B: Backend>(&self, terminal: &mut Terminal<B>) -> io::Result<()> {
        let screen = Screen {
            status: self.monitor.status_line(),
            tables: self.monitor.view(),
            mode: self.monitor.mode(),
            failure: self.failure.as_deref(),
        };
        terminal.draw(|frame| render(frame, &screen))?;
        Ok(())
    }

    /// Draws and handles events until quit or until the source closes.
    pub fn run_loop<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        events: &mut impl EventSource,
    ) -> io::Result<()> {
        self.draw(terminal)?;
        while !self.should_quit {
            let Some(event) = events.next(POLL_TIMEOUT)? else {
                break;
            };
            if self.handle(event) {
                self.draw(terminal)?;
            }
        }
        Ok(())
    }

    /// Runs on the real terminal: raw mode and alternate screen, restored on exit.
    pub fn run(mut self, mut events: impl EventSource) -> Result<(), TuiError> {
        self.start()?;

        enable_raw_mode()?;
        let mut terminal = match enter_screen() {
            Ok(terminal) => terminal,
            Err(e) => {
                restore_screen(&mut io::stdout());
                return Err(e.into());
            }
        };

        let result = self.run_loop(&mut terminal, &mut events);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result.map_err(TuiError::from)
    }
}

fn enter_screen() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Best-effort undo of raw mode and the alternate screen after a failed setup.
fn restore_screen(out: &mut impl io::Write) {
    if let Err(e) = disable_raw_mode() {
        warn!(error = %e, "failed to disable raw mode");
    }
    if let Err(e) = execute!(out, LeaveAlternateScreen) {
        warn!(error = %e, "failed to leave alternate screen");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{DbCollector, DbFlavor, HostCollector, MockFs, StaticExecutor};
    use crate::mode::{Key, ModeState};
    use crate::model::Snapshot;
    use crate::provider::{LiveProvider, ReplayProvider};
    use crate::tui::event::ScriptedEvents;
    use ratatui::backend::TestBackend;

    fn replay(n: usize) -> ReplayProvider {
        ReplayProvider::from_snapshots((0..n).map(|i| Snapshot::new(i as i64 * 5_000)))
    }

    fn app(n: usize) -> App<ReplayProvider> {
        let mut app = App::new(Monitor::new(replay(n), ModeState::default()));
        app.start().unwrap();
        app
    }

    #[test]
    fn ticks_accumulate_to_interval() {
        let mut app = app(5);
        for tick in ScriptedEvents::ticks(Duration::from_millis(4_800)) {
            assert!(!app.handle(tick));
        }
        assert_eq!(app.monitor().provider().collected(), 1);

        assert!(app.handle(Event::Tick(Duration::from_millis(200))));
        assert_eq!(app.monitor().provider().collected(), 2);
    }

    #[test]
    fn keys_redraw_without_sampling() {
        let mut app = app(5);
        for c in "dwsm3p".chars() {
            assert!(app.handle(Event::Key(Key::Char(c))));
        }
        assert!(!app.handle(Event::Key(Key::Char('z'))));
        assert_eq!(app.monitor().provider().collected(), 1);
        assert!(app.monitor().mode().paused);
    }

    #[test]
    fn sampling_continues_while_paused() {
        let mut app = app(5);
        app.handle(Event::Key(Key::Char('p')));
        app.handle(Event::Tick(Duration::from_secs(5)));
        assert_eq!(app.monitor().provider().collected(), 2);
        assert_eq!(app.monitor().displayed().unwrap().current.timestamp_ms, 0);
    }

    #[test]
    fn failed_sample_keeps_data_and_retries() {
        let mut provider = replay(1);
        provider.push_failure("connection refused");
        provider.push(Snapshot::new(10_000));
        let mut app = App::new(Monitor::new(provider, ModeState::default()));
        app.start().unwrap();

        app.handle(Event::Tick(Duration::from_secs(5)));
        assert!(app.failure.as_deref().unwrap().contains("retrying"));
        assert!(app.monitor().view().is_some());

        app.handle(Event::Tick(Duration::from_secs(5)));
        assert!(app.failure.is_none());
        assert_eq!(app.monitor().latest().unwrap().delta.elapsed_secs, 10.0);
    }

    #[test]
    fn interval_change_applies_to_accumulator() {
        let mut app = app(5);
        for e in ScriptedEvents::keys("i2") {
            app.handle(e);
        }
        assert!(app.handle(Event::Key(Key::Enter)));
        app.handle(Event::Tick(Duration::from_secs(2)));
        assert_eq!(app.monitor().provider().collected(), 2);
    }

    #[test]
    fn failed_setup_leaves_alternate_screen() {
        let mut out = Vec::new();
        restore_screen(&mut out);
        assert!(String::from_utf8(out).unwrap().contains("\x1b[?1049l"));
    }

    #[test]
    fn quit_stops_loop() {
        let mut app = app(5);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut events = ScriptedEvents::new(ScriptedEvents::keys("dq"));
        app.run_loop(&mut terminal, &mut events).unwrap();
        assert!(app.should_quit());
    }

    #[test]
    fn renders_dashboard_on_test_backend() {
        let db = DbCollector::new(StaticExecutor::typical_gaussdb(), DbFlavor::GaussDb);
        let provider =
            LiveProvider::with_database(Some(HostCollector::new(MockFs::typical_host(), "/proc")), db);
        let mut app = App::new(Monitor::new(provider, ModeState::default()));
        app.start().unwrap();

        let mut terminal = Terminal::new(TestBackend::new(140, 60)).unwrap();
        let mut events = ScriptedEvents::new([Event::Key(Key::Char('?'))]);
        app.run_loop(&mut terminal, &mut events).unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(screen.contains("dbtop"));
        assert!(screen.contains("Instance"));
        assert!(screen.contains("orders"));
        assert!(screen.contains("Wait events (cumulative)"));
        assert!(screen.contains("Keys"));
    }
}
