//! Event sources for the interactive loop.
//!
//! Input is read with a bounded wait. A wait that ends without input yields
//! [`Event::Tick`] carrying the time actually waited, which the app accumulates toward the
//! refresh interval.

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::mode::Key;

/// Bounded wait for one input poll.
pub const POLL_TIMEOUT: Duration = Duration::from_millis(200);

/// Application events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// No input within the wait; carries the time waited.
    Tick(Duration),
    Key(Key),
    /// Terminal resize (width, height).
    Resize(u16, u16),
}

pub trait EventSource {
    /// Waits up to `timeout` for the next event. `None` means the source is closed.
    fn next(&mut self, timeout: Duration) -> io::Result<Option<Event>>;
}

/// Polls the terminal directly on the calling thread.
#[derive(Debug, Default)]
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn next(&mut self, timeout: Duration) -> io::Result<Option<Event>> {
        let start = Instant::now();
        if !event::poll(timeout)? {
            return Ok(Some(Event::Tick(start.elapsed())));
        }
        let event = match event::read()? {
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                Event::Key(key_from_crossterm(key))
            }
            CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
            _ => Event::Tick(start.elapsed()),
        };
        Ok(Some(event))
    }
}

/// Maps a terminal key event to a mode key.
pub fn key_from_crossterm(key: KeyEvent) -> Key {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Key::CtrlC,
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Backspace => Key::Backspace,
        _ => Key::Other,
    }
}

/// Replays a fixed list of events, then reports the source closed.
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    events: VecDeque<Event>,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Ticks summing to `total`, in [`POLL_TIMEOUT`] steps.
    pub fn ticks(total: Duration) -> Vec<Event> {
        let mut out = Vec::new();
        let mut remaining = total;
        while !remaining.is_zero() {
            let step = remaining.min(POLL_TIMEOUT);
            out.push(Event::Tick(step));
            remaining -= step;
        }
        out
    }

    pub fn keys(keys: &str) -> Vec<Event> {
        keys.chars().map(|c| Event::Key(Key::Char(c))).collect()
    }
}

impl EventSource for ScriptedEvents {
    fn next(&mut self, _timeout: Duration) -> io::Result<Option<Event>> {
        Ok(self.events.pop_front())
    }
}
