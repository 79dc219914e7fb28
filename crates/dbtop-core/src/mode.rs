//! Display mode state machine.
//!
//! The state is built once from command-line flags and afterwards mutated only by
//! [`ModeState::handle_key`]. Every combination of flags is valid.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Smallest accepted refresh interval.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_TOP_N: usize = 10;
pub const MAX_TOP_N: usize = 50;
/// Highest selectable section. 0 shows all of them.
pub const MAX_SECTION: u8 = 4;

const MAX_INTERVAL_INPUT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitMode {
    #[default]
    Cumulative,
    Realtime,
}

impl WaitMode {
    pub fn toggle(self) -> Self {
        match self {
            WaitMode::Cumulative => WaitMode::Realtime,
            WaitMode::Realtime => WaitMode::Cumulative,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WaitMode::Cumulative => "cumulative",
            WaitMode::Realtime => "real-time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailView {
    #[default]
    Sql,
    Session,
}

impl DetailView {
    pub fn toggle(self) -> Self {
        match self {
            DetailView::Sql => DetailView::Session,
            DetailView::Session => DetailView::Sql,
        }
    }
}

/// Which column pair the session view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    #[default]
    UserProgram,
    ModuleAction,
}

impl Grouping {
    pub fn toggle(self) -> Self {
        match self {
            Grouping::UserProgram => Grouping::ModuleAction,
            Grouping::ModuleAction => Grouping::UserProgram,
        }
    }
}

/// Sort key for the host process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Cpu,
    Mem,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Cpu => "cpu",
            SortKey::Mem => "mem",
        })
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(SortKey::Cpu),
            "mem" | "memory" => Ok(SortKey::Mem),
            other => Err(format!("unknown sort key '{}' (expected cpu or mem)", other)),
        }
    }
}

/// Keyboard input mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Interval prompt is open, holding what was typed so far.
    Interval(String),
}

/// Terminal-independent key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Esc,
    Backspace,
    CtrlC,
    Other,
}

/// Result of handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Nothing visible changed.
    None,
    /// Display state changed; redraw from the last sample.
    Redraw,
    Paused,
    Resumed,
    IntervalChanged(Duration),
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid interval '{input}': expected whole seconds >= {min}", min = MIN_INTERVAL.as_secs())]
pub struct InvalidInterval {
    pub input: String,
}

/// Parses an interval typed by the user, in whole seconds.
pub fn parse_interval(input: &str) -> Result<Duration, InvalidInterval> {
    let trimmed = input.trim();
    match trimmed.parse::<u64>() {
        Ok(secs) if Duration::from_secs(secs) >= MIN_INTERVAL => Ok(Duration::from_secs(secs)),
        _ => Err(InvalidInterval {
            input: trimmed.to_string(),
        }),
    }
}

/// User-toggleable display state.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeState {
    pub detailed: bool,
    pub wait_mode: WaitMode,
    pub view: DetailView,
    pub grouping: Grouping,
    /// 0 = all sections, 1..=4 selects one.
    pub section: u8,
    pub paused: bool,
    pub interval: Duration,
    pub sort: SortKey,
    pub top_n: usize,
    pub show_help: bool,
    pub input: InputMode,
    /// Message left by the last rejected interval input.
    pub input_error: Option<String>,
}

impl Default for ModeState {
    fn default() -> Self {
        Self {
            detailed: false,
            wait_mode: WaitMode::default(),
            view: DetailView::default(),
            grouping: Grouping::default(),
            section: 0,
            paused: false,
            interval: DEFAULT_INTERVAL,
            sort: SortKey::default(),
            top_n: DEFAULT_TOP_N,
            show_help: false,
            input: InputMode::Normal,
            input_error: None,
        }
    }
}

impl ModeState {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn with_section(mut self, section: u8) -> Self {
        self.section = section.min(MAX_SECTION);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.clamp(1, MAX_TOP_N);
        self
    }

    /// True if section `k` (1..=4) is shown under the current filter.
    pub fn shows_section(&self, k: u8) -> bool {
        self.section == 0 || self.section == k
    }

    pub fn handle_key(&mut self, key: Key) -> KeyAction {
        if key == Key::CtrlC {
            return KeyAction::Quit;
        }
        if matches!(self.input, InputMode::Interval(_)) {
            self.handle_interval_input(key)
        } else {
            self.handle_normal(key)
        }
    }

    fn handle_normal(&mut self, key: Key) -> KeyAction {
        let Key::Char(c) = key else {
            if key == Key::Esc && self.show_help {
                self.show_help = false;
                return KeyAction::Redraw;
            }
            return KeyAction::None;
        };

        match c {
            'q' | 'Q' => return KeyAction::Quit,
            'd' => self.detailed = !self.detailed,
            'w' => self.wait_mode = self.wait_mode.toggle(),
            's' => self.view = self.view.toggle(),
            'm' => self.grouping = self.grouping.toggle(),
            '1'..='4' => {
                let k = c as u8 - b'0';
                self.section = if self.section == k { 0 } else { k };
            }
            '0' | 'a' => self.section = 0,
            'p' | ' ' => {
                self.paused = !self.paused;
                return if self.paused {
                    KeyAction::Paused
                } else {
                    KeyAction::Resumed
                };
            }
            'i' => {
                self.input = InputMode::Interval(String::new());
                self.input_error = None;
            }
            'c' => self.sort = SortKey::Cpu,
            'M' => self.sort = SortKey::Mem,
            '+' | '=' => self.top_n = (self.top_n + 1).min(MAX_TOP_N),
            '-' => self.top_n = self.top_n.saturating_sub(1).max(1),
            'h' | '?' => self.show_help = !self.show_help,
            _ => return KeyAction::None,
        }
        KeyAction::Redraw
    }

    fn handle_interval_input(&mut self, key: Key) -> KeyAction {
        let InputMode::Interval(buffer) = &mut self.input else {
            return KeyAction::None;
        };
        match key {
            Key::Char(c) => {
                if buffer.len() < MAX_INTERVAL_INPUT {
                    buffer.push(c);
                }
                KeyAction::Redraw
            }
            Key::Backspace => {
                buffer.pop();
                KeyAction::Redraw
            }
            Key::Esc => {
                self.input = InputMode::Normal;
                KeyAction::Redraw
            }
            Key::Enter => {
                let typed = std::mem::take(buffer);
                self.input = InputMode::Normal;
                match parse_interval(&typed) {
                    Ok(interval) => {
                        self.interval = interval;
                        self.input_error = None;
                        KeyAction::IntervalChanged(interval)
                    }
                    Err(e) => {
                        self.input_error = Some(e.to_string());
                        KeyAction::Redraw
                    }
                }
            }
            Key::CtrlC => KeyAction::Quit,
            Key::Other => KeyAction::None,
        }
    }
}
