//! Batch output sinks.
//!
//! A [`FrameWriter`] turns each [`TableSet`] into text or JSON lines and flushes once per
//! frame. The underlying sink is stdout or a file.

pub mod json;
pub mod text;

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::view::TableSet;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot open output file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" | "jsonl" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}' (expected text or json)", other)),
        }
    }
}

/// Opens the sink: the file at `path`, created or truncated, else stdout.
pub fn open_sink(path: Option<&Path>) -> Result<Box<dyn Write + Send>, OutputError> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|source| OutputError::Open {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

/// Writes frames in the configured format.
pub struct FrameWriter<W: Write> {
    out: W,
    format: OutputFormat,
    width: Option<usize>,
    clear_screen: bool,
    frames: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            width: None,
            clear_screen: false,
            frames: 0,
        }
    }

    pub fn with_width(mut self, width: Option<usize>) -> Self {
        self.width = width.filter(|w| *w > 0);
        self
    }

    /// Emit an ANSI clear-screen before each text frame.
    pub fn with_clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn write_frame(&mut self, status: &str, set: &TableSet) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                if self.clear_screen {
                    self.out.write_all(text::CLEAR_SCREEN.as_bytes())?;
                } else if self.frames > 0 {
                    writeln!(self.out)?;
                }
                for line in text::render_frame(status, set, self.width) {
                    writeln!(self.out, "{}", line)?;
                }
            }
            OutputFormat::Json => {
                let line = json::render_frame(status, set)?;
                writeln!(self.out, "{}", line)?;
            }
        }
        self.out.flush()?;
        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{RowStyleClass, Section, Table};
    use std::io::Read;

    fn set() -> TableSet {
        let mut t = Table::new(Section::Summary, "Host", &["UPTIME"]);
        t.push(vec!["1h0m".into()], RowStyleClass::Normal);
        TableSet {
            timestamp_ms: 7,
            tables: vec![t],
        }
    }

    #[test]
    fn text_frames_without_clear_are_separated() {
        let mut writer = FrameWriter::new(Vec::new(), OutputFormat::Text);
        writer.write_frame("a", &set()).unwrap();
        writer.write_frame("b", &set()).unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert!(out.starts_with("dbtop  a\n"));
        assert!(out.contains("1h0m\n\ndbtop  b\n"));
        assert!(!out.contains('\x1b'));
    }

    #[test]
    fn text_frames_with_clear() {
        let mut writer = FrameWriter::new(Vec::new(), OutputFormat::Text).with_clear_screen(true);
        writer.write_frame("a", &set()).unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert!(out.starts_with(text::CLEAR_SCREEN));
    }

    #[test]
    fn json_frames_one_per_line() {
        let mut writer = FrameWriter::new(Vec::new(), OutputFormat::Json);
        writer.write_frame("a", &set()).unwrap();
        writer.write_frame("b", &set()).unwrap();
        assert_eq!(writer.frames(), 2);
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn file_sink_receives_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.txt");
        {
            let sink = open_sink(Some(&path)).unwrap();
            let mut writer = FrameWriter::new(sink, OutputFormat::Text).with_width(Some(8));
            writer.write_frame("a long status line", &set()).unwrap();
        }
        let mut content = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content.lines().next(), Some("dbtop  a"));
        assert!(content.contains("1h0m"));
    }

    #[test]
    fn unwritable_path_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        assert!(matches!(
            open_sink(Some(&path)),
            Err(OutputError::Open { .. })
        ));
    }

    #[test]
    fn format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
