//! JSON-lines rendering: one object per frame.

use serde::Serialize;

use crate::view::{Table, TableSet};

#[derive(Debug, Serialize)]
pub struct FrameRecord<'a> {
    pub timestamp_ms: i64,
    pub status: &'a str,
    pub tables: &'a [Table],
}

impl<'a> FrameRecord<'a> {
    pub fn new(status: &'a str, set: &'a TableSet) -> Self {
        Self {
            timestamp_ms: set.timestamp_ms,
            status,
            tables: &set.tables,
        }
    }
}

/// Serializes a frame to a single line without the trailing newline.
pub fn render_frame(status: &str, set: &TableSet) -> serde_json::Result<String> {
    serde_json::to_string(&FrameRecord::new(status, set))
}
