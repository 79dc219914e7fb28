//! Shared formatting helpers for views.
//!
//! Pure string formatting, no styles or layout.

/// Placeholder for a value that cannot be computed yet.
pub const NOT_AVAILABLE: &str = "N/A";

/// Format KiB to human-readable size.
pub fn format_kb(kb: u64) -> String {
    if kb == 0 {
        return "0".to_string();
    }
    if kb >= 1024 * 1024 {
        format!("{:.1}G", kb as f64 / (1024.0 * 1024.0))
    } else if kb >= 1024 {
        format!("{:.1}M", kb as f64 / 1024.0)
    } else {
        format!("{}K", kb)
    }
}

/// Format duration in seconds: `"45s"`, `"3m5s"`, `"2h10m"`, `"4d3h"`.
pub fn format_duration(secs: i64) -> String {
    if secs < 0 {
        return "-".to_string();
    }
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d{}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Format a per-second rate, `"N/A"` when it is not known yet.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        None => NOT_AVAILABLE.to_string(),
        Some(r) if r < 0.01 => "0".to_string(),
        Some(r) if r >= 1_000_000.0 => format!("{:.1}M/s", r / 1_000_000.0),
        Some(r) if r >= 1_000.0 => format!("{:.1}K/s", r / 1_000.0),
        Some(r) if r >= 10.0 => format!("{:.0}/s", r),
        Some(r) => format!("{:.1}/s", r),
    }
}

/// Format a percentage with one decimal, `"N/A"` for `None`.
pub fn format_pct(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{:.1}", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Format milliseconds: `"0.5"`, `"120"`, `"3.2s"`, `"1.5m"`.
pub fn format_ms(ms: f64) -> String {
    if ms >= 60_000.0 {
        format!("{:.1}m", ms / 60_000.0)
    } else if ms >= 1_000.0 {
        format!("{:.1}s", ms / 1_000.0)
    } else if ms >= 10.0 {
        format!("{:.0}", ms)
    } else {
        format!("{:.1}", ms)
    }
}

/// Format a signed counter delta; `"N/A"` for `None`.
pub fn format_delta(v: Option<i64>) -> String {
    match v {
        Some(v) => v.to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Normalize query text for single-line display.
/// Replaces newlines, carriage returns, and tabs with spaces.
pub fn normalize_query(s: &str) -> String {
    s.replace(['\n', '\r', '\t'], " ")
}

/// Keeps the first `max_chars` characters. No ellipsis: the result is a grouping key.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Normalize, then cut to `max_chars`.
pub fn flatten_and_truncate(s: &str, max_chars: usize) -> String {
    truncate_chars(&normalize_query(s), max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_kb() {
        assert_eq!(format_kb(0), "0");
        assert_eq!(format_kb(512), "512K");
        assert_eq!(format_kb(2048), "2.0M");
        assert_eq!(format_kb(16_384_000), "15.6G");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(185), "3m5s");
        assert_eq!(format_duration(86400 + 3 * 3600), "1d3h");
        assert_eq!(format_duration(-1), "-");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(None), "N/A");
        assert_eq!(format_rate(Some(0.0)), "0");
        assert_eq!(format_rate(Some(2.5)), "2.5/s");
        assert_eq!(format_rate(Some(250.0)), "250/s");
        assert_eq!(format_rate(Some(2500.0)), "2.5K/s");
    }

    #[test]
    fn test_format_pct_and_ms() {
        assert_eq!(format_pct(Some(33.333)), "33.3");
        assert_eq!(format_pct(None), "N/A");
        assert_eq!(format_ms(0.4), "0.4");
        assert_eq!(format_ms(2500.0), "2.5s");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_flatten_and_truncate() {
        assert_eq!(flatten_and_truncate("select\n1\tfrom\r\nt", 100), "select 1 from  t");
        assert_eq!(flatten_and_truncate("select\n1", 6), "select");
    }
}
