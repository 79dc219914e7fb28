//! Parsers for `/proc` files.
//!
//! Pure functions over file contents, so they can be tested with string inputs.

use std::str::FromStr;

use tracing::debug;

use crate::model::CpuTimes;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

/// The fields of `/proc/[pid]/stat` the monitor uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    pub utime: u64,
    pub stime: u64,
    /// Resident set size in pages.
    pub rss_pages: u64,
}

/// Parses one numeric field, falling back to zero when it is missing or malformed.
fn number_or_zero<T: FromStr + Default>(raw: Option<&str>, field: &str) -> T {
    let Some(raw) = raw else {
        debug!(field, "missing numeric field, using 0");
        return T::default();
    };
    raw.parse().unwrap_or_else(|_| {
        debug!(field, value = raw, "unparsable numeric field, using 0");
        T::default()
    })
}

/// Parses `/proc/[pid]/stat` content.
///
/// The comm field may contain spaces and parentheses, so it is taken between the first `(`
/// and the last `)`.
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let content = content.trim();

    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;
    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let pid: u32 = content[..open_paren]
        .trim()
        .parse()
        .map_err(|_| ParseError::new("invalid pid"))?;
    let comm = content[open_paren + 1..close_paren].to_string();

    // Fields after comm: state is 0, utime 11, stime 12, rss 21.
    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();
    if fields.len() < 22 {
        return Err(ParseError::new(format!(
            "not enough fields in stat: expected 22+, got {}",
            fields.len()
        )));
    }

    let parse_u64 = |idx: usize, name: &str| -> Result<u64, ParseError> {
        fields[idx]
            .parse::<i64>()
            .map(|v| v.max(0) as u64)
            .map_err(|_| ParseError::new(format!("invalid {}", name)))
    };

    Ok(ProcStat {
        pid,
        comm,
        state: fields[0].chars().next().unwrap_or('?'),
        utime: parse_u64(11, "utime")?,
        stime: parse_u64(12, "stime")?,
        rss_pages: parse_u64(21, "rss")?,
    })
}

/// The parts of `/proc/stat` the monitor uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalStat {
    pub cpu: CpuTimes,
    /// Number of `cpuN` lines.
    pub cpu_count: u32,
    pub procs_running: u32,
    pub procs_blocked: u32,
}

/// Parses `/proc/stat` content.
pub fn parse_global_stat(content: &str) -> Result<GlobalStat, ParseError> {
    let mut stat = GlobalStat::default();
    let mut saw_aggregate = false;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let Some(key) = parts.next() else {
            continue;
        };

        if key == "cpu" {
            let counters: Vec<u64> = parts.map(|s| number_or_zero(Some(s), "cpu")).collect();
            stat.cpu = CpuTimes::from_counters(&counters);
            saw_aggregate = true;
        } else if key
            .strip_prefix("cpu")
            .is_some_and(|id| id.parse::<u32>().is_ok())
        {
            stat.cpu_count += 1;
        } else if key == "procs_running" {
            stat.procs_running = number_or_zero(parts.next(), "procs_running");
        } else if key == "procs_blocked" {
            stat.procs_blocked = number_or_zero(parts.next(), "procs_blocked");
        }
    }

    if !saw_aggregate {
        return Err(ParseError::new("missing aggregate cpu line"));
    }
    Ok(stat)
}

/// The parts of `/proc/meminfo` the monitor uses, in kB.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: u64,
}

/// Parses `/proc/meminfo` content.
///
/// Kernels older than 3.14 have no `MemAvailable`; free memory is used instead.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut available = None;

    let parse_kb =
        |line: &str| -> u64 { number_or_zero(line.split_whitespace().nth(1), "meminfo") };

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            info.mem_total = parse_kb(line);
        } else if line.starts_with("MemFree:") {
            info.mem_free = parse_kb(line);
        } else if line.starts_with("MemAvailable:") {
            available = Some(parse_kb(line));
        }
    }

    if info.mem_total == 0 {
        return Err(ParseError::new("missing MemTotal"));
    }
    info.mem_available = available.unwrap_or(info.mem_free);
    Ok(info)
}

/// Load averages from `/proc/loadavg`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

/// Parses `/proc/loadavg` content.
pub fn parse_loadavg(content: &str) -> Result<LoadAvg, ParseError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(ParseError::new("invalid loadavg format"));
    }

    let parse = |idx: usize, name: &str| -> Result<f64, ParseError> {
        parts[idx]
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {}", name)))
    };

    Ok(LoadAvg {
        load1: parse(0, "load1")?,
        load5: parse(1, "load5")?,
        load15: parse(2, "load15")?,
    })
}

/// Parses `/proc/uptime`, returning seconds since boot.
pub fn parse_uptime(content: &str) -> Result<f64, ParseError> {
    content
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::new("invalid uptime format"))
}
