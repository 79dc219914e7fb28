//! Host collector: system-wide files plus one `/proc/[pid]/stat` per process.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::parser::{
    ParseError, parse_global_stat, parse_loadavg, parse_meminfo, parse_proc_stat, parse_uptime,
};
use crate::collector::traits::FileSystem;
use crate::model::{
    DataBlock, HostCpuInfo, HostLoadInfo, HostMemInfo, HostProcessInfo, HostStatInfo,
};

/// Page size assumed for `rss` conversion unless overridden.
pub const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Error type for host collection failures.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Process disappeared or became unreadable during collection.
    #[error("process {0} disappeared")]
    ProcessGone(u32),
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Collects host metrics from a proc root.
pub struct HostCollector<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
}

impl<F: FileSystem> HostCollector<F> {
    pub fn new(fs: F, proc_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    /// Mutable access to the filesystem, used by tests to advance mock counters.
    pub fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    /// Collects all host blocks.
    ///
    /// `/proc/stat` and `/proc/meminfo` are required. Load average and uptime fall back to
    /// zeros, and unreadable processes are skipped.
    pub fn collect(&self) -> Result<Vec<DataBlock>, CollectError> {
        let stat_path = self.proc_path.join("stat");
        let stat = parse_global_stat(&self.read(&stat_path)?).map_err(|source| {
            CollectError::Parse {
                path: stat_path.clone(),
                source,
            }
        })?;

        let mem_path = self.proc_path.join("meminfo");
        let mem = parse_meminfo(&self.read(&mem_path)?).map_err(|source| CollectError::Parse {
            path: mem_path.clone(),
            source,
        })?;

        let load = self
            .optional("loadavg", parse_loadavg)
            .unwrap_or_default();
        let uptime_secs = self.optional("uptime", parse_uptime).unwrap_or(0.0);

        Ok(vec![
            DataBlock::HostCpu(HostCpuInfo {
                times: stat.cpu,
                cpu_count: stat.cpu_count.max(1),
            }),
            DataBlock::HostMem(HostMemInfo {
                total_kb: mem.mem_total,
                free_kb: mem.mem_free,
                available_kb: mem.mem_available,
            }),
            DataBlock::HostLoad(HostLoadInfo {
                load1: load.load1,
                load5: load.load5,
                load15: load.load15,
            }),
            DataBlock::HostStat(HostStatInfo {
                uptime_secs,
                procs_running: stat.procs_running,
                procs_blocked: stat.procs_blocked,
            }),
            DataBlock::HostProcesses(self.collect_processes()),
        ])
    }

    /// Collects every readable `/proc/[pid]/stat`, sorted by pid.
    pub fn collect_processes(&self) -> Vec<HostProcessInfo> {
        let entries = match self.fs.read_dir(&self.proc_path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.proc_path.display(), error = %e, "cannot list processes");
                return Vec::new();
            }
        };

        let mut processes: Vec<HostProcessInfo> = entries
            .iter()
            .filter_map(|entry| entry.file_name()?.to_str()?.parse::<u32>().ok())
            .filter_map(|pid| match self.collect_process(pid) {
                Ok(p) => Some(p),
                Err(CollectError::ProcessGone(_)) => None,
                Err(e) => {
                    debug!(pid, error = %e, "skipping process");
                    None
                }
            })
            .collect();
        processes.sort_by_key(|p| p.pid);
        processes
    }

    pub fn collect_process(&self, pid: u32) -> Result<HostProcessInfo, CollectError> {
        let path = self.proc_path.join(pid.to_string()).join("stat");
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|_| CollectError::ProcessGone(pid))?;
        let stat = parse_proc_stat(&content).map_err(|source| CollectError::Parse {
            path: path.clone(),
            source,
        })?;

        Ok(HostProcessInfo {
            pid: stat.pid,
            name: stat.comm,
            state: stat.state,
            cpu_ticks: stat.utime.saturating_add(stat.stime),
            rss_kb: stat.rss_pages.saturating_mul(DEFAULT_PAGE_SIZE) / 1024,
        })
    }

    fn read(&self, path: &Path) -> Result<String, CollectError> {
        self.fs
            .read_to_string(path)
            .map_err(|source| CollectError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    fn optional<T>(&self, file: &str, parse: fn(&str) -> Result<T, ParseError>) -> Option<T> {
        let path = self.proc_path.join(file);
        match self.fs.read_to_string(&path).map(|c| parse(&c)) {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                debug!(path = %path.display(), error = %e, "unparsable, using defaults");
                None
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "unreadable, using defaults");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    #[test]
    fn collects_typical_host() {
        let collector = HostCollector::new(MockFs::typical_host(), "/proc");
        let blocks = collector.collect().unwrap();
        assert_eq!(blocks.len(), 5);

        let cpu = blocks
            .iter()
            .find_map(|b| match b {
                DataBlock::HostCpu(c) => Some(c),
                _ => None,
            })
            .unwrap();
        assert_eq!(cpu.cpu_count, 4);
        assert_eq!(cpu.times.user, 10000);

        let stat = blocks
            .iter()
            .find_map(|b| match b {
                DataBlock::HostStat(s) => Some(s),
                _ => None,
            })
            .unwrap();
        assert_eq!(stat.procs_blocked, 1);
        assert!((stat.uptime_secs - 12345.67).abs() < 1e-6);
    }

    #[test]
    fn processes_sorted_with_rss_in_kb() {
        let collector = HostCollector::new(MockFs::typical_host(), "/proc");
        let procs = collector.collect_processes();
        let pids: Vec<u32> = procs.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![1, 88, 1200]);

        let pg = &procs[2];
        assert_eq!(pg.name, "postgres");
        assert_eq!(pg.cpu_ticks, 6000);
        assert_eq!(pg.rss_kb, 1_000_000);
        assert_eq!(procs[1].name, "kworker/0:1 (events)");
    }

    #[test]
    fn unreadable_processes_are_skipped() {
        let mut fs = MockFs::typical_host();
        fs.deny("/proc/1200/stat");
        fs.add_process("/proc", 77, "77 (broken");
        let collector = HostCollector::new(fs, "/proc");

        let pids: Vec<u32> = collector.collect_processes().iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![1, 88]);
    }

    #[test]
    fn missing_stat_is_an_error() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/meminfo", "MemTotal: 1000 kB\n");
        let err = HostCollector::new(fs, "/proc").collect().unwrap_err();
        assert!(matches!(err, CollectError::Io { .. }));
    }

    #[test]
    fn optional_files_default_to_zero() {
        let mut fs = MockFs::new();
        fs.set_cpu_counters(&[1, 2, 3, 4]);
        fs.add_file("/proc/meminfo", "MemTotal: 1000 kB\nMemAvailable: 500 kB\n");
        let blocks = HostCollector::new(fs, "/proc").collect().unwrap();
        assert!(blocks.contains(&DataBlock::HostLoad(HostLoadInfo::default())));
    }
}
