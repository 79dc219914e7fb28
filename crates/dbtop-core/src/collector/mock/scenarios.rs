//! Pre-built `/proc` scenarios for host collector and engine tests.

use super::filesystem::MockFs;

/// Formats a minimal but complete `/proc/[pid]/stat` line.
///
/// `rss_pages` lands in field 24 (index 21 after the comm field), utime/stime in 14/15.
pub fn proc_stat_line(
    pid: u32,
    name: &str,
    state: char,
    utime: u64,
    stime: u64,
    rss_pages: u64,
) -> String {
    format!(
        "{pid} ({name}) {state} 1 {pid} {pid} 0 -1 4194304 100 0 0 0 {utime} {stime} 0 0 20 0 1 0 12345 102400000 {rss_pages} 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0"
    )
}

impl MockFs {
    /// A four-CPU host with 16 GB of memory and three processes.
    ///
    /// Processes: init (PID 1, sleeping), postgres (PID 1200, running),
    /// and a `kworker` in uninterruptible sleep (PID 88).
    pub fn typical_host() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/uptime", "12345.67 98765.43\n");
        fs.add_file("/proc/loadavg", "0.15 0.10 0.05 1/150 1234\n");
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
",
        );
        fs.set_cpu_counters(&[10000, 500, 3000, 80000, 1000, 200, 100, 0]);

        fs.add_process("/proc", 1, &proc_stat_line(1, "systemd", 'S', 300, 200, 3000));
        fs.add_process(
            "/proc",
            1200,
            &proc_stat_line(1200, "postgres", 'R', 5000, 1000, 250_000),
        );
        fs.add_process(
            "/proc",
            88,
            &proc_stat_line(88, "kworker/0:1 (events)", 'D', 10, 40, 0),
        );
        fs
    }

    /// Rewrites `/proc/stat` with the given aggregate counters on four CPUs.
    pub fn set_cpu_counters(&mut self, counters: &[u64]) {
        let aggregate = counters
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let per_cpu = |id: usize| {
            let values = counters
                .iter()
                .map(|c| (c / 4).to_string())
                .collect::<Vec<_>>()
                .join(" ");
            format!("cpu{id} {values}\n")
        };
        let content = format!(
            "cpu  {aggregate}\n{}{}{}{}intr 1000000 50 0\nctxt 500000\nbtime 1700000000\nprocesses 10000\nprocs_running 2\nprocs_blocked 1\n",
            per_cpu(0),
            per_cpu(1),
            per_cpu(2),
            per_cpu(3),
        );
        self.add_file("/proc/stat", content);
    }

    /// Rewrites a process's stat line with new CPU ticks, keeping it otherwise typical.
    pub fn set_process_ticks(&mut self, pid: u32, name: &str, utime: u64, stime: u64) {
        self.add_process(
            "/proc",
            pid,
            &proc_stat_line(pid, name, 'R', utime, stime, 1000),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::traits::FileSystem;
    use std::path::Path;

    #[test]
    fn typical_host_has_system_files() {
        let fs = MockFs::typical_host();
        for file in ["stat", "meminfo", "loadavg", "uptime", "1200/stat"] {
            assert!(fs.exists(&Path::new("/proc").join(file)), "{file}");
        }
    }

    #[test]
    fn proc_stat_line_has_all_fields() {
        let line = proc_stat_line(5, "a b", 'S', 1, 2, 3);
        let after_comm = &line[line.rfind(')').unwrap() + 1..];
        assert!(after_comm.split_whitespace().count() >= 42);
    }
}
